/// Operator authentication settings.
///
/// With no token configured the whole admin surface plays dead: every
/// route answers 404, indistinguishable from a server without one.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    token: Option<String>,
}

impl AdminConfig {
    /// Reads `ADMIN_TOKEN`; an empty value counts as unset.
    pub fn from_env() -> Self {
        Self {
            token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn disabled() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Compares a presented bearer token in constant time.
    pub fn authorizes(&self, candidate: &str) -> bool {
        match &self.token {
            Some(expected) => constant_time_eq(candidate.as_bytes(), expected.as_bytes()),
            None => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
