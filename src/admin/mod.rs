// Operator surface: token-gated HTTP routes over the same room registry
// the game runs on.

// Public API
pub use config::AdminConfig;
pub use handlers::admin_router;

// Internal modules
mod config;
mod handlers;
