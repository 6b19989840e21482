// Public API
pub use connection::{ConnectionTracker, InMemoryConnectionTracker};
pub use handler::websocket_handler;
pub use messages::{ClientMessage, ServerMessage};
pub use rate_limit::ActionLimiter;

// Internal modules
pub mod connection;
pub mod handler;
pub mod messages;
pub mod rate_limit;
