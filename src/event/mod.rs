// Room broadcast infrastructure.
//
// Gameplay services publish server messages here; websocket forwarders
// subscribe per room and relay to their clients.

// Public API
pub use bus::EventBus;

// Internal modules
mod bus;
