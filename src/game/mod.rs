// Public API
pub use resolve::{ResolutionInput, ResolutionOutcome};
pub use service::GameService;
pub use sweep::{spawn_sweep_task, SweepConfig, Sweeper};

// Internal modules
pub mod acks;
pub mod deck;
pub mod drinks;
pub mod interaction;
pub mod resolve;
pub mod service;
pub mod sweep;
pub mod timer;
pub mod turn;
