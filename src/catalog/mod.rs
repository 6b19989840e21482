// Public API
pub use models::{
    Card, CardKind, NewCard, ResolutionKind, SpecialEffect, MAX_COUNT, MAX_RULE_TEXT_LEN,
    MIN_COUNT,
};
pub use store::CardCatalog;

// Internal modules
pub mod builtin;
pub mod models;
mod store;
