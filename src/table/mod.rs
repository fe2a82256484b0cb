//! Data model and reconciliation for the shared table: wire event types, the
//! message normalizer, and the pure reducer that owns [`types::TableState`].

pub mod events;
pub mod normalizer;
pub mod reducer;
pub mod types;

pub use events::*;
pub use normalizer::{classify, classify_value, ClassifyError};
pub use reducer::{sanitize, Reducer};
pub use types::*;
