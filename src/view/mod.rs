//! Derived, read-only views over the latest snapshot: turn affordances, seat
//! geometry, and the action deadline tracker. Nothing here mutates table
//! state.

pub mod affordances;
pub mod deadline;
pub mod rules;
pub mod seating;

pub use affordances::{resolve, Affordances, LegalAction};
pub use deadline::DeadlineTracker;
pub use rules::TurnRules;
pub use seating::{display_position, display_position_for, MAX_DISPLAY_SEATS};
