//! Client-side table synchronization for a server-authoritative poker room.
//!
//! The server is the single source of truth; this crate keeps one viewer's
//! picture of a table consistent with it. Inbound pushes are classified
//! ([`table::normalizer`]), folded through a pure reducer ([`table::reducer`]),
//! and published to subscribers; the presentation-facing views (turn
//! affordances, egocentric seating, action deadlines) are derived from the
//! reduced snapshot in [`view`]. [`client::TableClient`] wires the pieces to a
//! live session.

pub mod client;
pub mod config;
pub mod net;
pub mod table;
pub mod view;

#[cfg(test)]
pub mod test_utils;

pub use client::{ConnectionStatus, TableClient};
pub use config::ClientConfig;
