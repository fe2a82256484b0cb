//! Egocentric seat geometry: the viewer is always rendered in display slot 0
//! and the rest of the table rotates around them.

use crate::table::types::{PlayerId, SeatIndex, TableState};

/// The presentation layer renders at most this many seats.
pub const MAX_DISPLAY_SEATS: usize = 6;

/// Map an absolute seat index to a display slot in `[0, MAX_DISPLAY_SEATS)`.
///
/// The seat count is recomputed from the live seat sequence on every call;
/// memoizing it against a stale count breaks as soon as a seat is removed.
pub fn display_position(
    state: &TableState,
    viewer_index: SeatIndex,
    absolute_index: SeatIndex,
) -> SeatIndex {
    let seat_count = state.seats.len().max(1);
    let viewer_index = viewer_index % seat_count;
    ((absolute_index + seat_count - viewer_index) % seat_count) % MAX_DISPLAY_SEATS
}

/// Convenience wrapper resolving the viewer's own index first. `None` when
/// the viewer is not seated.
pub fn display_position_for(
    state: &TableState,
    viewer: &PlayerId,
    absolute_index: SeatIndex,
) -> Option<SeatIndex> {
    let viewer_index = state.seat_index(viewer)?;
    Some(display_position(state, viewer_index, absolute_index))
}
