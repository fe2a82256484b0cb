use crate::table::types::{Chips, PlayerId, Seat, SeatIndex, TableState, TableStatus};

/// Viewer-relative turn queries over an immutable snapshot.
pub trait TurnRules {
    fn viewer_seat(&self, viewer: &PlayerId) -> Option<&Seat>;
    fn viewer_seat_index(&self, viewer: &PlayerId) -> Option<SeatIndex>;
    fn is_viewer_turn(&self, viewer: &PlayerId) -> bool;
    fn price_to_call(&self, viewer: &PlayerId) -> Chips;
}

impl TurnRules for TableState {
    fn viewer_seat(&self, viewer: &PlayerId) -> Option<&Seat> {
        self.seat(viewer)
    }

    fn viewer_seat_index(&self, viewer: &PlayerId) -> Option<SeatIndex> {
        self.seat_index(viewer)
    }

    fn is_viewer_turn(&self, viewer: &PlayerId) -> bool {
        if self.status != TableStatus::InHand {
            return false;
        }
        let Some(acting) = self.acting_seat() else {
            return false;
        };
        &acting.player_id == viewer && acting.can_act()
    }

    fn price_to_call(&self, viewer: &PlayerId) -> Chips {
        let committed = self.betting_round.committed(viewer);
        self.current_bet.saturating_sub(committed)
    }
}
