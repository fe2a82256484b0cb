//! What the viewer may legally do right now, derived from the latest
//! snapshot alone.
//!
//! This is a pure function of `(state, viewer)` and is recomputed on every
//! state change, never cached across turns: stack and current bet can both
//! move between renders of the same nominal turn (a reconnection snapshot,
//! for example).

use serde::{Deserialize, Serialize};

use super::rules::TurnRules;
use crate::table::types::{Chips, PlayerId, TableState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalAction {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub is_viewer_turn: bool,
    pub legal_actions: Vec<LegalAction>,
    pub call_amount: Chips,
    pub can_check: bool,
    pub min_raise: Chips,
    pub max_raise: Chips,
    /// Calling would exhaust the stack (the call itself is an all-in).
    pub is_call_all_in: bool,
    /// The table's bet already exceeds the stack: only all-in or fold remain.
    pub is_forced_all_in: bool,
}

impl Affordances {
    pub fn may(&self, action: LegalAction) -> bool {
        self.legal_actions.contains(&action)
    }
}

/// Resolve the viewer's turn affordances against the given snapshot.
pub fn resolve(state: &TableState, viewer: &PlayerId) -> Affordances {
    let mut out = Affordances::default();
    out.is_viewer_turn = state.is_viewer_turn(viewer);
    if !out.is_viewer_turn {
        return out;
    }
    // is_viewer_turn guarantees the seat exists.
    let Some(seat) = state.viewer_seat(viewer) else {
        return Affordances::default();
    };
    let stack = seat.stack;

    out.call_amount = state.price_to_call(viewer);
    out.can_check = out.call_amount == 0;
    out.is_call_all_in = out.call_amount >= stack;
    out.is_forced_all_in = state.current_bet > stack;

    out.legal_actions.push(LegalAction::Fold);
    if out.is_forced_all_in {
        // Raising is not legal when the bet cannot even be matched.
        out.legal_actions.push(LegalAction::AllIn);
        return out;
    }
    if out.can_check {
        out.legal_actions.push(LegalAction::Check);
    } else {
        out.legal_actions.push(LegalAction::Call);
    }
    out.min_raise = (out.call_amount + 1).max(1);
    out.max_raise = stack;
    if out.min_raise <= out.max_raise {
        out.legal_actions.push(LegalAction::Raise);
        out.legal_actions.push(LegalAction::AllIn);
    }
    out
}
