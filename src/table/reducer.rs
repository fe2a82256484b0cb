//! Pure state transitions over [`TableState`].
//!
//! One transition per event kind. Every transition returns a new value; the
//! previous snapshot is never mutated, which is what makes the replay and
//! idempotence properties checkable: for every kind,
//! `apply(apply(s, e), e) == apply(s, e)`.

use tracing::debug;

use super::events::{HandView, InboundUpdate, TableEvent};
use super::types::{PlayerId, Seat, TableState, TableStatus};

const LOG_TARGET: &str = "table::reducer";

/// Applies classified updates for a fixed viewer. The viewer identity is
/// needed for exactly one transition: merging privately dealt cards into the
/// viewer's own seat.
#[derive(Clone, Debug)]
pub struct Reducer {
    viewer: PlayerId,
}

impl Reducer {
    pub fn new(viewer: PlayerId) -> Self {
        Self { viewer }
    }

    pub fn viewer(&self) -> &PlayerId {
        &self.viewer
    }

    /// `(previous, update) -> next`. Returns `None` only while no snapshot
    /// has been seen and the event cannot seed a state on its own.
    pub fn apply(&self, prev: Option<&TableState>, update: &InboundUpdate) -> Option<TableState> {
        let next = match update {
            InboundUpdate::Snapshot(snapshot) => Some(sanitize(snapshot.clone())),
            InboundUpdate::Event(event) => self.apply_event(prev, event),
        };
        if let Some(state) = &next {
            debug!(
                target = LOG_TARGET,
                kind = update_kind(update),
                seats = state.seats.len(),
                status = ?state.status,
                "applied update"
            );
        }
        next
    }

    fn apply_event(&self, prev: Option<&TableState>, event: &TableEvent) -> Option<TableState> {
        match event {
            // A started hand/round replaces every hand-scoped field from the
            // payload, including the payload's own seat list, and clears any
            // terminal result from the previous hand.
            TableEvent::GameStarted(view) | TableEvent::RoundStarted(view) => {
                let mut next = base_state(prev);
                // Seat identities come from the payload's own seat list.
                next.seats = view.seats.clone();
                replace_hand_fields(&mut next, view);
                next.winners.clear();
                Some(sanitize(next))
            }
            TableEvent::PlayerJoined(seat) => {
                let mut next = prev?.clone();
                // Joins only ever append; existing seats are never replaced.
                if next.seat(&seat.player_id).is_none() {
                    next.seats.push(seat.clone());
                }
                Some(sanitize(next))
            }
            TableEvent::PlayerLeft(seat_ref) => {
                let mut next = prev?.clone();
                next.seats.retain(|s| s.player_id != seat_ref.player_id);
                Some(sanitize(next))
            }
            // Post-action views are complete replacements of the hand-scoped
            // fields; no betting math is replicated client-side here.
            TableEvent::PlayerBet(view)
            | TableEvent::PlayerChecked(view)
            | TableEvent::PlayerFolded(view)
            | TableEvent::PlayerTurn(view) => {
                let mut next = prev?.clone();
                replace_hand_fields(&mut next, view);
                self.restore_viewer_cards(prev, &mut next);
                Some(sanitize(next))
            }
            TableEvent::CardsDealt(dealt) => {
                let mut next = prev?.clone();
                if let Some(seat) = seat_mut(&mut next, &self.viewer) {
                    seat.hole_cards = dealt.cards.clone();
                }
                Some(next)
            }
            TableEvent::CommunityCardsRevealed(Some(cards)) => {
                let mut next = prev?.clone();
                next.community_cards = cards.clone();
                Some(next)
            }
            // Malformed board payload: keep the prior cards.
            TableEvent::CommunityCardsRevealed(None) => prev.cloned(),
            TableEvent::GameEnded(view) => {
                let mut next = prev?.clone();
                replace_hand_fields(&mut next, view);
                next.winners = view.winners.clone();
                next.status = TableStatus::Ended;
                Some(sanitize(next))
            }
            TableEvent::Unknown { kind } => {
                debug!(target = LOG_TARGET, kind, "unknown event kind, re-asserting defaults");
                prev.map(|state| sanitize(state.clone()))
            }
        }
    }

    /// Hand views from the table-wide channel never carry the viewer's
    /// private cards; carry them over from the previous state.
    fn restore_viewer_cards(&self, prev: Option<&TableState>, next: &mut TableState) {
        let Some(prev_cards) = prev
            .and_then(|p| p.seat(&self.viewer))
            .map(|s| s.hole_cards.clone())
        else {
            return;
        };
        if let Some(seat) = seat_mut(next, &self.viewer) {
            if seat.hole_cards.is_empty() {
                seat.hole_cards = prev_cards;
            }
        }
    }
}

fn update_kind(update: &InboundUpdate) -> &str {
    match update {
        InboundUpdate::Snapshot(_) => "SNAPSHOT",
        InboundUpdate::Event(event) => event.kind(),
    }
}

/// Hand-start events may arrive before any snapshot; they carry enough to
/// seed a state of their own. The table id stays unresolved until the next
/// full snapshot asserts it.
fn base_state(prev: Option<&TableState>) -> TableState {
    match prev {
        Some(state) => state.clone(),
        None => TableState {
            table_id: super::types::TableId::new(""),
            seats: Vec::new(),
            community_cards: Vec::new(),
            pots: Vec::new(),
            current_bet: 0,
            current_seat: None,
            status: TableStatus::Waiting,
            betting_round: Default::default(),
            action_deadline: None,
            winners: Vec::new(),
        },
    }
}

/// Replace the hand-scoped fields from a post-transition view. Seat lists are
/// handled by the caller: hand starts take the payload's list verbatim, while
/// action views keep the previous seats if the payload omitted them.
fn replace_hand_fields(state: &mut TableState, view: &HandView) {
    if !view.seats.is_empty() {
        state.seats = view.seats.clone();
    }
    state.community_cards = view.community_cards.clone();
    state.pots = view.pots.clone();
    state.current_bet = view.current_bet;
    state.current_seat = view.current_seat;
    state.status = view.status;
    state.betting_round = view.betting_round.clone();
    state.action_deadline = view.action_deadline;
}

fn seat_mut<'a>(state: &'a mut TableState, player: &PlayerId) -> Option<&'a mut Seat> {
    state.seats.iter_mut().find(|s| &s.player_id == player)
}

/// Re-assert the defaulted-field invariants so a degenerate payload cannot
/// leave the state silently corrupted: exactly one current seat while in
/// hand, none otherwise, and no dangling seat index.
pub fn sanitize(mut state: TableState) -> TableState {
    match state.status {
        TableStatus::InHand => {
            if let Some(index) = state.current_seat {
                if index >= state.seats.len() {
                    state.current_seat = None;
                }
            }
        }
        TableStatus::Waiting | TableStatus::Ended => {
            state.current_seat = None;
            state.action_deadline = None;
        }
    }
    if state.status != TableStatus::Ended {
        state.winners.clear();
    }
    state
}
