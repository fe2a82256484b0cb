use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Chips = u64;
pub type SeatIndex = usize;

/// Stable player identity as issued by the authority (username-keyed).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display code for a card, e.g. `"9H"` or `"KD"`. Opaque to the engine:
/// ranking happens on the authority and arrives pre-evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(pub String);

impl Card {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindRole {
    Small,
    Big,
}

/// Table phase. Older authority revisions emit `ACTIVE`/`COMPLETED`; both
/// spellings are accepted on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Waiting,
    #[serde(alias = "ACTIVE")]
    InHand,
    #[serde(alias = "COMPLETED")]
    Ended,
}

/// A table position holding a player. Stacks mutate only by applying events
/// from the authority, never locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub player_id: PlayerId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub stack: Chips,
    #[serde(default)]
    pub folded: bool,
    #[serde(default)]
    pub sitting_out: bool,
    /// Chips committed across the whole hand.
    #[serde(default)]
    pub committed: Chips,
    #[serde(default)]
    pub blind: Option<BlindRole>,
    /// Populated only for the viewer's own seat, via the private channel.
    #[serde(default)]
    pub hole_cards: Vec<Card>,
    #[serde(default)]
    pub last_action: Option<String>,
}

impl Seat {
    /// Whether this seat may be the acting seat at all.
    pub fn can_act(&self) -> bool {
        !self.folded && !self.sitting_out
    }
}

/// Amount plus the seats eligible to win it. The first pot in
/// [`TableState::pots`] is the main pot; sides follow in all-in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: Chips,
    #[serde(default)]
    pub eligible: Vec<PlayerId>,
}

/// Per-seat chips committed in the current betting round. Cleared by the
/// authority at the start of each round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BettingRoundView(pub BTreeMap<PlayerId, Chips>);

impl BettingRoundView {
    pub fn committed(&self, player: &PlayerId) -> Chips {
        self.0.get(player).copied().unwrap_or(0)
    }
}

/// Terminal hand result for one winning seat. `best_hand` is the authority's
/// opaque showdown evaluation; this engine never ranks hands itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub player_id: PlayerId,
    #[serde(default)]
    pub amount: Chips,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub best_hand: Option<serde_json::Value>,
}

/// The root snapshot of the shared table as last asserted by the authority.
///
/// Owned exclusively by the reducer; every other component reads an immutable
/// view. All collection fields default so a degenerate snapshot deserializes
/// instead of failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub table_id: TableId,
    #[serde(default)]
    pub seats: Vec<Seat>,
    #[serde(default)]
    pub community_cards: Vec<Card>,
    #[serde(default)]
    pub pots: Vec<Pot>,
    #[serde(default)]
    pub current_bet: Chips,
    #[serde(default)]
    pub current_seat: Option<SeatIndex>,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub betting_round: BettingRoundView,
    #[serde(default)]
    pub action_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub winners: Vec<Winner>,
}

impl TableState {
    pub fn seat(&self, player: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.player_id == player)
    }

    pub fn seat_index(&self, player: &PlayerId) -> Option<SeatIndex> {
        self.seats.iter().position(|s| &s.player_id == player)
    }

    /// The seat currently required to act, if the hand is live.
    pub fn acting_seat(&self) -> Option<&Seat> {
        if self.status != TableStatus::InHand {
            return None;
        }
        self.current_seat.and_then(|i| self.seats.get(i))
    }

    pub fn total_pot(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }
}
