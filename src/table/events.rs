use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    BettingRoundView, Card, Chips, PlayerId, Pot, Seat, SeatIndex, TableState, TableStatus, Winner,
};

/// The hand-scoped subset of the table that action-class events replace
/// wholesale. The authority sends the complete post-transition view, not a
/// diff, so applying the same event twice is a fixed point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandView {
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

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DealtCards {
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRef {
    pub player_id: PlayerId,
}

/// One tagged delta event as pushed by the authority. Kind names match the
/// wire protocol's SCREAMING_SNAKE update types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableEvent {
    GameStarted(HandView),
    RoundStarted(HandView),
    PlayerJoined(Seat),
    PlayerLeft(SeatRef),
    PlayerBet(HandView),
    PlayerChecked(HandView),
    PlayerFolded(HandView),
    PlayerTurn(HandView),
    /// Viewer-private channel only; merged into the viewer's own seat.
    CardsDealt(DealtCards),
    /// `None` when the payload was not array-shaped: reduced as a no-op that
    /// preserves the prior board instead of blanking it.
    CommunityCardsRevealed(Option<Vec<Card>>),
    GameEnded(HandView),
    /// Recognized envelope, unrecognized kind. Reduced by re-asserting
    /// defaulted fields on the previous state.
    #[serde(skip)]
    Unknown { kind: String },
}

impl TableEvent {
    pub fn kind(&self) -> &str {
        match self {
            TableEvent::GameStarted(_) => "GAME_STARTED",
            TableEvent::RoundStarted(_) => "ROUND_STARTED",
            TableEvent::PlayerJoined(_) => "PLAYER_JOINED",
            TableEvent::PlayerLeft(_) => "PLAYER_LEFT",
            TableEvent::PlayerBet(_) => "PLAYER_BET",
            TableEvent::PlayerChecked(_) => "PLAYER_CHECKED",
            TableEvent::PlayerFolded(_) => "PLAYER_FOLDED",
            TableEvent::PlayerTurn(_) => "PLAYER_TURN",
            TableEvent::CardsDealt(_) => "CARDS_DEALT",
            TableEvent::CommunityCardsRevealed(_) => "COMMUNITY_CARDS_REVEALED",
            TableEvent::GameEnded(_) => "GAME_ENDED",
            TableEvent::Unknown { kind } => kind,
        }
    }
}

/// The closed union the reducer consumes: either a wholesale replacement
/// snapshot (no `kind` on the wire) or one tagged transition.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundUpdate {
    Snapshot(TableState),
    Event(TableEvent),
}
