//! Boundary classification of raw push messages.
//!
//! The authority emits two shapes on the same channels: full replacement
//! snapshots (no `kind` field) and tagged `{kind, payload}` deltas. That dual
//! shape is a protocol fact, not an accident, and is preserved here: anything
//! without a recognizable `kind` is probed as a snapshot, everything else must
//! carry a well-typed payload or is dropped with a diagnostic. Nothing in this
//! module panics into the reducer.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::events::{DealtCards, HandView, InboundUpdate, SeatRef, TableEvent};
use super::types::{Card, Seat, TableState};

const LOG_TARGET: &str = "table::normalizer";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("message is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("untagged message does not parse as a table snapshot: {0}")]
    BadSnapshot(#[source] serde_json::Error),
    #[error("event kind is not a string")]
    BadKindField,
    #[error("event `{kind}` is missing its payload")]
    MissingPayload { kind: String },
    #[error("event `{kind}` has a malformed payload: {source}")]
    BadPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Classify one raw inbound message. Errors are for the caller to log and
/// drop; they never reach the reducer.
pub fn classify(raw: &str) -> Result<InboundUpdate, ClassifyError> {
    let value: Value = serde_json::from_str(raw).map_err(ClassifyError::MalformedJson)?;
    classify_value(value)
}

/// Classify an already-parsed message.
pub fn classify_value(value: Value) -> Result<InboundUpdate, ClassifyError> {
    let Value::Object(ref map) = value else {
        return Err(ClassifyError::NotAnObject);
    };

    // No `kind` field: the authority is replacing the table wholesale.
    let Some(kind_value) = map.get("kind") else {
        let snapshot: TableState =
            serde_json::from_value(value).map_err(ClassifyError::BadSnapshot)?;
        return Ok(InboundUpdate::Snapshot(snapshot));
    };

    let Some(kind) = kind_value.as_str() else {
        return Err(ClassifyError::BadKindField);
    };
    let kind = kind.to_owned();
    let payload = map
        .get("payload")
        .cloned()
        .ok_or_else(|| ClassifyError::MissingPayload { kind: kind.clone() })?;

    let event = match kind.as_str() {
        "GAME_STARTED" => TableEvent::GameStarted(hand_view(&kind, payload)?),
        "ROUND_STARTED" => TableEvent::RoundStarted(hand_view(&kind, payload)?),
        "PLAYER_JOINED" => {
            let seat: Seat = typed(&kind, payload)?;
            TableEvent::PlayerJoined(seat)
        }
        "PLAYER_LEFT" => {
            let seat: SeatRef = typed(&kind, payload)?;
            TableEvent::PlayerLeft(seat)
        }
        "PLAYER_BET" => TableEvent::PlayerBet(hand_view(&kind, payload)?),
        "PLAYER_CHECKED" => TableEvent::PlayerChecked(hand_view(&kind, payload)?),
        "PLAYER_FOLDED" => TableEvent::PlayerFolded(hand_view(&kind, payload)?),
        "PLAYER_TURN" => TableEvent::PlayerTurn(hand_view(&kind, payload)?),
        "CARDS_DEALT" => TableEvent::CardsDealt(dealt_cards(&kind, payload)?),
        "COMMUNITY_CARDS_REVEALED" => {
            // Array-typed payload required; anything else becomes a reducer
            // no-op that keeps the prior board rather than blanking it.
            match serde_json::from_value::<Vec<Card>>(payload) {
                Ok(cards) => TableEvent::CommunityCardsRevealed(Some(cards)),
                Err(err) => {
                    warn!(
                        target = LOG_TARGET,
                        kind,
                        error = %err,
                        "non-array community card payload, preserving prior board"
                    );
                    TableEvent::CommunityCardsRevealed(None)
                }
            }
        }
        "GAME_ENDED" => TableEvent::GameEnded(hand_view(&kind, payload)?),
        _ => TableEvent::Unknown { kind },
    };
    Ok(InboundUpdate::Event(event))
}

fn typed<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> Result<T, ClassifyError> {
    serde_json::from_value(payload).map_err(|source| ClassifyError::BadPayload {
        kind: kind.to_owned(),
        source,
    })
}

fn hand_view(kind: &str, payload: Value) -> Result<HandView, ClassifyError> {
    typed(kind, payload)
}

fn dealt_cards(kind: &str, payload: Value) -> Result<DealtCards, ClassifyError> {
    // The private channel has historically sent both `{"cards": [...]}` and a
    // bare array; accept either.
    if payload.is_array() {
        let cards: Vec<Card> = typed(kind, payload)?;
        return Ok(DealtCards { cards });
    }
    typed(kind, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::types::TableStatus;

    #[test]
    fn untagged_object_classifies_as_snapshot() {
        // `ACTIVE` is the older wire spelling of `IN_HAND`.
        for status in ["IN_HAND", "ACTIVE"] {
            let raw = format!(r#"{{"table_id":"t1","current_bet":20,"status":"{status}"}}"#);
            match classify(&raw).unwrap() {
                InboundUpdate::Snapshot(state) => {
                    assert_eq!(state.current_bet, 20);
                    assert_eq!(state.status, TableStatus::InHand);
                }
                other => panic!("expected snapshot, got {other:?}"),
            }
        }
    }

    #[test]
    fn untagged_object_that_is_not_a_snapshot_is_invalid() {
        let raw = r#"{"table_id":"t1","status":"NO_SUCH_PHASE"}"#;
        assert!(matches!(classify(raw), Err(ClassifyError::BadSnapshot(_))));
    }

    #[test]
    fn tagged_message_classifies_by_kind() {
        let raw = r#"{"kind":"PLAYER_LEFT","payload":{"player_id":"p2"}}"#;
        let update = classify(raw).unwrap();
        assert!(matches!(
            update,
            InboundUpdate::Event(TableEvent::PlayerLeft(SeatRef { ref player_id }))
                if player_id.as_str() == "p2"
        ));
    }

    #[test]
    fn unknown_kind_is_passed_through_not_dropped() {
        let raw = r#"{"kind":"SERVER_GOSSIP","payload":{"whatever":1}}"#;
        match classify(raw).unwrap() {
            InboundUpdate::Event(TableEvent::Unknown { kind }) => {
                assert_eq!(kind, "SERVER_GOSSIP");
            }
            other => panic!("expected unknown event, got {other:?}"),
        }
    }

    #[test]
    fn garbage_and_missing_payload_are_invalid() {
        assert!(matches!(
            classify("not json at all"),
            Err(ClassifyError::MalformedJson(_))
        ));
        assert!(matches!(classify("42"), Err(ClassifyError::NotAnObject)));
        assert!(matches!(
            classify(r#"{"kind":"PLAYER_BET"}"#),
            Err(ClassifyError::MissingPayload { .. })
        ));
        assert!(matches!(
            classify(r#"{"kind":7,"payload":{}}"#),
            Err(ClassifyError::BadKindField)
        ));
        assert!(matches!(
            classify(r#"{"kind":"PLAYER_JOINED","payload":"nope"}"#),
            Err(ClassifyError::BadPayload { .. })
        ));
    }

    #[test]
    fn community_cards_with_bad_shape_become_a_noop_event() {
        let raw = r#"{"kind":"COMMUNITY_CARDS_REVEALED","payload":{"oops":true}}"#;
        match classify(raw).unwrap() {
            InboundUpdate::Event(TableEvent::CommunityCardsRevealed(None)) => {}
            other => panic!("expected preserved-board no-op, got {other:?}"),
        }
    }

    #[test]
    fn dealt_cards_accept_bare_array_and_wrapped_object() {
        let wrapped = r#"{"kind":"CARDS_DEALT","payload":{"cards":["AS","KD"]}}"#;
        let bare = r#"{"kind":"CARDS_DEALT","payload":["AS","KD"]}"#;
        for raw in [wrapped, bare] {
            match classify(raw).unwrap() {
                InboundUpdate::Event(TableEvent::CardsDealt(dealt)) => {
                    assert_eq!(dealt.cards.len(), 2);
                }
                other => panic!("expected cards dealt, got {other:?}"),
            }
        }
    }
}
