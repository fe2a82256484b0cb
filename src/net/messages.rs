//! Outbound wire frames. Inbound frames are raw JSON handed verbatim to the
//! normalizer; only what the client sends is typed here.

use serde::{Deserialize, Serialize};

use crate::table::types::{Chips, PlayerId, TableId};

/// The two logical subscriptions a session holds: one table-wide, one
/// restricted to the viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelTopic {
    Table(TableId),
    Private(TableId, PlayerId),
}

impl ChannelTopic {
    pub fn as_topic_string(&self) -> String {
        match self {
            ChannelTopic::Table(table) => format!("table/{table}"),
            ChannelTopic::Private(table, player) => format!("table/{table}/player/{player}"),
        }
    }
}

impl Serialize for ChannelTopic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_topic_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Bet,
    Check,
    Fold,
    AllIn,
}

/// A viewer-initiated action, published fire-and-forget. Local state only
/// advances when the authority pushes the resulting event back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Chips>,
}

impl ActionRequest {
    pub fn bet(amount: Chips) -> Self {
        Self {
            kind: ActionKind::Bet,
            amount: Some(amount),
        }
    }

    pub fn check() -> Self {
        Self {
            kind: ActionKind::Check,
            amount: None,
        }
    }

    pub fn fold() -> Self {
        Self {
            kind: ActionKind::Fold,
            amount: None,
        }
    }

    pub fn all_in() -> Self {
        Self {
            kind: ActionKind::AllIn,
            amount: None,
        }
    }
}

/// Frames the session writes to the socket.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    Subscribe { channel: ChannelTopic },
    Action { action: ActionRequest },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_render_as_paths() {
        let table = TableId::new("t9");
        assert_eq!(
            ChannelTopic::Table(table.clone()).as_topic_string(),
            "table/t9"
        );
        assert_eq!(
            ChannelTopic::Private(table, PlayerId::new("hero")).as_topic_string(),
            "table/t9/player/hero"
        );
    }

    #[test]
    fn subscribe_frame_shape() {
        let frame = ClientCommand::Subscribe {
            channel: ChannelTopic::Table(TableId::new("t1")),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["command"], "subscribe");
        assert_eq!(json["channel"], "table/t1");
    }

    #[test]
    fn action_frame_omits_missing_amount() {
        let frame = ClientCommand::Action {
            action: ActionRequest::fold(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["action"]["kind"], "fold");
        assert!(json["action"].get("amount").is_none());
    }
}
