//! Request/response lobby calls. Each call returns a full table snapshot,
//! which callers feed through the same reducer as pushed snapshots.

use tracing::info;

use super::error::TransportError;
use crate::table::types::{PlayerId, TableId, TableState};

const LOG_TARGET: &str = "net::api";

pub struct LobbyApi {
    http: reqwest::Client,
    base: String,
}

impl LobbyApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_owned(),
        }
    }

    pub async fn join_table(
        &self,
        table: &TableId,
        player: &PlayerId,
    ) -> Result<TableState, TransportError> {
        info!(target = LOG_TARGET, %table, %player, "joining table");
        self.post_for_snapshot(&format!("{}/game/{}/join", self.base, table), player)
            .await
    }

    pub async fn leave_table(
        &self,
        table: &TableId,
        player: &PlayerId,
    ) -> Result<TableState, TransportError> {
        info!(target = LOG_TARGET, %table, %player, "leaving table");
        self.post_for_snapshot(&format!("{}/game/{}/leave", self.base, table), player)
            .await
    }

    pub async fn start_hand(
        &self,
        table: &TableId,
        player: &PlayerId,
    ) -> Result<TableState, TransportError> {
        info!(target = LOG_TARGET, %table, %player, "starting hand");
        self.post_for_snapshot(&format!("{}/game/{}/start", self.base, table), player)
            .await
    }

    async fn post_for_snapshot(
        &self,
        url: &str,
        player: &PlayerId,
    ) -> Result<TableState, TransportError> {
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "player_id": player }))
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        serde_json::from_value(body).map_err(TransportError::BadLobbyResponse)
    }
}
