use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bad endpoint `{endpoint}`: {source}")]
    BadEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("subscription handshake failed: {0}")]
    Handshake(String),
    #[error("connection closed by the authority")]
    Closed,
    #[error("gave up reconnecting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("lobby request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lobby response was not a table snapshot: {0}")]
    BadLobbyResponse(#[source] serde_json::Error),
}
