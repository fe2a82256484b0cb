//! Connection plumbing to the remote authority: the persistent push session
//! (WebSocket) and the request/response lobby API (HTTP).

pub mod api;
pub mod error;
pub mod messages;
pub mod session;

pub use api::LobbyApi;
pub use error::TransportError;
pub use messages::{ActionKind, ActionRequest, ChannelTopic, ClientCommand};
pub use session::{Connect, Connection, Session, SessionEvent, SessionHandle, WsConnector};
