//! The persistent push session to the authority.
//!
//! One background task owns the socket for its whole life: it connects,
//! subscribes the table-wide and viewer-private channels, forwards every
//! inbound frame verbatim to the client, and reconnects with exponential
//! backoff when the connection drops. On every reconnect it re-subscribes
//! and relies on the authority to push a fresh snapshot; viewer actions are
//! never replayed across a reconnect.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::error::TransportError;
use super::messages::{ActionRequest, ChannelTopic, ClientCommand};
use crate::config::ClientConfig;
use crate::table::types::{PlayerId, TableId};

const LOG_TARGET: &str = "net::session";

/// What the session surfaces to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Socket is up and both channels are subscribed. Emitted again after
    /// every successful reconnect.
    Connected,
    /// One raw inbound frame, untouched; classification happens downstream.
    Message(String),
    /// Reconnection attempts are exhausted; the session task has exited.
    ConnectionLost,
}

/// Seam for the socket so the session loop is testable without a server.
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;
    /// `None` means the peer closed the stream.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
}

#[async_trait]
pub trait Connect: Send + Sync + 'static {
    type Conn: Connection;
    async fn connect(&self) -> Result<Self::Conn, TransportError>;
}

/// Production connector over tokio-tungstenite.
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let url = Url::parse(endpoint).map_err(|source| TransportError::BadEndpoint {
            endpoint: endpoint.to_owned(),
            source,
        })?;
        Ok(Self { url })
    }
}

pub struct WsConnection {
    inner: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Pings are answered by the library on the next flush.
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

#[async_trait]
impl Connect for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        Ok(WsConnection { inner: stream })
    }
}

pub struct SessionHandle {
    commands: mpsc::Sender<ClientCommand>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Hand the inbound event stream to its single consumer. Panics if taken
    /// twice; there is exactly one pump per session.
    pub fn take_events(&mut self) -> mpsc::Receiver<SessionEvent> {
        self.events
            .take()
            .expect("session event stream already taken")
    }

    /// Fire-and-forget publish of a viewer action. Dropped (with a warning)
    /// if the session is saturated or gone; the authority's next push is the
    /// only source of truth either way.
    pub fn send(&self, action: ActionRequest) {
        let frame = ClientCommand::Action { action };
        if let Err(err) = self.commands.try_send(frame) {
            warn!(target = LOG_TARGET, error = %err, "dropping outbound action");
        }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

pub struct Session;

impl Session {
    /// Connect over WebSocket and start the session loop.
    pub fn connect(
        config: &ClientConfig,
        table_id: TableId,
        player_id: PlayerId,
    ) -> Result<SessionHandle, TransportError> {
        let connector = WsConnector::new(&config.ws_url)?;
        Ok(Self::with_connector(config, connector, table_id, player_id))
    }

    /// Start the session loop over an arbitrary connector (tests inject
    /// scripted ones here).
    pub fn with_connector<C: Connect>(
        config: &ClientConfig,
        connector: C,
        table_id: TableId,
        player_id: PlayerId,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(config.event_buffer);
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let loop_config = RunConfig {
            backoff_initial: config.backoff_initial,
            backoff_max: config.backoff_max,
            max_reconnect_attempts: config.max_reconnect_attempts,
        };
        let task = tokio::spawn(run_session(
            connector,
            loop_config,
            table_id,
            player_id,
            command_rx,
            event_tx,
            loop_cancel,
        ));
        SessionHandle {
            commands: command_tx,
            events: Some(event_rx),
            cancel,
            task,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RunConfig {
    backoff_initial: Duration,
    backoff_max: Duration,
    max_reconnect_attempts: u32,
}

enum ConnectionOutcome {
    /// Socket dropped or errored; try again.
    Retry,
    /// Cancelled or command side closed; stop quietly.
    Stop,
}

async fn run_session<C: Connect>(
    connector: C,
    config: RunConfig,
    table_id: TableId,
    player_id: PlayerId,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut attempts: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return;
        }
        match connector.connect().await {
            Ok(mut conn) => {
                match subscribe(&mut conn, &table_id, &player_id).await {
                    Ok(()) => {
                        attempts = 0;
                        info!(target = LOG_TARGET, table = %table_id, "session connected");
                        if events.send(SessionEvent::Connected).await.is_err() {
                            return;
                        }
                        match pump(&mut conn, &mut commands, &events, &cancel).await {
                            ConnectionOutcome::Stop => return,
                            ConnectionOutcome::Retry => {}
                        }
                    }
                    Err(err) => {
                        warn!(target = LOG_TARGET, error = %err, "subscription handshake failed");
                    }
                }
            }
            Err(err) => {
                warn!(target = LOG_TARGET, error = %err, "connect failed");
            }
        }

        attempts += 1;
        if attempts > config.max_reconnect_attempts {
            let err = TransportError::RetriesExhausted { attempts };
            warn!(target = LOG_TARGET, error = %err, "giving up on the session");
            let _ = events.send(SessionEvent::ConnectionLost).await;
            return;
        }
        let delay = backoff_delay(config, attempts);
        debug!(target = LOG_TARGET, attempts, ?delay, "backing off before reconnect");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Exponential backoff: `initial * 2^(attempt-1)`, capped.
fn backoff_delay(config: RunConfig, attempt: u32) -> Duration {
    let factor = 1u32 << (attempt - 1).min(16);
    config
        .backoff_initial
        .saturating_mul(factor)
        .min(config.backoff_max)
}

async fn subscribe<Conn: Connection>(
    conn: &mut Conn,
    table_id: &TableId,
    player_id: &PlayerId,
) -> Result<(), TransportError> {
    let channels = [
        ChannelTopic::Table(table_id.clone()),
        ChannelTopic::Private(table_id.clone(), player_id.clone()),
    ];
    for channel in channels {
        let frame = ClientCommand::Subscribe { channel };
        let encoded = serde_json::to_string(&frame)
            .map_err(|err| TransportError::Handshake(err.to_string()))?;
        conn.send(encoded).await?;
    }
    Ok(())
}

async fn pump<Conn: Connection>(
    conn: &mut Conn,
    commands: &mut mpsc::Receiver<ClientCommand>,
    events: &mpsc::Sender<SessionEvent>,
    cancel: &CancellationToken,
) -> ConnectionOutcome {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return ConnectionOutcome::Stop,
            command = commands.recv() => {
                let Some(command) = command else {
                    return ConnectionOutcome::Stop;
                };
                let encoded = match serde_json::to_string(&command) {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        warn!(target = LOG_TARGET, error = %err, "unencodable outbound frame");
                        continue;
                    }
                };
                if let Err(err) = conn.send(encoded).await {
                    warn!(target = LOG_TARGET, error = %err, "send failed, reconnecting");
                    return ConnectionOutcome::Retry;
                }
            }
            inbound = conn.recv() => {
                match inbound {
                    Some(Ok(text)) => {
                        if events.send(SessionEvent::Message(text)).await.is_err() {
                            return ConnectionOutcome::Stop;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(target = LOG_TARGET, error = %err, "socket error, reconnecting");
                        return ConnectionOutcome::Retry;
                    }
                    None => {
                        info!(target = LOG_TARGET, "socket closed by peer, reconnecting");
                        return ConnectionOutcome::Retry;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// One scripted connection: frames to emit, then either close or hold
    /// the stream open until the test shuts the session down.
    struct ScriptedConnection {
        inbound: VecDeque<String>,
        close_when_done: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn send(&mut self, frame: String) -> Result<(), TransportError> {
            self.sent.lock().push(frame);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            match self.inbound.pop_front() {
                Some(frame) => Some(Ok(frame)),
                None if self.close_when_done => None,
                None => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    /// Connector producing a fixed number of scripted connections, then
    /// failing every further attempt.
    struct ScriptedConnector {
        scripts: Mutex<VecDeque<(VecDeque<String>, bool)>>,
        sent: Arc<Mutex<Vec<String>>>,
        connects: AtomicU32,
    }

    impl ScriptedConnector {
        /// Every connection stays open after its script.
        fn new(scripts: Vec<Vec<&str>>) -> Self {
            Self::with_scripts(scripts.into_iter().map(|s| (s, false)).collect())
        }

        /// Per-connection scripts; `true` closes the stream once the script
        /// is exhausted.
        fn with_scripts(scripts: Vec<(Vec<&str>, bool)>) -> Self {
            Self {
                scripts: Mutex::new(
                    scripts
                        .into_iter()
                        .map(|(s, close)| (s.into_iter().map(str::to_owned).collect(), close))
                        .collect(),
                ),
                sent: Arc::new(Mutex::new(Vec::new())),
                connects: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Connect for Arc<ScriptedConnector> {
        type Conn = ScriptedConnection;

        async fn connect(&self) -> Result<ScriptedConnection, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            match self.scripts.lock().pop_front() {
                Some((inbound, close_when_done)) => Ok(ScriptedConnection {
                    inbound,
                    close_when_done,
                    sent: self.sent.clone(),
                }),
                None => Err(TransportError::Closed),
            }
        }
    }

    fn test_config() -> ClientConfig {
        ClientConfig::new("http://localhost", "ws://localhost")
            .with_backoff(Duration::from_millis(1), Duration::from_millis(4))
            .with_max_reconnect_attempts(2)
    }

    #[tokio::test]
    async fn subscribes_both_channels_then_forwards_frames() {
        let connector = Arc::new(ScriptedConnector::new(vec![vec![r#"{"x":1}"#]]));
        let mut handle = Session::with_connector(
            &test_config(),
            connector.clone(),
            TableId::new("t1"),
            PlayerId::new("hero"),
        );
        let mut events = handle.take_events();

        assert_eq!(events.recv().await, Some(SessionEvent::Connected));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Message(r#"{"x":1}"#.into()))
        );

        let sent = connector.sent.lock().clone();
        assert!(sent[0].contains("table/t1"));
        assert!(sent[1].contains("table/t1/player/hero"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn actions_are_written_to_the_socket() {
        let connector = Arc::new(ScriptedConnector::new(vec![vec![]]));
        let mut handle = Session::with_connector(
            &test_config(),
            connector.clone(),
            TableId::new("t1"),
            PlayerId::new("hero"),
        );
        let mut events = handle.take_events();
        assert_eq!(events.recv().await, Some(SessionEvent::Connected));

        handle.send(ActionRequest::bet(25));
        // Give the pump a moment to drain the command channel.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sent = connector.sent.lock().clone();
        let action_frame = sent.last().unwrap();
        assert!(action_frame.contains("\"bet\""));
        assert!(action_frame.contains("25"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn reconnect_resubscribes_both_channels() {
        // First connection delivers one frame and closes; the second stays
        // open. The session must redo the full subscribe handshake.
        let connector = Arc::new(ScriptedConnector::with_scripts(vec![
            (vec![r#"{"x":1}"#], true),
            (vec![], false),
        ]));
        let mut handle = Session::with_connector(
            &test_config(),
            connector.clone(),
            TableId::new("t1"),
            PlayerId::new("hero"),
        );
        let mut events = handle.take_events();

        assert_eq!(events.recv().await, Some(SessionEvent::Connected));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Message(r#"{"x":1}"#.into()))
        );
        assert_eq!(events.recv().await, Some(SessionEvent::Connected));

        let sent = connector.sent.lock().clone();
        assert_eq!(sent.len(), 4, "two subscribe frames per connection");
        assert!(sent[2].contains("table/t1"));
        assert!(sent[3].contains("table/t1/player/hero"));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn exhausted_reconnects_surface_connection_lost() {
        // No scripts at all: every connect fails, backoff runs out.
        let connector = Arc::new(ScriptedConnector::new(vec![]));
        let mut handle = Session::with_connector(
            &test_config(),
            connector.clone(),
            TableId::new("t1"),
            PlayerId::new("hero"),
        );
        let mut events = handle.take_events();
        assert_eq!(events.recv().await, Some(SessionEvent::ConnectionLost));
        // initial try + 2 retries
        assert_eq!(connector.connects.load(Ordering::SeqCst), 3);
    }
}
