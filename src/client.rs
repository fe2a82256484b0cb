//! The engine facade the presentation layer talks to.
//!
//! One pump task drives Session → Normalizer → Reducer and publishes each
//! reduced snapshot; the reducer therefore never runs concurrently with
//! itself and the table state needs no locking beyond the published cell.
//! A second task samples the action deadline on a fixed tick, but only while
//! the viewer owns a timed turn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::net::session::{Connect, Session, SessionEvent, SessionHandle};
use crate::net::{ActionRequest, LobbyApi, TransportError};
use crate::table::normalizer;
use crate::table::reducer::Reducer;
use crate::table::types::{PlayerId, SeatIndex, TableId, TableState};
use crate::view::affordances::{resolve, Affordances};
use crate::view::deadline::DeadlineTracker;
use crate::view::rules::TurnRules;
use crate::view::seating::display_position_for;

const LOG_TARGET: &str = "client";

/// Connection condition as seen by the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    /// The session gave up reconnecting; only a new client can recover.
    Lost,
}

pub struct TableClient {
    table_id: TableId,
    viewer: PlayerId,
    session: SessionHandle,
    state: Arc<RwLock<Option<TableState>>>,
    state_rx: watch::Receiver<Option<TableState>>,
    status_rx: watch::Receiver<ConnectionStatus>,
    fraction_rx: watch::Receiver<f64>,
    cancel: CancellationToken,
}

impl TableClient {
    /// Join the table through the lobby API, then open the push session
    /// seeded with the join snapshot.
    pub async fn join(
        config: ClientConfig,
        table_id: TableId,
        viewer: PlayerId,
    ) -> Result<Self, TransportError> {
        let lobby = LobbyApi::new(&config.http_base);
        let snapshot = lobby.join_table(&table_id, &viewer).await?;
        Self::connect_with_initial(config, table_id, viewer, Some(snapshot))
    }

    /// Open the push session without a lobby round-trip; the first pushed
    /// snapshot populates the state.
    pub fn connect(
        config: ClientConfig,
        table_id: TableId,
        viewer: PlayerId,
    ) -> Result<Self, TransportError> {
        Self::connect_with_initial(config, table_id, viewer, None)
    }

    fn connect_with_initial(
        config: ClientConfig,
        table_id: TableId,
        viewer: PlayerId,
        initial: Option<TableState>,
    ) -> Result<Self, TransportError> {
        let session = Session::connect(&config, table_id.clone(), viewer.clone())?;
        Ok(Self::assemble(config, table_id, viewer, initial, session))
    }

    /// Test seam: run the client over an injected connector.
    pub fn with_connector<C: Connect>(
        config: ClientConfig,
        connector: C,
        table_id: TableId,
        viewer: PlayerId,
    ) -> Self {
        let session = Session::with_connector(&config, connector, table_id.clone(), viewer.clone());
        Self::assemble(config, table_id, viewer, None, session)
    }

    fn assemble(
        config: ClientConfig,
        table_id: TableId,
        viewer: PlayerId,
        initial: Option<TableState>,
        mut session: SessionHandle,
    ) -> Self {
        let initial = initial.map(crate::table::reducer::sanitize);
        let state = Arc::new(RwLock::new(initial.clone()));
        let (state_tx, state_rx) = watch::channel(initial);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (fraction_tx, fraction_rx) = watch::channel(1.0_f64);
        let cancel = session.cancellation_token();

        let events = session.take_events();
        let reducer = Reducer::new(viewer.clone());
        tokio::spawn(pump(
            events,
            reducer,
            state.clone(),
            state_tx,
            status_tx,
            cancel.clone(),
        ));
        tokio::spawn(deadline_loop(
            config.deadline_tick,
            viewer.clone(),
            state_rx.clone(),
            fraction_tx,
            cancel.clone(),
        ));

        Self {
            table_id,
            viewer,
            session,
            state,
            state_rx,
            status_rx,
            fraction_rx,
            cancel,
        }
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn viewer(&self) -> &PlayerId {
        &self.viewer
    }

    /// The latest reduced snapshot, if any has been seen.
    pub fn current_state(&self) -> Option<TableState> {
        self.state.read().clone()
    }

    /// Notified after every successful reduction.
    pub fn subscribe(&self) -> watch::Receiver<Option<TableState>> {
        self.state_rx.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn status_updates(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Forward a viewer action to the authority. No optimistic local
    /// mutation: state advances only when the resulting event comes back.
    pub fn dispatch_action(&self, action: ActionRequest) {
        self.session.send(action);
    }

    /// Turn affordances derived from the latest snapshot.
    pub fn affordances(&self) -> Option<Affordances> {
        let state = self.state.read();
        state.as_ref().map(|s| resolve(s, &self.viewer))
    }

    /// Egocentric display slot of an absolute seat index.
    pub fn display_position(&self, absolute_index: SeatIndex) -> Option<SeatIndex> {
        let state = self.state.read();
        state
            .as_ref()
            .and_then(|s| display_position_for(s, &self.viewer, absolute_index))
    }

    /// Remaining fraction of the viewer's timed turn, 1.0 when untimed.
    pub fn remaining_fraction(&self) -> f64 {
        *self.fraction_rx.borrow()
    }

    pub fn deadline_updates(&self) -> watch::Receiver<f64> {
        self.fraction_rx.clone()
    }

    /// Cancel the pump and tick tasks and close the socket.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.session.shutdown().await;
        info!(target = LOG_TARGET, table = %self.table_id, "client shut down");
    }
}

async fn pump(
    mut events: tokio::sync::mpsc::Receiver<SessionEvent>,
    reducer: Reducer,
    state: Arc<RwLock<Option<TableState>>>,
    state_tx: watch::Sender<Option<TableState>>,
    status_tx: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = events.recv() => event,
        };
        match event {
            Some(SessionEvent::Connected) => {
                let _ = status_tx.send(ConnectionStatus::Connected);
            }
            Some(SessionEvent::Message(raw)) => {
                let update = match normalizer::classify(&raw) {
                    Ok(update) => update,
                    Err(err) => {
                        // Malformed input never reaches the reducer; the
                        // authority re-asserts correct state on its next push.
                        warn!(target = LOG_TARGET, error = %err, "dropping inbound message");
                        continue;
                    }
                };
                let next = {
                    let guard = state.read();
                    reducer.apply(guard.as_ref(), &update)
                };
                if let Some(next) = next {
                    *state.write() = Some(next.clone());
                    let _ = state_tx.send(Some(next));
                } else {
                    debug!(target = LOG_TARGET, "update ignored before first snapshot");
                }
            }
            Some(SessionEvent::ConnectionLost) => {
                let _ = status_tx.send(ConnectionStatus::Lost);
                return;
            }
            None => return,
        }
    }
}

/// Samples the deadline tracker while the viewer owns a timed turn. Arming
/// and disarming follow the published state, so the countdown can never
/// outlive the turn it belongs to.
async fn deadline_loop(
    tick: std::time::Duration,
    viewer: PlayerId,
    mut state_rx: watch::Receiver<Option<TableState>>,
    fraction_tx: watch::Sender<f64>,
    cancel: CancellationToken,
) {
    let mut tracker = DeadlineTracker::new();
    let mut armed_for: Option<DateTime<Utc>> = None;
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let wanted = deadline_for_viewer(&state_rx.borrow(), &viewer);
                if wanted != armed_for {
                    match wanted {
                        Some(deadline) => {
                            tracker.arm(deadline, Utc::now());
                            let _ = fraction_tx.send(tracker.remaining_fraction(Utc::now()));
                        }
                        None => {
                            tracker.disarm();
                            let _ = fraction_tx.send(1.0);
                        }
                    }
                    armed_for = wanted;
                }
            }
            _ = interval.tick(), if tracker.is_armed() => {
                let _ = fraction_tx.send(tracker.remaining_fraction(Utc::now()));
            }
        }
    }
}

/// The deadline the tick loop should be counting against, if any: the state
/// must be in hand, the viewer must be the acting seat, and the authority
/// must have attached a deadline.
fn deadline_for_viewer(
    state: &Option<TableState>,
    viewer: &PlayerId,
) -> Option<DateTime<Utc>> {
    let state = state.as_ref()?;
    if !state.is_viewer_turn(viewer) {
        return None;
    }
    state.action_deadline
}
