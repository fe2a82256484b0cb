use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use table_sync::table::types::{PlayerId, TableId, TableStatus};
use table_sync::{ClientConfig, TableClient};

const LOG_TARGET: &str = "bin::table_client_demo";
const DEFAULT_HTTP: &str = "http://127.0.0.1:8080";
const DEFAULT_WS: &str = "ws://127.0.0.1:8080/ws";

#[derive(Debug, Parser)]
#[command(name = "table_client_demo")]
#[command(about = "Join a table and stream its synchronized state", long_about = None)]
struct Args {
    /// Base URL of the lobby HTTP API
    #[arg(long, env = "TABLE_HTTP_BASE", default_value = DEFAULT_HTTP)]
    http_base: String,

    /// WebSocket endpoint of the push channels
    #[arg(long, env = "TABLE_WS_URL", default_value = DEFAULT_WS)]
    ws_url: String,

    /// Table to join
    #[arg(long, env = "TABLE_ID")]
    table: String,

    /// Player identity to join as
    #[arg(long, env = "TABLE_PLAYER_ID")]
    player: String,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "TABLE_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json);

    let config = ClientConfig::new(&args.http_base, &args.ws_url);
    let table = TableId::new(&args.table);
    let player = PlayerId::new(&args.player);

    let client = TableClient::join(config, table.clone(), player.clone())
        .await
        .with_context(|| format!("failed to join table {table}"))?;
    info!(target = LOG_TARGET, %table, %player, "joined table");

    let states = WatchStream::new(client.subscribe());
    let statuses = WatchStream::new(client.status_updates());
    tokio::select! {
        _ = stream_states(&client, states) => {}
        _ = watch_connection(statuses) => {}
        _ = shutdown_signal() => {}
    }

    client.shutdown().await;
    Ok(())
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}

async fn stream_states(
    client: &TableClient,
    mut states: WatchStream<Option<table_sync::table::types::TableState>>,
) {
    while let Some(state) = states.next().await {
        let Some(state) = state else { continue };
        info!(
            target = LOG_TARGET,
            status = ?state.status,
            seats = state.seats.len(),
            board = state.community_cards.len(),
            pot = state.total_pot(),
            "table updated"
        );
        if state.status == TableStatus::InHand {
            if let Some(affordances) = client.affordances() {
                if affordances.is_viewer_turn {
                    info!(
                        target = LOG_TARGET,
                        actions = ?affordances.legal_actions,
                        call = affordances.call_amount,
                        min_raise = affordances.min_raise,
                        max_raise = affordances.max_raise,
                        fraction = client.remaining_fraction(),
                        "your turn"
                    );
                }
            }
        }
    }
}

async fn watch_connection(mut statuses: WatchStream<table_sync::client::ConnectionStatus>) {
    use table_sync::client::ConnectionStatus;
    while let Some(status) = statuses.next().await {
        match status {
            ConnectionStatus::Connecting => {
                info!(target = LOG_TARGET, "connecting")
            }
            ConnectionStatus::Connected => info!(target = LOG_TARGET, "connected"),
            ConnectionStatus::Lost => {
                warn!(target = LOG_TARGET, "connection lost, giving up");
                return;
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = LOG_TARGET, error = %err, "failed to install ctrl-c handler");
    }
    info!(target = LOG_TARGET, "shutdown signal received");
}
