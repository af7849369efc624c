//! Fanmail demo client.
//!
//! Runs two devices against an in-process key directory and message board:
//! the local device (`--alias`, keys persisted under `--data-dir`) and an
//! in-memory peer (`--peer`). The peer greets the local device, the local
//! device sends each `--message`, and the resolved conversation is logged.
//!
//! # Usage
//!
//! ```bash
//! fanmail --alias alice --peer bob --message "hi bob" --message "lunch?"
//!
//! # Rotate keys hourly and drop retired keys after a day
//! fanmail --alias alice --max-age-secs 3600 --retention-secs 86400
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use fanmail_client::{DeliveryStatus, RedbKeyStore, Session, SessionConfig, SystemEnv};
use fanmail_core::{KeyStore, MemoryKeyStore};
use fanmail_proto::{Alias, RegisterKeyRequest};
use fanmail_server::{KeyDirectory, LocalDirectory, LocalTransport, MessageBoard};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fanmail demo client
#[derive(Parser, Debug)]
#[command(name = "fanmail")]
#[command(about = "End-to-end encrypted messaging demo with per-device keys")]
#[command(version)]
struct Args {
    /// Alias of the local device
    #[arg(long, default_value = "alice")]
    alias: String,

    /// Alias of the peer to talk to
    #[arg(long, default_value = "bob")]
    peer: String,

    /// Directory holding the local key store
    #[arg(long, default_value = "fanmail-data")]
    data_dir: PathBuf,

    /// Maximum key age in seconds before rotation
    #[arg(long, default_value = "604800")]
    max_age_secs: u64,

    /// Prune retired keys older than this many seconds (keeps all if unset)
    #[arg(long)]
    retention_secs: Option<u64>,

    /// Also encrypt outgoing messages to the alias's other devices
    #[arg(long)]
    include_own_devices: bool,

    /// Message to send to the peer (repeatable)
    #[arg(long = "message", default_value = "hello")]
    messages: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let config = SessionConfig::with_max_age(Duration::from_secs(self.max_age_secs))
            .include_own_devices(self.include_own_devices);
        match self.retention_secs {
            Some(secs) => config.retain_for(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let alias = Alias::new(&args.alias)?;
    let peer = Alias::new(&args.peer)?;
    let config = args.session_config();

    std::fs::create_dir_all(&args.data_dir)?;
    let store_path = args.data_dir.join(format!("{alias}.redb"));
    let store = RedbKeyStore::open(&store_path)?;
    tracing::info!(path = %store_path.display(), "opened key store");

    let directory = KeyDirectory::new();
    let board = MessageBoard::new();

    // The in-process directory starts empty on every run
    announce_held_key(&directory, &alias, &store)?;

    let local = Session::start(
        SystemEnv::new(),
        store,
        LocalDirectory::new(directory.clone(), alias.clone()),
        LocalTransport::new(board.clone(), alias.clone()),
        alias.clone(),
        config,
    )
    .await?;

    let remote = Session::start(
        SystemEnv::new(),
        MemoryKeyStore::new(),
        LocalDirectory::new(directory.clone(), peer.clone()),
        LocalTransport::new(board.clone(), peer.clone()),
        peer.clone(),
        SessionConfig::default(),
    )
    .await?;

    remote.send(&alias, &format!("hi {alias}, {peer} here")).await;

    for text in &args.messages {
        let outgoing = local.send(&peer, text).await;
        match &outgoing.status {
            DeliveryStatus::Delivered => tracing::info!(to = %peer, %text, "sent"),
            DeliveryStatus::Failed(err) => {
                tracing::error!(to = %peer, %text, error = %err, "failed");
            },
        }
    }

    for message in local.conversation(&peer).await? {
        let text = message.resolution.display_text();
        tracing::info!(from = %message.sender, text, "received");
    }

    Ok(())
}

fn announce_held_key(
    directory: &KeyDirectory,
    alias: &Alias,
    store: &RedbKeyStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(device_id), Some(record)) = (store.device_id()?, store.latest()?) else {
        return Ok(());
    };

    directory.register(alias, RegisterKeyRequest {
        device_id,
        key_id: record.key_id,
        public_key: record.public_key().as_bytes().to_vec(),
    })?;
    tracing::debug!(key_id = %record.key_id, "announced held key");

    Ok(())
}
