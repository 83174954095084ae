use anyhow::{Context, Result};
use beacon_client::{
    CandidatePolicy, Negotiator, NegotiatorConfig, RelayClient, Role, RtcConfig, RtcPeer,
};
use beacon_core::{PeerId, RoomId};
use beacon_server::{RetentionConfig, ServerConfig};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon", version, about = "Room-scoped WebRTC signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay.
    Serve {
        #[arg(long, env = "BEACON_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        #[arg(long, env = "BEACON_BASE_PATH", default_value = "")]
        base_path: String,

        /// Room record lifetime in seconds, refreshed on every room write.
        #[arg(long, env = "BEACON_ROOM_TTL", default_value_t = 300)]
        room_ttl: u64,

        /// Log entry lifetime in seconds.
        #[arg(long, env = "BEACON_MESSAGE_TTL", default_value_t = 60)]
        message_ttl: u64,
    },
    /// Negotiate a data channel through a relay and pipe stdin/stdout over it.
    Dial {
        #[arg(long, env = "BEACON_SERVER")]
        server: String,

        #[arg(long)]
        room: String,

        /// Identity in the room; random when omitted.
        #[arg(long)]
        id: Option<String>,

        /// Create (or reset) the room before joining it.
        #[arg(long)]
        create: bool,

        /// Offer to peers that announce themselves instead of only answering.
        #[arg(long)]
        offer: bool,

        /// Drop the first two local candidates like older clients did.
        #[arg(long)]
        legacy_candidates: bool,

        #[arg(long = "ice")]
        ice_servers: Vec<String>,

        /// Give up when no peer connects within this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            base_path,
            room_ttl,
            message_ttl,
        } => {
            let config = ServerConfig {
                bind,
                base_path,
                retention: RetentionConfig {
                    room_ttl: Duration::from_secs(room_ttl),
                    message_ttl: Duration::from_secs(message_ttl),
                },
                ..ServerConfig::default()
            };
            serve(config).await
        }
        Commands::Dial {
            server,
            room,
            id,
            create,
            offer,
            legacy_candidates,
            ice_servers,
            timeout,
        } => {
            let id = id.map(PeerId::from).unwrap_or_else(PeerId::random);
            let relay = RelayClient::new(server, RoomId::from(room.as_str()), id);

            let mut rtc = RtcConfig::default();
            if !ice_servers.is_empty() {
                rtc.ice_servers = ice_servers;
            }
            let config = NegotiatorConfig {
                role: if offer { Role::Offerer } else { Role::Answerer },
                candidates: if legacy_candidates {
                    CandidatePolicy::legacy()
                } else {
                    CandidatePolicy::default()
                },
                ..NegotiatorConfig::default()
            };
            dial(relay, create, rtc, config, timeout.map(Duration::from_secs)).await
        }
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    eprintln!(
        "{} {}",
        "📡 Relay listening on".green().bold(),
        listener.local_addr()?
    );
    beacon_server::serve(listener, config)
        .await
        .context("Relay stopped")
}

async fn dial(
    relay: RelayClient,
    create: bool,
    rtc: RtcConfig,
    config: NegotiatorConfig,
    timeout: Option<Duration>,
) -> Result<()> {
    eprintln!(
        "{} room {} as {}",
        "🔌 Dialing".cyan(),
        relay.room().to_string().bold(),
        relay.id().to_string().bold()
    );

    if create {
        relay.create().await.context("Failed to create room")?;
    }

    let (peer, events) = RtcPeer::new(rtc)
        .await
        .context("Failed to set up peer connection")?;
    let negotiation = Negotiator::new(relay, Arc::new(peer), events, config).open();

    let stream = match timeout {
        Some(limit) => tokio::time::timeout(limit, negotiation)
            .await
            .context("No peer connected in time")??,
        None => negotiation.await?,
    };
    eprintln!("{}", "✨ Connected, piping stdin/stdout".green().bold());

    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    tokio::select! {
        sent = tokio::io::copy(&mut stdin, &mut writer) => {
            info!("stdin closed after {} byte(s)", sent?);
        }
        received = tokio::io::copy(&mut reader, &mut stdout) => {
            info!("Peer closed after {} byte(s)", received?);
        }
    }
    Ok(())
}
