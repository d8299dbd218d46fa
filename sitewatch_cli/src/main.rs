mod demo;
mod render;
mod sse;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{Map, Value};
use sitewatch_core::{
    activity::{historical_sample, ActivityLog},
    config::ReconnectConfig,
    feed::{EventChannel, FeedSession, LocalHub},
    SiteWatchConfig,
};
use std::{path::PathBuf, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::sse::SseChannel;

/// Keep-alive intervals without any bytes before a watched stream is dropped.
const IDLE_KEEP_ALIVES: u32 = 3;

#[derive(Debug, Parser)]
#[command(name = "sitewatch", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Follow the live activity feed of a feed server
    Watch {
        /// URL of the server's event stream
        #[arg(long, default_value = "http://127.0.0.1:5000/events")]
        url: String,
    },
    /// Post one activity message to a feed server
    Send {
        /// Base URL of the feed server
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        url: String,
        #[arg(long)]
        message: String,
        /// success, warning, danger, error or info
        #[arg(long)]
        status: Option<String>,
        /// Category tag, e.g. device_connect
        #[arg(long = "type")]
        kind: Option<String>,
        /// Icon name, e.g. WifiOff
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        id: Option<String>,
        /// Epoch milliseconds
        #[arg(long)]
        time: Option<i64>,
    },
    /// Run a feed against a simulated in-process event source
    Demo {
        /// Number of simulated events
        #[arg(long, default_value_t = 20)]
        count: usize,
        /// Milliseconds between events
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
    /// Print the historical sample the feed starts from
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config =
        SiteWatchConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Watch { url } => {
            let client = Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .context("failed to build HTTP client")?;
            let mut channel = SseChannel::new(client, url);
            // The server sends keep-alives; several missed in a row means a dead link.
            let keep_alive = config.server.keep_alive_interval();
            if !keep_alive.is_zero() {
                channel = channel.with_idle_timeout(keep_alive * IDLE_KEEP_ALIVES);
            }
            let session = FeedSession::new(channel, &config.feed);
            follow(session).await;
        }
        Commands::Send {
            url,
            message,
            status,
            kind,
            icon,
            id,
            time,
        } => {
            let mut body = Map::new();
            body.insert("message".into(), Value::String(message));
            if let Some(status) = status {
                body.insert("status".into(), Value::String(status));
            }
            if let Some(kind) = kind {
                body.insert("type".into(), Value::String(kind));
            }
            if let Some(icon) = icon {
                body.insert("icon".into(), Value::String(icon));
            }
            if let Some(id) = id {
                body.insert("id".into(), Value::String(id));
            }
            if let Some(time) = time {
                body.insert("time".into(), Value::from(time));
            }

            let endpoint = format!("{}/message", url.trim_end_matches('/'));
            let response = Client::new()
                .post(&endpoint)
                .json(&Value::Object(body))
                .send()
                .await
                .with_context(|| format!("failed to reach {}", endpoint))?;
            let status = response.status();
            let reply: Value = response.json().await.context("invalid server reply")?;
            if !status.is_success() {
                error!(%status, "message rejected");
                bail!("server rejected message: {}", reply["error"]);
            }
            println!("{}", serde_json::to_string_pretty(&reply["activity"])?);
        }
        Commands::Demo { count, interval_ms } => {
            let hub = LocalHub::new(config.server.broadcast_capacity);
            let mut feed = config.feed.clone();
            // The simulated source ends for good; retrying would only stall.
            feed.reconnect = ReconnectConfig::disabled();

            let session = FeedSession::new(hub.channel(), &feed);
            let source = tokio::spawn(demo::run_source(
                hub,
                session.subscribe_state(),
                count,
                Duration::from_millis(interval_ms),
            ));
            follow(session).await;
            source.await.context("simulated source failed")?;
        }
        Commands::Seed => {
            let log = ActivityLog::with_seed(config.feed.capacity, historical_sample());
            render::print_log("Historical activity", &log);
        }
    }

    Ok(())
}

/// Prints feed updates until the session ends or Ctrl-C, then the final log.
/// The session, and with it the channel, is released on every path out.
async fn follow<C: EventChannel>(mut session: FeedSession<C>) {
    info!(session = %session.id(), "following activity feed");
    render::print_log("Recent activity", session.log());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            update = session.next_update() => match update {
                Some(update) => {
                    if let Some(line) = render::update_line(&update) {
                        println!("{}", line);
                    }
                }
                None => break,
            },
        }
    }

    session.close();
    println!();
    render::print_log("Final activity", session.log());
    render::print_stats(session.stats());
}
