//! pebridge - Property Exchange bridge CLI
//!
//! Subcommands:
//! - `pebridge serve` - run the bridge over a line-oriented stdio word
//!   transport (one batch of hex words per line; logs go to stderr)
//! - `pebridge pack <payload>` - chunk a payload into UMP word pairs
//! - `pebridge unpack <words>...` - reassemble a payload from UMP words

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use pebridge::config::BridgeConfig;
use pebridge::dispatch::Bridge;
use pebridge::mapping::{self, RouteTable};
use pebridge::transport::{format_word_line, parse_word_line};
use umpwire::sysex7;

#[derive(Parser)]
#[command(name = "pebridge")]
#[command(about = "MIDI 2.0 Property Exchange to HTTP bridge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge over stdin/stdout word batches
    Serve {
        /// Channel depth for in-flight inbound batches
        #[arg(long, default_value = "64")]
        depth: usize,
    },

    /// Encode a payload into SysEx7 UMP words
    Pack {
        /// Payload text, typically a Property Exchange envelope
        payload: String,
    },

    /// Decode SysEx7 UMP hex words back into payload text
    Unpack {
        /// Hex words, two per packet
        words: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { depth } => serve(depth).await?,
        Commands::Pack { payload } => {
            for packet in sysex7::encode(payload.as_bytes()) {
                println!("{}", format_word_line(&packet.words()));
            }
        }
        Commands::Unpack { words } => {
            let words = parse_word_line(&words.join(" "))
                .context("words must be 32-bit hex values")?;
            let payload = sysex7::decode(&words);
            println!("{}", String::from_utf8_lossy(&payload));
        }
    }

    Ok(())
}

async fn serve(depth: usize) -> Result<()> {
    let config = BridgeConfig::from_env();
    info!(
        function_base = %config.function_base_url,
        persist_base = %config.persist_base_url,
        planner_base = %config.planner_base_url,
        "starting property exchange bridge"
    );

    // Mapping refresh is best-effort and happens once, before the loop.
    let mut routes = RouteTable::from_config(&config);
    let overrides = mapping::load_fact_overrides(&config.agent_id, &config.corpus_id);
    if !overrides.is_empty() {
        info!(count = overrides.len(), "applying fact-store mapping overrides");
    }
    routes.apply_overrides(&overrides);

    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u32>>(depth);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u32>>(depth);

    let bridge = Bridge::new(routes, Arc::new(outbound_tx));
    tokio::spawn(bridge.run(inbound_rx));

    // Stdout carries the wire protocol; logs stay on stderr.
    let writer = tokio::spawn(async move {
        while let Some(words) = outbound_rx.recv().await {
            println!("{}", format_word_line(&words));
        }
    });

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_word_line(&line) {
            Some(words) => {
                if inbound_tx.send(words).await.is_err() {
                    break;
                }
            }
            None => warn!(line = %line, "ignoring unparseable word line"),
        }
    }

    // EOF: close the inbound side and let in-flight responses drain.
    drop(inbound_tx);
    writer.await?;
    Ok(())
}
