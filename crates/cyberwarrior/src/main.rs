//! cyberwarrior - game server binary
//!
//! usage:
//!   cyberwarrior --cards cards.json
//!   cyberwarrior --bind 127.0.0.1:9000 --cards cards.json --hand-size 7
//!
//! log verbosity comes from RUST_LOG (default: info).

use std::path::PathBuf;

use clap::Parser;
use cyberwarrior::prelude::*;
use tracing_subscriber::EnvFilter;

/// cyberwarrior - two-player card game server
#[derive(Debug, Parser)]
#[command(name = "cyberwarrior")]
#[command(about = "Authoritative WebSocket server for the Cyberwarrior card game")]
#[command(version)]
struct Cli {
    /// address to listen on
    #[arg(long, env = "CYBERWARRIOR_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// card catalog: a JSON array of rows, header first
    #[arg(long, env = "CYBERWARRIOR_CARDS")]
    cards: PathBuf,

    /// cards dealt to each player at game start
    #[arg(long, env = "CYBERWARRIOR_HAND_SIZE", default_value_t = 5)]
    hand_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), CyberwarriorError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let catalog = CardCatalog::load(&cli.cards)?;

    let room_config = RoomConfig {
        hand_size: cli.hand_size,
        ..RoomConfig::default()
    };

    let server = CyberwarriorServer::builder()
        .bind(&cli.bind)
        .room_config(room_config)
        .build(catalog)
        .await?;

    server.run().await
}
