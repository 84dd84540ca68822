//! Entry point: parse CLI flags, load config and shared state, bind the
//! websocket listener, and accept connections until killed.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use sector_server::config::GameConfig;
use sector_server::game::AppState;
use sector_server::session::handle_connection;
use sector_server::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sector_server", about = "Multiplayer trading and combat server")]
struct Cli {
  /// Path to `game_config.json`.
  #[arg(long, default_value = "server/game_config.json")]
  config: PathBuf,

  /// Overrides `settings.server_port` from the config file, if given.
  #[arg(long)]
  port: Option<u16>,

  /// Root directory for `saves/` and `assets/`.
  #[arg(long, default_value = "data")]
  data_root: PathBuf,

  /// Deterministic RNG seeding for reproducible test runs.
  #[arg(long, default_value_t = false)]
  test_mode: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();
  let mut config = GameConfig::load(&cli.config)?;
  if let Some(port) = cli.port {
    config.set_server_port(port);
  }

  let state = Arc::new(AppState::load(cli.data_root.clone(), config, cli.test_mode)?);

  let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server_port()));
  let listener = TcpListener::bind(addr).await?;
  info!("listening on {addr}, data root {}", cli.data_root.display());

  loop {
    let (stream, peer) = match listener.accept().await {
      Ok(pair) => pair,
      Err(e) => {
        error!("accept failed: {e}");
        continue;
      }
    };
    info!("accepted connection from {peer}");
    let state = Arc::clone(&state);
    tokio::spawn(async move {
      handle_connection(stream, state).await;
    });
  }
}
