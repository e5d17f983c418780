//! Arth-Mitra chat CLI
//!
//! Terminal client for the Arth-Mitra financial assistant backend:
//! streams responses token by token, shows citation sources and auto-pins
//! inferred charts from each answer.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use arthmitra_chat::client::HttpChatClient;
use arthmitra_chat::config::{Config, DEFAULT_API_URL};
use arthmitra_chat::repl::Repl;
use arthmitra_chat::session::ChatSession;
use arthmitra_chat::store::{default_session_path, FileStore};

#[derive(Parser)]
#[command(name = "arthmitra-chat")]
#[command(about = "Terminal chat client for the Arth-Mitra financial assistant")]
struct Args {
    /// Backend base URL
    #[arg(long, env = "ARTHMITRA_API_URL")]
    api_url: Option<String>,

    /// User id attached to chat requests
    #[arg(long)]
    user_id: Option<String>,

    /// Session id attached to chat requests
    #[arg(long)]
    session_id: Option<String>,

    /// Skip the cached profile/session state
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (from ~/.arthmitra/.env or current dir)
    let env_path = dirs::home_dir()
        .map(|h| h.join(".arthmitra").join(".env"))
        .filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load();

    // Resolve values: CLI args > env vars (handled by clap) > config file > defaults
    let api_url = args
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let mut client = HttpChatClient::new(api_url);
    if let Some(secs) = config.request_timeout_secs {
        client = client.with_fallback_timeout(Duration::from_secs(secs));
    }

    let store = FileStore::new(default_session_path());
    let mut session = ChatSession::new();

    if !args.fresh {
        match session.restore(&store) {
            Ok(true) => info!("restored cached session state"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not read cached session state"),
        }
    }
    if args.user_id.is_some() || config.user_id.is_some() {
        session.set_user_id(args.user_id.or(config.user_id));
    }
    if args.session_id.is_some() || config.session_id.is_some() {
        session.set_session_id(args.session_id.or(config.session_id));
    }

    let mut repl = Repl::new(client, session, store)?;
    repl.run().await
}
