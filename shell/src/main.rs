//! Docstore Shell - terminal front end for the docstore engine.
//!
//! Presents a numbered menu on stdout, reads answers from stdin and forwards
//! them to a file-backed [`Store`]. Logs go to stderr.

mod config;
mod input;
mod session;

use crate::config::Config;
use crate::session::Session;
use docstore_engine::Store;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docstore_shell=info,docstore_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Opening store at {}", config.store_path.display());
    let store = Store::open(config.store_config());

    println!("Welcome to the Docstore Terminal Interface!");
    Session::new(&store, io::stdin().lock(), io::stdout().lock()).run()?;

    Ok(())
}
