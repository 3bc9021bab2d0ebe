//! Solace application entry point.
//!
//! Composition root that wires the session store, the reply service, voice
//! output and the chat surface, then dispatches the requested subcommand.

mod app;
mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use solace_chat::HttpReplyService;
use solace_core::config::{SolaceConfig, StorageBackendKind};
use solace_core::error::SolaceError;
use solace_storage::{FileBackend, SessionStore, SqliteBackend};
use solace_voice::{SpeechSettings, VoiceOutputController};

use app::App;
use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SolaceConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(ref url) = args.api_url {
        config.service.base_url = url.clone();
    }
    config.service.api_token = args.resolve_api_token(config.service.api_token.take());

    // Tracing. Stdout carries transcripts and exports.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Solace v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let data_dir = config.general.data_dir_path();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let store = open_store(&config, &data_dir)?;

    // Reply service.
    let service = Arc::new(HttpReplyService::new(&config.service).map_err(SolaceError::from)?);
    tracing::info!(base_url = %config.service.base_url, "Reply service configured");

    // Voice output. Terminal hosts have no synthesizer, so replies stay silent
    // unless a host integration supplies one.
    let voice = VoiceOutputController::new(
        None,
        SpeechSettings::from(&config.voice),
        config.voice.output_enabled && !args.mute,
    );

    let app = App::new(store, service, voice);
    let mut out = std::io::stdout();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match args.command() {
        Command::List => app.list(&mut out)?,
        Command::New => app.new_session(&mut out)?,
        Command::Switch { id } => app.switch(id, &mut out)?,
        Command::Show { id } => app.show(id, &mut out)?,
        Command::Send { text } => {
            app.send(&text.join(" "), &mut out).await?;
        }
        Command::Chat => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            app.chat(stdin, &cwd, &mut out).await?;
        }
        Command::Summary { id } => app.summary(id, &mut out).await?,
        Command::Export { id, out: dest } => {
            app.export(id, dest, &cwd, &mut out).await?;
        }
    }

    Ok(())
}

/// Open the session store on the configured backend under `data_dir`.
fn open_store(
    config: &SolaceConfig,
    data_dir: &Path,
) -> Result<SessionStore, Box<dyn std::error::Error>> {
    let store = match config.storage.backend {
        StorageBackendKind::File => {
            let path = data_dir.join(&config.storage.file_name);
            SessionStore::open(FileBackend::new(path))?
        }
        StorageBackendKind::Sqlite => {
            let path = data_dir.join(&config.storage.sqlite_file);
            SessionStore::open(SqliteBackend::open(&path)?)?
        }
    };
    tracing::info!(sessions = store.len(), "Session store ready");
    Ok(store)
}
