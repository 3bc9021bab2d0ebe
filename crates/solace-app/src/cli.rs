//! CLI argument definitions for the Solace application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use solace_core::types::SessionId;

/// Solace - a wellness chat companion with persistent sessions.
#[derive(Parser, Debug)]
#[command(name = "solace", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the session state.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Base URL of the reply service.
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Do not speak replies even if configured to.
    #[arg(long = "mute")]
    pub mute: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List sessions, most recent first.
    List,
    /// Start a new session and make it active.
    New,
    /// Make a session active.
    Switch { id: SessionId },
    /// Print a session transcript (active session by default).
    Show { id: Option<SessionId> },
    /// Send one message from the active session.
    Send {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Interactive chat on the active session (default).
    Chat,
    /// Print a session summary (active session by default).
    Summary { id: Option<SessionId> },
    /// Write a printable HTML export of a session.
    Export {
        id: Option<SessionId>,
        /// Output file. Defaults to a name derived from the session title.
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SOLACE_CONFIG env var > platform default (~/.solace/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SOLACE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > SOLACE_DATA_DIR env var.
    /// Returns `None` if neither is set (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        if let Some(ref p) = self.data_dir {
            return Some(p.to_string_lossy().to_string());
        }
        std::env::var("SOLACE_DATA_DIR").ok().filter(|v| !v.is_empty())
    }

    /// Resolve the bearer token for the reply service.
    ///
    /// Priority: SOLACE_API_TOKEN env var > config file value.
    pub fn resolve_api_token(&self, config_token: Option<String>) -> Option<String> {
        std::env::var("SOLACE_API_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .or(config_token)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// The subcommand to run. Interactive chat when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".solace").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".solace").join("config.toml");
    }
    PathBuf::from("config.toml")
}
