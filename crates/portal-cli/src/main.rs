//! portal - command-line client for the portal identity backend.
//!
//! Signs in, keeps the session tokens on disk (or in the OS keyring),
//! and issues authenticated requests with automatic token refresh.

mod app;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Debug, Parser)]
#[command(name = "portal", version, about = "Portal session and configuration client")]
struct Cli {
    /// Backend base URL (overrides config and PORTAL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session tokens
    Login {
        /// Account email; defaults to the last one used
        #[arg(long)]
        email: Option<String>,
        /// Keep the session across reboots
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and remove stored tokens
    Logout,
    /// Show whether a session is stored and when it expires
    Status,
    /// Fetch the signed-in user's profile
    Whoami,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// GET a path with the session token and print the JSON response
    Get { path: String },
    /// Load the remote application configuration
    Config {
        /// Application id (defaults to config and PORTAL_APP_ID)
        #[arg(long)]
        app: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // RUST_LOG controls the level (e.g. RUST_LOG=portal_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    // Dropping the guard flushes the file writer
    let _guard = init_tracing(cli.log_file.as_deref())?;
    info!(command = ?cli.command, "portal starting");

    let app = App::new(cli.api_url)?;

    let result = match cli.command {
        Command::Login { email, remember } => app.login(email, remember).await,
        Command::Logout => {
            app.logout();
            Ok(())
        }
        Command::Status => {
            app.status();
            Ok(())
        }
        Command::Whoami => app.whoami().await,
        Command::Refresh => app.refresh().await,
        Command::Get { path } => app.get(&path).await,
        Command::Config { app: app_id } => {
            app.show_config(app_id).await;
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_flags() {
        let cli = Cli::parse_from(["portal", "login", "--email", "ada@example.com", "--remember"]);
        match cli.command {
            Command::Login { email, remember } => {
                assert_eq!(email.as_deref(), Some("ada@example.com"));
                assert!(remember);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "portal",
            "get",
            "/api/users",
            "--api-url",
            "http://localhost:4000",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:4000"));
        assert!(matches!(cli.command, Command::Get { ref path } if path == "/api/users"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["portal"]).is_err());
    }
}
