//! svc-shell
//!
//! Runs the bundled HTTP application under the lifecycle shell.
//!
//! ```text
//!            ┌──────────────────────── Shell ────────────────────────┐
//!            │                                                       │
//!  hooks ───▶│  handle_logging → handle_telemetry                    │
//!            │                                                       │
//!            │  ┌──────────── Group ────────────┐                    │
//!            │  │  server actor    signal actor │                    │
//!            │  │  (HttpServer)    (OS signals) │                    │
//!            │  └──────────────┬────────────────┘                    │
//!            │                 ▼                                     │
//!            │  drain (grace) → force close → classify cause         │
//!            │                                                       │
//!            │  handle_shutdown(cause)                               │
//!            └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use svc_shell::app::App;
use svc_shell::config::{load_config, validate_config, ShellConfig};
use svc_shell::{HttpServer, Shell, ShutdownCause};

#[derive(Parser)]
#[command(name = "svc-shell")]
#[command(about = "Run an HTTP service under a graceful lifecycle shell", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override shutdown.grace_secs.
    #[arg(long)]
    grace_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ShellConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(grace) = cli.grace_secs {
        config.shutdown.grace_secs = grace;
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {error}");
        }
        return Ok(ExitCode::FAILURE);
    }

    let app = App::new(config.observability.clone());
    let server = Arc::new(HttpServer::new(&config, App::routes()));
    let mut shell = Shell::new(server, config.shutdown.grace());

    let outcome = shell.start(&app).await;
    match shell.cause() {
        Some(cause) if !cause.is_error() => Ok(ExitCode::SUCCESS),
        cause => {
            tracing::error!(
                outcome = ?outcome,
                cause = cause.map(ShutdownCause::as_label),
                "Shell exited with error"
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
