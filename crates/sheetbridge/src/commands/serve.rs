//! `sheetbridge serve` command implementation.

use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use clap::Args;
use console::style;
use sheetbridge_core::{AllowList, Config, ConfigError, GoogleSpreadsheet, SpreadsheetStore};
use sheetbridge_runtime::{AppState, UpdatePolicy, register_routes};
use tokio::signal;
use tracing::info;

use crate::config::SheetArgs;

/// Arguments for the `serve` command.
#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub sheet: SheetArgs,

    /// Address to bind the HTTP server to.
    #[arg(short = 'a', long, env = "SHEETBRIDGE_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: String,

    /// Comma-separated columns `PUT /update-cell` may target (empty allows
    /// any).
    #[arg(long, env = "VALID_COLUMNS", default_value = "")]
    pub valid_columns: String,

    /// Comma-separated values `PUT /update-cell` may write (empty allows any;
    /// numbers are always allowed).
    #[arg(long, env = "VALID_VALUES", default_value = "")]
    pub valid_values: String,
}

impl ServeArgs {
    fn config(&self) -> Result<Config, ConfigError> {
        Ok(self
            .sheet
            .config()?
            .with_valid_columns(AllowList::parse(&self.valid_columns))
            .with_valid_values(AllowList::parse(&self.valid_values)))
    }
}

pub async fn run(args: &ServeArgs) -> Result<()> {
    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Received shutdown signal");
    };
    run_with_shutdown(args, shutdown).await
}

/// Connects to the spreadsheet, then serves until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the spreadsheet
/// cannot be loaded, the address cannot be bound, or the server fails.
async fn run_with_shutdown<F>(args: &ServeArgs, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = args.config().context("invalid configuration")?;

    println!("{} Connecting to spreadsheet...", style("→").cyan());
    let document = GoogleSpreadsheet::connect(&config)
        .await
        .context("failed to load spreadsheet")?;
    let info = document.info().await.context("failed to load spreadsheet")?;
    println!(
        "{} Loaded Sheet: {} ({} worksheet(s))",
        style("✓").green().bold(),
        info.title,
        info.worksheets.len()
    );

    let addr: SocketAddr = args
        .addr
        .parse()
        .with_context(|| format!("invalid --addr value: {}", args.addr))?;

    let state = AppState::new(Arc::new(document), UpdatePolicy::from_config(&config));
    let router = register_routes(Router::new(), state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server on {addr}"))?;

    info!(address = %addr, sheet_id = %config.sheet_id, "Starting sheetbridge server");

    println!(
        "{} Server running on http://{}",
        style("✓").green().bold(),
        addr
    );
    println!("Press Ctrl+C to stop\n");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    info!("sheetbridge server stopped");
    Ok(())
}
