//! REST proxy for a single Google Sheets spreadsheet.
//!
//! Usage:
//! ```bash
//! sheetbridge serve                  # Serve the REST API on 127.0.0.1:3000
//! sheetbridge serve --addr 0.0.0.0:8080
//! sheetbridge check                  # Verify credentials and list worksheets
//! sheetbridge --log-format json serve
//! ```
//!
//! Settings come from flags or their environment variables (`SHEET_ID`,
//! `GOOGLE_SERVICE_ACCOUNT_EMAIL`, `GOOGLE_PRIVATE_KEY`, ...). A `.env` file in
//! the working directory is loaded first when present.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "sheetbridge", author, version, about)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API
    Serve(commands::serve::ServeArgs),

    /// Check credentials and list the spreadsheet's worksheets
    Check(commands::check::CheckArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serve(_) => f.debug_tuple("Serve").finish(),
            Self::Check(_) => f.debug_tuple("Check").finish(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    check_dotenv(dotenvy::dotenv().map(drop))?;

    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match &cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Check(args) => commands::check::run(args).await,
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn check_dotenv(result: Result<(), dotenvy::Error>) -> Result<()> {
    match result {
        Err(err) if !err.not_found() => Err(err).context("failed to load .env file"),
        _ => Ok(()),
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse().context("failed to parse log directive")?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::error::ErrorKind;

    use super::*;

    fn parse(argv: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(argv.iter().copied())
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let err = parse(&["sheetbridge"]).expect_err("expected clap parse error");
        assert!(
            matches!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
            ),
            "unexpected error kind: {:?}",
            err.kind()
        );
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        let err = parse(&["sheetbridge", "not-a-command"]).expect_err("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_cli_serve_with_flags() -> Result<(), clap::Error> {
        let cli = parse(&[
            "sheetbridge",
            "serve",
            "--sheet-id",
            "doc123",
            "--addr",
            "0.0.0.0:8080",
        ])?;

        assert_eq!(cli.log_format, LogFormat::Text);
        let Command::Serve(args) = cli.command else {
            panic!("expected Command::Serve");
        };
        assert_eq!(args.sheet.sheet_id.as_deref(), Some("doc123"));
        assert_eq!(args.addr, "0.0.0.0:8080");
        Ok(())
    }

    #[test]
    fn test_cli_log_format_is_global() -> Result<(), clap::Error> {
        let cli = parse(&["sheetbridge", "check", "--log-format", "json"])?;
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Check(_)));

        let cli = parse(&["sheetbridge", "--log-format", "json", "serve"])?;
        assert_eq!(cli.log_format, LogFormat::Json);
        Ok(())
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenvy::from_path(dir.path().join(".env"));
        assert!(check_dotenv(result).is_ok());
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NOT A VALID LINE").unwrap();

        let err = check_dotenv(dotenvy::from_path(file.path())).unwrap_err();
        assert!(err.to_string().contains("failed to load .env file"));
    }

    #[test]
    fn test_cli_rejects_unknown_log_format() {
        let err = parse(&["sheetbridge", "--log-format", "xml", "serve"])
            .expect_err("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
