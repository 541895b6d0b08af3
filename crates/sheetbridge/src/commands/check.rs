//! `sheetbridge check` command implementation.
//!
//! Authenticates, loads document metadata and prints the worksheets, which is
//! the same startup work `serve` does without binding a port.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use sheetbridge_core::{DocumentInfo, GoogleSpreadsheet, SpreadsheetStore};

use crate::config::SheetArgs;

/// Arguments for the `check` command.
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub sheet: SheetArgs,

    /// Print the worksheet list as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub async fn run(args: &CheckArgs) -> Result<()> {
    let config = args.sheet.config().context("invalid configuration")?;
    let document = GoogleSpreadsheet::connect(&config)
        .await
        .context("failed to load spreadsheet")?;
    let info = document.info().await.context("failed to load spreadsheet")?;

    if args.json {
        println!("{}", render_json(&info)?);
    } else {
        print!("{}", render_table(&info));
    }
    Ok(())
}

fn render_json(info: &DocumentInfo) -> Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "title": info.title,
        "worksheets": info.worksheets,
    }))
    .context("failed to serialize worksheets")
}

fn render_table(info: &DocumentInfo) -> String {
    let mut out = format!(
        "{} {} ({} worksheet(s))\n",
        style("✓").green().bold(),
        info.title,
        info.worksheets.len()
    );
    for sheet in &info.worksheets {
        out.push_str(&format!(
            "  {:>3}  {:<30} {} rows x {} columns\n",
            sheet.index, sheet.title, sheet.row_count, sheet.column_count
        ));
    }
    out
}
