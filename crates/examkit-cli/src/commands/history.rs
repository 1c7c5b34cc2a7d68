//! The `examkit history` command: summarize saved exam reports.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::report::{load_report_directory, HistorySummary};
use examkit_providers::config::load_config_from;

use crate::render::{history_table, print_history_summary};

pub fn execute(dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => load_config_from(config.as_deref())?.output_dir,
    };

    if !dir.is_dir() {
        println!("No exam reports found in {}", dir.display());
        return Ok(());
    }

    let reports = load_report_directory(&dir)?;
    if reports.is_empty() {
        println!("No exam reports found in {}", dir.display());
        return Ok(());
    }

    println!("{}", history_table(&reports));
    print_history_summary(&HistorySummary::from_reports(&reports));

    Ok(())
}
