//! The `examkit show` command: print a saved exam report.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::report::ExamReport;
use examkit_report::html::{generate_html, write_html_report};

use crate::render::print_report;

pub fn execute(report_path: PathBuf, format: String, out: Option<PathBuf>) -> Result<()> {
    let report = ExamReport::load_json(&report_path)?;

    match format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "html" => match out {
            Some(path) => {
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            None => println!("{}", generate_html(&report)),
        },
        "text" => {
            if let Some(topic) = &report.topic {
                println!("Exam: {topic}");
            }
            println!(
                "Taken {} in {:.1}s",
                report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.duration_ms as f64 / 1000.0
            );
            print_report(&report);
        }
        other => anyhow::bail!("unknown format: {other} (expected text, markdown, json or html)"),
    }

    Ok(())
}
