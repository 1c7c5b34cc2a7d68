//! examkit CLI: take timed exams in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examkit_core::model::{Difficulty, QuestionType};

mod commands;
mod input;
mod render;

#[derive(Parser)]
#[command(name = "examkit", version, about = "Timed examination client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a timed exam
    Take {
        /// Question bank TOML file
        #[arg(long, conflicts_with = "topic")]
        bank: Option<PathBuf>,

        /// Topic to request from the question service
        #[arg(long)]
        topic: Option<String>,

        /// Subject sent with the question request
        #[arg(long)]
        subject: Option<String>,

        /// Difficulty: basic, medium, hard
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Question type: mcq, true_false, short_answer, essay, coding
        #[arg(long = "type")]
        question_type: Option<QuestionType>,

        /// Number of questions
        #[arg(long)]
        count: Option<u32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (defaults to output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Do not save a report
        #[arg(long)]
        no_save: bool,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Print a saved exam report
    Show {
        /// Report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write HTML to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Summarize past exams
    History {
        /// Report directory (defaults to output_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examkit=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            topic,
            subject,
            difficulty,
            question_type,
            count,
            config,
            output,
            format,
            no_save,
        } => {
            commands::take::execute(commands::take::TakeArgs {
                bank,
                topic,
                subject,
                difficulty,
                question_type,
                count,
                config,
                output,
                format,
                no_save,
            })
            .await
        }
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Show {
            report,
            format,
            out,
        } => commands::show::execute(report, format, out),
        Commands::History { dir, config } => commands::history::execute(dir, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
