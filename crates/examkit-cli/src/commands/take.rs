//! The `examkit take` command: run an interactive timed exam.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use examkit_core::model::{Difficulty, QuestionType};
use examkit_core::report::ExamReport;
use examkit_core::scoring::Evaluator;
use examkit_core::session::{SessionController, SubmitOutcome, TickEffect};
use examkit_core::timer::TimerTick;
use examkit_core::traits::{QuestionRequest, QuestionSource};
use examkit_providers::config::{create_question_source, create_scorer, load_config_from};
use examkit_providers::BankSource;
use examkit_report::html::write_html_report;

use crate::input::{is_yes, parse_command, ExamCommand};
use crate::render::{print_question, print_report, HELP};

/// Arguments of `examkit take`.
pub struct TakeArgs {
    pub bank: Option<PathBuf>,
    pub topic: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionType>,
    pub count: Option<u32>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub no_save: bool,
}

/// What the driver loop should do after handling an event.
enum Flow {
    Continue,
    Finished(Box<ExamReport>),
    Abandoned,
}

type InputLines = Lines<BufReader<Stdin>>;

pub async fn execute(args: TakeArgs) -> Result<()> {
    anyhow::ensure!(
        args.bank.is_some() || args.topic.is_some(),
        "either --bank or --topic is required"
    );
    anyhow::ensure!(args.count != Some(0), "--count must be at least 1");

    let config = load_config_from(args.config.as_deref())?;

    let evaluator = match create_scorer(&config)? {
        Some(scorer) => Evaluator::with_remote(scorer),
        None => Evaluator::local(),
    };

    let (source, topic): (Box<dyn QuestionSource>, String) = match &args.bank {
        Some(path) => {
            let bank = BankSource::from_path(path)?;
            let name = bank.bank().name.clone();
            (Box::new(bank), name)
        }
        None => (
            create_question_source(&config)?,
            args.topic.clone().unwrap_or_default(),
        ),
    };

    let request = QuestionRequest {
        topic: topic.clone(),
        user_id: config.user_id.clone(),
        subject: args.subject.clone(),
        difficulty: args.difficulty,
        question_type: args.question_type,
        count: args.count,
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let mut session = SessionController::new(
            config.session_context(),
            config.session.to_session_config(),
            evaluator.clone(),
        )
        .with_ticker(tick_tx);

        load_questions(&mut session, source.as_ref(), &request, &mut lines).await?;

        let total = session.questions().map(|q| q.len()).unwrap_or(0);
        println!("Exam: {topic} ({total} questions). Type ? for help.");
        print_question(&session);

        let Some(report) =
            run_exam(&mut session, ticks, &mut lines, config.user_id.as_deref(), &topic).await?
        else {
            println!("Exam abandoned.");
            return Ok(());
        };

        print_report(&report);
        if !args.no_save {
            save_report(&report, &output, &args.format)?;
        }

        println!("Retake with the same questions? [y/N]");
        match lines.next_line().await.context("failed to read input")? {
            Some(line) if is_yes(&line) => continue,
            _ => return Ok(()),
        }
    }
}

/// Load questions, offering a retry while the failure is transient.
async fn load_questions(
    session: &mut SessionController,
    source: &dyn QuestionSource,
    request: &QuestionRequest,
    lines: &mut InputLines,
) -> Result<()> {
    loop {
        let err = match session.load_from(source, request).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        if err.is_retryable() {
            println!("Could not load questions: {err}. Retry? [y/N]");
            if let Some(line) = lines.next_line().await.context("failed to read input")? {
                if is_yes(&line) {
                    continue;
                }
            }
        }
        return Err(anyhow::Error::new(err)
            .context(format!("could not load questions for {:?}", request.topic)));
    }
}

/// Drive one exam until it is submitted (`Some`) or abandoned (`None`).
async fn run_exam(
    session: &mut SessionController,
    mut ticks: mpsc::UnboundedReceiver<TimerTick>,
    lines: &mut InputLines,
    user_id: Option<&str>,
    topic: &str,
) -> Result<Option<Box<ExamReport>>> {
    let mut confirming = false;

    loop {
        let flow = tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read input")? {
                    Some(line) => handle_line(session, &line, &mut confirming, user_id, topic).await,
                    None => {
                        session.abandon();
                        anyhow::bail!("input closed before the exam was submitted");
                    }
                }
            }
            Some(tick) = ticks.recv() => {
                let effect = session.on_tick(tick);
                handle_tick(session, effect, user_id, topic).await
            }
        };

        match flow {
            Flow::Continue => {}
            Flow::Finished(report) => return Ok(Some(report)),
            Flow::Abandoned => return Ok(None),
        }
    }
}

async fn handle_line(
    session: &mut SessionController,
    line: &str,
    confirming: &mut bool,
    user_id: Option<&str>,
    topic: &str,
) -> Flow {
    if *confirming {
        *confirming = false;
        if is_yes(line) {
            return submit(session, true, confirming, user_id, topic).await;
        }
        println!("Submission cancelled.");
        return Flow::Continue;
    }

    let Some(question) = session.current_question() else {
        return Flow::Continue;
    };
    let command = parse_command(line, &question.answer_shape());

    let moved = match command {
        ExamCommand::Empty => return Flow::Continue,
        ExamCommand::Help => {
            println!("{HELP}");
            return Flow::Continue;
        }
        ExamCommand::Invalid(message) => {
            println!("{message}");
            return Flow::Continue;
        }
        ExamCommand::Answer(value) => {
            let saved = value.clone();
            match session.answer(value) {
                Ok(()) => println!("Saved: {saved}"),
                Err(e) => println!("{e}"),
            }
            return Flow::Continue;
        }
        ExamCommand::Hint => session.toggle_hint().map(|_| true),
        ExamCommand::Next => session.next().inspect(|moved| {
            if !moved {
                println!("Already at the last question.");
            }
        }),
        ExamCommand::Previous => session.previous().inspect(|moved| {
            if !moved {
                println!("Already at the first question.");
            }
        }),
        ExamCommand::Jump(n) => session.jump(n - 1),
        ExamCommand::Submit => return submit(session, false, confirming, user_id, topic).await,
        ExamCommand::Quit => {
            session.abandon();
            return Flow::Abandoned;
        }
    };

    match moved {
        Ok(true) => print_question(session),
        Ok(false) => {}
        Err(e) => println!("{e}"),
    }
    Flow::Continue
}

async fn handle_tick(
    session: &mut SessionController,
    effect: TickEffect,
    user_id: Option<&str>,
    topic: &str,
) -> Flow {
    match effect {
        TickEffect::Ignored => {}
        TickEffect::Counted(remaining) => {
            if remaining == 10 || remaining <= 3 {
                println!("  {remaining}s left");
            }
        }
        TickEffect::Advanced(_) => {
            println!("Time's up! Moving on.");
            print_question(session);
        }
        TickEffect::FinalExpired => {
            println!("Time's up on the last question. Type s to submit.");
        }
        TickEffect::SubmitDue => {
            println!("Time's up. Submitting.");
            let mut confirming = false;
            return submit(session, true, &mut confirming, user_id, topic).await;
        }
    }
    Flow::Continue
}

async fn submit(
    session: &mut SessionController,
    acknowledge_unanswered: bool,
    confirming: &mut bool,
    user_id: Option<&str>,
    topic: &str,
) -> Flow {
    match session.submit(acknowledge_unanswered).await {
        Ok(SubmitOutcome::NeedsConfirmation { unanswered }) => {
            println!(
                "{} question(s) unanswered. Submit anyway? [y/N]",
                unanswered.len()
            );
            *confirming = true;
            Flow::Continue
        }
        Ok(SubmitOutcome::Submitted(submission)) => Flow::Finished(Box::new(
            ExamReport::from_submission(
                &submission,
                user_id.map(str::to_string),
                Some(topic.to_string()),
            ),
        )),
        Err(e) => {
            println!("Submission failed: {e}. Your answers are kept; type s to retry.");
            Flow::Continue
        }
    }
}

fn save_report(report: &ExamReport, output: &std::path::Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    let stem = report.file_name().trim_end_matches(".json").to_string();
    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(())
}
