//! Terminal rendering for exams and reports.

use comfy_table::{Cell, Color, Table};

use examkit_core::report::{ExamReport, HistorySummary};
use examkit_core::scoring::Verdict;
use examkit_core::session::SessionController;

pub const HELP: &str = "\
Commands:
  <n>          pick option n (multiple choice, true/false)
  a <text>     answer the current question (use \\n for line breaks in essays and code)
  n / p        next / previous question
  j <n>        jump to question n
  h            show or hide the hint
  s            submit the exam
  q            abandon the exam
  ?            this help";

/// Print the current question with its options, hint and timer.
pub fn print_question(session: &SessionController) {
    let (Some(question), Some(index), Some(questions)) = (
        session.current_question(),
        session.current_index(),
        session.questions(),
    ) else {
        return;
    };

    println!();
    println!(
        "Question {}/{} [{}] ({}s left)",
        index + 1,
        questions.len(),
        question.question_type(),
        session.remaining_seconds()
    );
    println!("{}", question.prompt);
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
    if session.hint_visible() {
        match &question.hint {
            Some(hint) => println!("Hint: {hint}"),
            None => println!("Hint: (none for this question)"),
        }
    }
    if let Some(answer) = session
        .answers()
        .and_then(|a| a.lookup(question.id.as_str()))
    {
        println!("Current answer: {answer}");
    }
}

fn verdict_cell(verdict: Verdict) -> Cell {
    match verdict {
        Verdict::Correct => Cell::new("Correct").fg(Color::Green),
        Verdict::Incorrect => Cell::new("Incorrect").fg(Color::Red),
    }
}

/// Summary line plus per-question table for a finished exam.
pub fn report_table(report: &ExamReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Correct answer", "Verdict"]);

    for (i, q) in report.questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.prompt),
            Cell::new(q.user_answer.as_deref().unwrap_or("(unanswered)")),
            Cell::new(q.correct_answer.as_deref().unwrap_or("-")),
            verdict_cell(q.verdict),
        ]);
    }
    table
}

pub fn print_report(report: &ExamReport) {
    let result = &report.result;
    println!();
    println!(
        "Score: {:.1}% ({}/{} correct)  Grade: {}  Status: {}",
        result.score_percent, result.correct_count, result.total_questions, result.grade, result.status
    );
    println!("{}", report_table(report));
}

/// One row per exam, oldest first.
pub fn history_table(reports: &[ExamReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Topic", "Score", "Grade", "Status", "Duration"]);

    for r in reports {
        table.add_row(vec![
            Cell::new(r.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(r.topic.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.1}%", r.result.score_percent)),
            Cell::new(r.result.grade),
            Cell::new(r.result.status),
            Cell::new(format!("{:.0}s", r.duration_ms as f64 / 1000.0)),
        ]);
    }
    table
}

pub fn print_history_summary(summary: &HistorySummary) {
    println!(
        "{} exam(s): {} passed, {} failed ({:.0}% pass rate)",
        summary.exams,
        summary.passed,
        summary.failed,
        summary.pass_rate() * 100.0
    );
    println!(
        "Average score {:.1}%, best {:.1}%",
        summary.average_score, summary.best_score
    );
    let grades: Vec<String> = summary
        .grade_counts
        .iter()
        .map(|(grade, count)| format!("{grade}: {count}"))
        .collect();
    if !grades.is_empty() {
        println!("Grades: {}", grades.join(", "));
    }
    if let Some(trend) = summary.trend {
        println!("Change since previous exam: {trend:+.1} points");
    }
}
