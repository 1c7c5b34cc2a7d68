//! Line commands accepted while an exam is running.

use examkit_core::model::AnswerShape;

/// One parsed line of exam input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamCommand {
    /// Record this answer for the current question.
    Answer(String),
    Next,
    Previous,
    /// 1-based question number.
    Jump(usize),
    Hint,
    Submit,
    Quit,
    Help,
    Empty,
    Invalid(String),
}

/// Parse a line typed during the exam.
///
/// A bare number picks an option by position on choice questions. `a <text>`
/// answers any question; on choice questions the text is matched against the
/// option labels first and read as an option number otherwise.
/// For paragraph and code answers a literal `\n` becomes a line break.
pub fn parse_command(line: &str, shape: &AnswerShape<'_>) -> ExamCommand {
    let line = line.trim();
    if line.is_empty() {
        return ExamCommand::Empty;
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match (head.to_lowercase().as_str(), rest) {
        ("n" | "next", "") => ExamCommand::Next,
        ("p" | "prev" | "previous", "") => ExamCommand::Previous,
        ("h" | "hint", "") => ExamCommand::Hint,
        ("s" | "submit", "") => ExamCommand::Submit,
        ("q" | "quit", "") => ExamCommand::Quit,
        ("?" | "help", "") => ExamCommand::Help,
        ("j" | "jump", target) => match target.parse::<usize>() {
            Ok(n) if n >= 1 => ExamCommand::Jump(n),
            _ => ExamCommand::Invalid(format!("expected a question number, got {target:?}")),
        },
        ("a" | "answer", "") => ExamCommand::Invalid("answer text is missing".into()),
        ("a" | "answer", text) => answer_for(text, shape),
        _ if matches!(shape, AnswerShape::Choice(_)) && line.parse::<usize>().is_ok() => {
            pick_option(line, shape)
        }
        _ => ExamCommand::Invalid(format!("unknown command {line:?}, type ? for help")),
    }
}

/// A bare number always picks by position, even when options are numbers too.
fn pick_option(number: &str, shape: &AnswerShape<'_>) -> ExamCommand {
    let AnswerShape::Choice(options) = shape else {
        return ExamCommand::Invalid(format!("{number:?} is not an option"));
    };
    match number.parse::<usize>().ok().and_then(|n| shape.option_at(n)) {
        Some(option) => ExamCommand::Answer(option.to_string()),
        None => ExamCommand::Invalid(format!(
            "{number:?} is not one of the {} options",
            options.len()
        )),
    }
}

fn answer_for(text: &str, shape: &AnswerShape<'_>) -> ExamCommand {
    match shape {
        AnswerShape::Choice(options) => match shape.resolve_choice(text) {
            Some(option) => ExamCommand::Answer(option.to_string()),
            None => ExamCommand::Invalid(format!(
                "{text:?} is not one of the {} options",
                options.len()
            )),
        },
        AnswerShape::Line => ExamCommand::Answer(text.to_string()),
        AnswerShape::Paragraph | AnswerShape::Code => {
            ExamCommand::Answer(text.replace("\\n", "\n"))
        }
    }
}

/// Whether a confirmation reply means yes.
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
