//! Question bank and wire payload parsing.
//!
//! Banks are TOML files with a `[bank]` header and `[[questions]]` entries.
//! Payload helpers turn JSON bodies from question and scoring services into
//! model types, rejecting anything that does not have the expected shape.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ExamError;
use crate::model::{
    Difficulty, Question, QuestionBank, QuestionId, QuestionKind, RawQuestion,
    DEFAULT_TIME_LIMIT_SECS,
};
use crate::scoring::Verdict;

/// Intermediate TOML structure for bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default = "default_time_limit")]
    default_time_limit: u32,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_question_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.bank;
    if header.default_time_limit == 0 {
        anyhow::bail!(
            "{}: default_time_limit must be positive",
            source_path.display()
        );
    }

    let difficulty = header
        .difficulty
        .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|mut raw| {
            raw.time_limit = raw.time_limit.or(Some(header.default_time_limit));
            let id = raw.id.clone();
            Question::try_from(raw)
                .with_context(|| format!("{}: question {id}", source_path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: header.id,
        name: header.name,
        description: header.description,
        subject: header.subject,
        difficulty,
        default_time_limit: header.default_time_limit,
        questions,
    })
}

/// Recursively load all `.toml` question banks from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for issues that parsing alone does not catch.
pub fn validate_question_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.to_string()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &bank.questions {
        let Some(expected) = q.correct_answer.as_deref() else {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.to_string()),
                message: "no correct_answer; the exam will need a scoring service".into(),
            });
            continue;
        };

        match &q.kind {
            QuestionKind::Mcq { .. } | QuestionKind::TrueFalse => {
                let options = q.options();
                if !options.iter().any(|o| o.eq_ignore_ascii_case(expected.trim())) {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id.to_string()),
                        message: format!("correct_answer {expected:?} is not one of the options"),
                    });
                }
            }
            _ => {}
        }
    }

    for q in &bank.questions {
        if let QuestionKind::Mcq { options } = &q.kind {
            let mut seen = HashSet::new();
            if options.iter().any(|o| !seen.insert(o.as_str())) {
                warnings.push(ValidationWarning {
                    question_id: Some(q.id.to_string()),
                    message: "options contain duplicates".into(),
                });
            }
        }
    }

    warnings
}

/// Extract questions from a question service response body.
///
/// The body must be an object with a `questions` array.
pub fn parse_questions_payload(body: &Value) -> Result<Vec<Question>, ExamError> {
    let items = body
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| ExamError::InvalidResponseFormat("missing `questions` array".into()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Question::deserialize(item).map_err(|e| {
                ExamError::InvalidResponseFormat(format!("question at position {i}: {e}"))
            })
        })
        .collect()
}

/// Extract per-question verdicts from a scoring service response body.
///
/// Accepts a `validation` (or `verdicts`) object mapping ids to either a label
/// (`"Correct"`, `"Incorrect"`) or an object with a `status` label.
pub fn parse_verdicts_payload(body: &Value) -> Result<BTreeMap<QuestionId, Verdict>, ExamError> {
    let map = body
        .get("validation")
        .or_else(|| body.get("verdicts"))
        .and_then(Value::as_object)
        .ok_or_else(|| ExamError::InvalidResponseFormat("missing `validation` object".into()))?;

    map.iter()
        .map(|(id, value)| {
            let label = match value {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj
                    .get("status")
                    .or_else(|| obj.get("verdict"))
                    .and_then(Value::as_str),
                _ => None,
            };
            let verdict = label.and_then(Verdict::from_label).ok_or_else(|| {
                ExamError::InvalidResponseFormat(format!(
                    "unrecognized verdict for question {id}: {value}"
                ))
            })?;
            Ok((QuestionId::from(id.as_str()), verdict))
        })
        .collect()
}
