//! Question model types for examkit.
//!
//! Questions are passive data. Their wire shape (`RawQuestion`) is shared by
//! HTTP payloads, TOML question banks and saved reports; converting into a
//! [`Question`] validates it.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExamError;

/// Time allotment used when a question does not specify one.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

/// The fixed option pair of a true/false question.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

/// Opaque question identifier, unique within a session.
///
/// Sources send either strings or integers; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for QuestionId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => QuestionId(s),
            RawId::Signed(n) => QuestionId(n.to_string()),
            RawId::Unsigned(n) => QuestionId(n.to_string()),
        })
    }
}

/// Question type tag, as sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
    Essay,
    Coding,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "mcq"),
            QuestionType::TrueFalse => write!(f, "true_false"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
            QuestionType::Essay => write!(f, "essay"),
            QuestionType::Coding => write!(f, "coding"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "multiple_choice" => Ok(QuestionType::Mcq),
            "true_false" | "truefalse" | "tf" => Ok(QuestionType::TrueFalse),
            "short_answer" | "short" => Ok(QuestionType::ShortAnswer),
            "essay" => Ok(QuestionType::Essay),
            "coding" | "code" => Ok(QuestionType::Coding),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Requested difficulty of generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Basic => write!(f, "basic"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "easy" => Ok(Difficulty::Basic),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// What kind of question this is, with the data only that kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Mcq { options: Vec<String> },
    TrueFalse,
    ShortAnswer,
    Essay,
    Coding,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Mcq { .. } => QuestionType::Mcq,
            QuestionKind::TrueFalse => QuestionType::TrueFalse,
            QuestionKind::ShortAnswer => QuestionType::ShortAnswer,
            QuestionKind::Essay => QuestionType::Essay,
            QuestionKind::Coding => QuestionType::Coding,
        }
    }

    /// Selectable options; empty for free-form kinds.
    pub fn options(&self) -> Vec<&str> {
        match self {
            QuestionKind::Mcq { options } => options.iter().map(String::as_str).collect(),
            QuestionKind::TrueFalse => TRUE_FALSE_OPTIONS.to_vec(),
            _ => Vec::new(),
        }
    }

    /// The shape of value the input surface should collect for this kind.
    pub fn answer_shape(&self) -> AnswerShape<'_> {
        match self {
            QuestionKind::Mcq { .. } | QuestionKind::TrueFalse => {
                AnswerShape::Choice(self.options())
            }
            QuestionKind::ShortAnswer => AnswerShape::Line,
            QuestionKind::Essay => AnswerShape::Paragraph,
            QuestionKind::Coding => AnswerShape::Code,
        }
    }
}

/// Accepted answer shape. The answer store itself is always string-valued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerShape<'a> {
    /// Exactly one of the listed options.
    Choice(Vec<&'a str>),
    /// A single line of free text.
    Line,
    /// Multi-line free text.
    Paragraph,
    /// Source code.
    Code,
}

impl AnswerShape<'_> {
    /// Whether `value` is acceptable input for this shape.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            AnswerShape::Choice(options) => options.iter().any(|o| *o == value),
            AnswerShape::Line => !value.contains('\n'),
            AnswerShape::Paragraph | AnswerShape::Code => true,
        }
    }

    /// Resolve option text (trimmed, case-insensitive), falling back to a
    /// 1-based option number when no option reads that way.
    pub fn resolve_choice(&self, input: &str) -> Option<&str> {
        let AnswerShape::Choice(options) = self else {
            return None;
        };
        let input = input.trim();
        options
            .iter()
            .find(|o| o.trim().eq_ignore_ascii_case(input))
            .copied()
            .or_else(|| {
                let n = input.parse::<usize>().ok()?;
                n.checked_sub(1).and_then(|i| options.get(i)).copied()
            })
    }

    /// The option with 1-based number `n`, ignoring option text.
    pub fn option_at(&self, n: usize) -> Option<&str> {
        let AnswerShape::Choice(options) = self else {
            return None;
        };
        n.checked_sub(1).and_then(|i| options.get(i)).copied()
    }
}

/// A single exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Hidden until toggled.
    pub hint: Option<String>,
    /// Allotment in seconds, always positive.
    pub time_limit: u32,
    /// Present only when the question can be scored locally.
    pub correct_answer: Option<String>,
}

impl Question {
    /// Create a question with the default time allotment and no hint or answer key.
    pub fn new(id: impl Into<QuestionId>, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            hint: None,
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            correct_answer: None,
        }
    }

    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit = secs;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    pub fn options(&self) -> Vec<&str> {
        self.kind.options()
    }

    pub fn answer_shape(&self) -> AnswerShape<'_> {
        self.kind.answer_shape()
    }

    /// Check the invariants a question must hold before it can be loaded.
    pub fn validate(&self) -> Result<(), ExamError> {
        let invalid = |reason: &str| ExamError::InvalidQuestion {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };

        if self.id.as_str().trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.prompt.trim().is_empty() {
            return Err(invalid("empty prompt"));
        }
        if self.time_limit == 0 {
            return Err(invalid("time limit must be positive"));
        }
        if let QuestionKind::Mcq { options } = &self.kind {
            if options.is_empty() {
                return Err(invalid("multiple-choice question has no options"));
            }
        }
        Ok(())
    }
}

/// Wire representation of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = ExamError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let options = raw.options.unwrap_or_default();
        let question_type = match raw.question_type.as_deref() {
            Some(tag) => tag.parse::<QuestionType>().map_err(|reason| ExamError::InvalidQuestion {
                id: raw.id.to_string(),
                reason,
            })?,
            None if options.is_empty() => QuestionType::ShortAnswer,
            None => QuestionType::Mcq,
        };

        let kind = match question_type {
            QuestionType::Mcq => QuestionKind::Mcq { options },
            QuestionType::TrueFalse => QuestionKind::TrueFalse,
            QuestionType::ShortAnswer => QuestionKind::ShortAnswer,
            QuestionType::Essay => QuestionKind::Essay,
            QuestionType::Coding => QuestionKind::Coding,
        };

        let question = Question {
            id: raw.id,
            prompt: raw.prompt,
            kind,
            hint: raw.hint.filter(|h| !h.trim().is_empty()),
            time_limit: raw.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            correct_answer: raw.correct_answer,
        };
        question.validate()?;
        Ok(question)
    }
}

impl From<Question> for RawQuestion {
    fn from(q: Question) -> Self {
        let question_type = q.question_type();
        let options = match q.kind {
            QuestionKind::Mcq { options } => Some(options),
            _ => None,
        };
        RawQuestion {
            id: q.id,
            prompt: q.prompt,
            question_type: Some(question_type.to_string()),
            options,
            hint: q.hint,
            time_limit: Some(q.time_limit),
            correct_answer: q.correct_answer,
        }
    }
}

/// An ordered, validated, non-empty list of questions with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::EmptyQuestionSet);
        }
        let mut seen = HashSet::new();
        for q in &questions {
            q.validate()?;
            if !seen.insert(q.id.as_str()) {
                return Err(ExamError::DuplicateQuestionId(q.id.to_string()));
            }
        }
        Ok(Self { questions })
    }

    /// Index of the question with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id.as_str() == id)
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.questions.len()
    }

    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }

    pub fn into_inner(self) -> Vec<Question> {
        self.questions
    }
}

impl Deref for QuestionSet {
    type Target = [Question];

    fn deref(&self) -> &Self::Target {
        &self.questions
    }
}

impl<'de> Deserialize<'de> for QuestionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let questions = Vec::<Question>::deserialize(deserializer)?;
        QuestionSet::new(questions).map_err(serde::de::Error::custom)
    }
}

/// A named collection of questions loaded from a bank file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub default_time_limit: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}
