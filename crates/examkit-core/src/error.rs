//! Exam error types.
//!
//! Every variant is recoverable at the caller: the session is left in the
//! state it had before the failing call, so the user can simply retry.
//! Collaborators may return these inside an `anyhow::Error`; the evaluator and
//! the session controller downcast to keep the classification intact.

use thiserror::Error;

/// Errors raised by the exam session, its model and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    /// A session or evaluation was attempted with no questions.
    #[error("no questions to load")]
    EmptyQuestionSet,

    /// Two questions in one set share an id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    /// A question failed validation (zero time limit, mcq without options, ...).
    #[error("invalid question {id}: {reason}")]
    InvalidQuestion { id: String, reason: String },

    /// A question source or scoring service returned an unexpected shape.
    #[error("invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// The question source could not be reached or returned an error.
    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),

    /// Scoring failed; the session stays in progress and submit may be retried.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The operation needs a loaded, unsubmitted session.
    #[error("no exam in progress")]
    NotInProgress,

    /// `load` was called while a session was already active or finished.
    #[error("an exam is already loaded")]
    AlreadyLoaded,

    /// Navigation target outside the question list.
    #[error("question index {index} out of range (0..{len})")]
    QuestionOutOfRange { index: usize, len: usize },

    /// An answer was recorded for an id that is not part of the session.
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),
}

impl ExamError {
    /// Returns `true` if retrying the same call may succeed without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExamError::SubmissionFailed(_)
                | ExamError::SourceUnavailable(_)
                | ExamError::InvalidResponseFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ExamError::SubmissionFailed("down".into()).is_retryable());
        assert!(ExamError::InvalidResponseFormat("x".into()).is_retryable());
        assert!(!ExamError::EmptyQuestionSet.is_retryable());
        assert!(!ExamError::NotInProgress.is_retryable());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            ExamError::QuestionOutOfRange { index: 4, len: 3 }.to_string(),
            "question index 4 out of range (0..3)"
        );
        assert!(ExamError::SubmissionFailed("timeout".into())
            .to_string()
            .contains("timeout"));
    }
}
