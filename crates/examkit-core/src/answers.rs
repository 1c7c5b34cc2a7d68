//! Answer store: the user's current response per question.
//!
//! The store is type-agnostic and never validates values; option membership
//! and line shape are input-surface concerns (see [`crate::model::AnswerShape`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId};

/// Mapping from question id to the latest answer.
///
/// An absent key means "unanswered", which is distinct from an empty answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: BTreeMap<QuestionId, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the answer for `id`.
    pub fn set(&mut self, id: QuestionId, value: impl Into<String>) {
        self.entries.insert(id, value.into());
    }

    /// The stored answer, or `""` when unanswered.
    ///
    /// Use [`AnswerStore::lookup`] to tell an empty answer from a missing one.
    pub fn get(&self, id: &str) -> &str {
        self.lookup(id).unwrap_or("")
    }

    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn is_answered(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of distinct questions with an answer.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of `questions` that have no answer, in question order.
    pub fn unanswered(&self, questions: &[Question]) -> Vec<QuestionId> {
        questions
            .iter()
            .filter(|q| !self.is_answered(q.id.as_str()))
            .map(|q| q.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl FromIterator<(QuestionId, String)> for AnswerStore {
    fn from_iter<I: IntoIterator<Item = (QuestionId, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
