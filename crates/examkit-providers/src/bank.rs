//! File-backed question source.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use examkit_core::model::{Question, QuestionBank};
use examkit_core::parser::parse_question_bank;
use examkit_core::traits::{QuestionRequest, QuestionSource};

/// Serves questions from a TOML question bank.
///
/// The request's type filter and count are applied; topic and subject are
/// informational only since the bank was chosen explicitly.
#[derive(Debug, Clone)]
pub struct BankSource {
    bank: QuestionBank,
}

impl BankSource {
    pub fn new(bank: QuestionBank) -> Self {
        Self { bank }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(parse_question_bank(path)?))
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[async_trait]
impl QuestionSource for BankSource {
    fn name(&self) -> &str {
        "bank"
    }

    async fn fetch(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        if let (Some(wanted), Some(actual)) = (request.difficulty, self.bank.difficulty) {
            if wanted != actual {
                tracing::warn!(
                    bank = %self.bank.id,
                    "bank difficulty is {actual}, requested {wanted}"
                );
            }
        }

        let limit = request.count.map(|c| c as usize).unwrap_or(usize::MAX);
        let questions: Vec<Question> = self
            .bank
            .questions
            .iter()
            .filter(|q| {
                request
                    .question_type
                    .map_or(true, |wanted| q.question_type() == wanted)
            })
            .take(limit)
            .cloned()
            .collect();

        tracing::debug!(bank = %self.bank.id, count = questions.len(), "questions selected");
        Ok(questions)
    }
}
