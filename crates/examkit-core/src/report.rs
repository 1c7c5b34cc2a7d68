//! Exam report types with JSON persistence and history summaries.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{QuestionId, QuestionType};
use crate::scoring::{ExamResult, Grade, PassStatus, Verdict};
use crate::session::ExamSubmission;

/// A saved exam: what was asked, what was answered and how it scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the exam was submitted.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Topic or bank name the questions came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Wall-clock time from load to submit, in milliseconds.
    pub duration_ms: u64,
    pub result: ExamResult,
    /// One entry per question, in exam order.
    pub questions: Vec<QuestionReview>,
}

/// Review line for a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReview {
    pub id: QuestionId,
    pub prompt: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// `None` when the question was left unanswered.
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub verdict: Verdict,
}

impl ExamReport {
    /// Build a report from a finished session.
    pub fn from_submission(
        submission: &ExamSubmission,
        user_id: Option<String>,
        topic: Option<String>,
    ) -> Self {
        let questions = submission
            .questions
            .iter()
            .map(|q| QuestionReview {
                id: q.id.clone(),
                prompt: q.prompt.clone(),
                question_type: q.question_type(),
                options: q.options().into_iter().map(str::to_string).collect(),
                user_answer: submission.answers.lookup(q.id.as_str()).map(str::to_string),
                correct_answer: q.correct_answer.clone(),
                verdict: submission
                    .result
                    .verdict(q.id.as_str())
                    .unwrap_or(Verdict::Incorrect),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: submission.submitted_at,
            user_id,
            topic,
            duration_ms: submission.duration_ms(),
            result: submission.result.clone(),
            questions,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file name for this report inside a results directory.
    pub fn file_name(&self) -> String {
        format!(
            "exam-{}-{}.json",
            self.created_at.format("%Y%m%d-%H%M%S"),
            &self.id.simple().to_string()[..8]
        )
    }

    /// Number of questions left unanswered.
    pub fn unanswered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.user_answer.is_none())
            .count()
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## Exam {}\n\n",
            self.topic.as_deref().unwrap_or("results")
        ));
        md.push_str(&format!(
            "**Score:** {:.1}% ({}/{}) | **Grade:** {} | **Status:** {}\n\n",
            self.result.score_percent,
            self.result.correct_count,
            self.result.total_questions,
            self.result.grade,
            self.result.status
        ));
        md.push_str(&format!(
            "Taken {} in {:.1}s\n\n",
            self.created_at.format("%Y-%m-%d %H:%M UTC"),
            self.duration_ms as f64 / 1000.0
        ));

        md.push_str("| # | Question | Your answer | Correct answer | Verdict |\n");
        md.push_str("|---|----------|-------------|----------------|---------|\n");
        for (i, q) in self.questions.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                md_cell(&q.prompt),
                q.user_answer.as_deref().map(md_cell).unwrap_or_else(|| "_unanswered_".into()),
                q.correct_answer.as_deref().map(md_cell).unwrap_or_else(|| "-".into()),
                q.verdict
            ));
        }

        md
    }
}

fn md_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Load every `.json` report in a directory, oldest first.
///
/// Unreadable files are skipped with a warning.
pub fn load_report_directory(dir: &Path) -> Result<Vec<ExamReport>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            match ExamReport::load_json(&path) {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }

    reports.sort_by_key(|r| r.created_at);
    Ok(reports)
}

/// Aggregate view over past exams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub exams: usize,
    pub passed: usize,
    pub failed: usize,
    /// Mean score across all exams, in percent.
    pub average_score: f64,
    pub best_score: f64,
    pub grade_counts: BTreeMap<Grade, usize>,
    /// Score change from the second-latest to the latest exam.
    pub trend: Option<f64>,
    pub latest: Option<DateTime<Utc>>,
}

impl HistorySummary {
    /// Summarize reports sorted oldest first.
    pub fn from_reports(reports: &[ExamReport]) -> Self {
        let scores: Vec<f64> = reports.iter().map(|r| r.result.score_percent).collect();
        let passed = reports
            .iter()
            .filter(|r| r.result.status == PassStatus::Passed)
            .count();

        let mut grade_counts = BTreeMap::new();
        for r in reports {
            *grade_counts.entry(r.result.grade).or_insert(0) += 1;
        }

        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let trend = match scores.as_slice() {
            [.., previous, latest] => Some(latest - previous),
            _ => None,
        };

        Self {
            exams: reports.len(),
            passed,
            failed: reports.len() - passed,
            average_score,
            best_score: scores.iter().copied().fold(0.0, f64::max),
            grade_counts,
            trend,
            latest: reports.iter().map(|r| r.created_at).max(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.exams == 0 {
            0.0
        } else {
            self.passed as f64 / self.exams as f64
        }
    }
}
