//! Exam session controller.
//!
//! Owns the question list, the active index, the answer store and the timer,
//! and moves through `Idle -> InProgress -> Submitted`. Every transition is
//! synchronous except `submit` (scoring may be remote) and `load_from`
//! (fetching questions). Both run their I/O before touching any state, so a
//! failure leaves the session exactly as it was.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::answers::AnswerStore;
use crate::error::ExamError;
use crate::model::{Question, QuestionId, QuestionSet};
use crate::scoring::{Evaluator, ExamResult};
use crate::timer::{TickOutcome, TimerEngine, TimerState, TimerTick, DEFAULT_TICK_PERIOD};
use crate::traits::{QuestionRequest, QuestionSource};

/// Who is taking the exam. Passed in explicitly; nothing is read from ambient state.
#[derive(Clone, Default)]
pub struct SessionContext {
    pub user_id: Option<String>,
    /// Bearer token for remote collaborators.
    pub access_token: Option<String>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SessionContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            access_token: None,
        }
    }
}

/// What happens when the last question's countdown runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalExpiryPolicy {
    /// Stop the timer and wait for an explicit submit.
    #[default]
    Wait,
    /// Ask the driver to submit right away.
    AutoSubmit,
}

/// Session behavior knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Entering a question always restarts its full allotment. When `false`,
    /// revisiting resumes the seconds left when the question was last shown.
    pub reset_on_revisit: bool,
    pub final_expiry: FinalExpiryPolicy,
    /// Spacing of real-time ticks when a ticker is attached.
    pub tick_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_on_revisit: true,
            final_expiry: FinalExpiryPolicy::Wait,
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    InProgress,
    Submitted,
}

/// Effect of a timer tick on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    /// Stale or late tick; nothing changed.
    Ignored,
    /// Seconds left on the current question.
    Counted(u32),
    /// The current question expired and the session moved to this index.
    Advanced(usize),
    /// The last question expired; waiting for an explicit submit.
    FinalExpired,
    /// The last question expired and policy asks the driver to submit now.
    SubmitDue,
}

/// Result of a submit attempt.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Some questions are unanswered; call again with acknowledgement to proceed.
    NeedsConfirmation { unanswered: Vec<QuestionId> },
    Submitted(Box<ExamSubmission>),
}

/// Everything frozen at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSubmission {
    pub questions: QuestionSet,
    pub answers: AnswerStore,
    pub result: ExamResult,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

impl ExamSubmission {
    pub fn duration_ms(&self) -> u64 {
        (self.submitted_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

#[derive(Debug)]
struct ActiveExam {
    questions: QuestionSet,
    current: usize,
    answers: AnswerStore,
    hints: Vec<bool>,
    /// Seconds left per question index, kept only when not resetting on revisit.
    saved_remaining: HashMap<usize, u32>,
    started_at: DateTime<Utc>,
}

#[derive(Debug)]
enum SessionState {
    Idle,
    InProgress(ActiveExam),
    Submitted,
}

/// Drives one exam from load to submission.
#[derive(Debug)]
pub struct SessionController {
    context: SessionContext,
    config: SessionConfig,
    evaluator: Evaluator,
    timer: TimerEngine,
    state: SessionState,
}

impl SessionController {
    pub fn new(context: SessionContext, config: SessionConfig, evaluator: Evaluator) -> Self {
        Self {
            context,
            config,
            evaluator,
            timer: TimerEngine::new(),
            state: SessionState::Idle,
        }
    }

    /// Deliver real-time ticks to `ticker`; feed them back through [`Self::on_tick`].
    pub fn with_ticker(mut self, ticker: UnboundedSender<TimerTick>) -> Self {
        self.timer = TimerEngine::new().with_ticker(ticker, self.config.tick_period);
        self
    }

    // -- inspection ---------------------------------------------------------

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::InProgress(_) => SessionPhase::InProgress,
            SessionState::Submitted => SessionPhase::Submitted,
        }
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.active().map(|e| &e.questions)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.active().map(|e| e.current)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.active().map(|e| &e.questions[e.current])
    }

    pub fn is_last_question(&self) -> bool {
        self.active()
            .map(|e| e.questions.is_last(e.current))
            .unwrap_or(false)
    }

    pub fn answers(&self) -> Option<&AnswerStore> {
        self.active().map(|e| &e.answers)
    }

    /// Ids still unanswered, in question order.
    pub fn unanswered(&self) -> Vec<QuestionId> {
        self.active()
            .map(|e| e.answers.unanswered(&e.questions))
            .unwrap_or_default()
    }

    pub fn hint_visible(&self) -> bool {
        self.active().map(|e| e.hints[e.current]).unwrap_or(false)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining_seconds()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    // -- transitions --------------------------------------------------------

    /// Load a question list: `Idle -> InProgress`.
    pub fn load(&mut self, questions: Vec<Question>) -> Result<(), ExamError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(ExamError::AlreadyLoaded);
        }
        let questions = QuestionSet::new(questions)?;
        let count = questions.len();
        let first_allotment = questions[0].time_limit;

        self.state = SessionState::InProgress(ActiveExam {
            hints: vec![false; count],
            questions,
            current: 0,
            answers: AnswerStore::new(),
            saved_remaining: HashMap::new(),
            started_at: Utc::now(),
        });
        self.timer.start(first_allotment);

        tracing::info!(questions = count, "exam loaded");
        Ok(())
    }

    /// Fetch questions from `source` and load them.
    ///
    /// Fetch failures leave the session idle so the caller can retry.
    pub async fn load_from(
        &mut self,
        source: &dyn QuestionSource,
        request: &QuestionRequest,
    ) -> Result<(), ExamError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(ExamError::AlreadyLoaded);
        }
        let questions = source.fetch(request).await.map_err(|err| {
            tracing::warn!(source = source.name(), "fetching questions failed: {err:#}");
            match err.downcast_ref::<ExamError>() {
                Some(exam_error) => exam_error.clone(),
                None => ExamError::SourceUnavailable(format!("{err:#}")),
            }
        })?;
        self.load(questions)
    }

    /// Move to the next question. Returns `false` at the last question.
    pub fn next(&mut self) -> Result<bool, ExamError> {
        let exam = self.active_mut()?;
        if exam.questions.is_last(exam.current) {
            return Ok(false);
        }
        let target = exam.current + 1;
        exam.hints[target] = false;
        self.enter(target);
        Ok(true)
    }

    /// Move to the previous question. Returns `false` at the first question.
    pub fn previous(&mut self) -> Result<bool, ExamError> {
        let exam = self.active_mut()?;
        if exam.current == 0 {
            return Ok(false);
        }
        let target = exam.current - 1;
        self.enter(target);
        Ok(true)
    }

    /// Move to an arbitrary question. Jumping to the current one is a no-op.
    pub fn jump(&mut self, index: usize) -> Result<bool, ExamError> {
        let exam = self.active_mut()?;
        let len = exam.questions.len();
        if index >= len {
            return Err(ExamError::QuestionOutOfRange { index, len });
        }
        if index == exam.current {
            return Ok(false);
        }
        self.enter(index);
        Ok(true)
    }

    /// Flip hint visibility for the current question; returns the new value.
    pub fn toggle_hint(&mut self) -> Result<bool, ExamError> {
        let exam = self.active_mut()?;
        let current = exam.current;
        exam.hints[current] = !exam.hints[current];
        Ok(exam.hints[current])
    }

    /// Record an answer for the current question.
    pub fn answer(&mut self, value: impl Into<String>) -> Result<(), ExamError> {
        let exam = self.active_mut()?;
        let id = exam.questions[exam.current].id.clone();
        exam.answers.set(id, value);
        Ok(())
    }

    /// Record an answer for any question of the session.
    pub fn answer_question(&mut self, id: &str, value: impl Into<String>) -> Result<(), ExamError> {
        let exam = self.active_mut()?;
        let Some(index) = exam.questions.position(id) else {
            return Err(ExamError::UnknownQuestion(id.to_string()));
        };
        let id = exam.questions[index].id.clone();
        exam.answers.set(id, value);
        Ok(())
    }

    /// Apply a tick delivered by the real-time ticker.
    pub fn on_tick(&mut self, tick: TimerTick) -> TickEffect {
        let Some(exam) = self.active() else {
            return TickEffect::Ignored;
        };
        let is_last = exam.questions.is_last(exam.current);
        let current = exam.current;

        match self.timer.tick(tick) {
            TickOutcome::Ignored => TickEffect::Ignored,
            TickOutcome::Counting(remaining) => {
                tracing::trace!(remaining, "tick");
                TickEffect::Counted(remaining)
            }
            TickOutcome::Expired if !is_last => {
                let target = current + 1;
                if let SessionState::InProgress(exam) = &mut self.state {
                    exam.hints[target] = false;
                }
                tracing::debug!(from = current, to = target, "time up, advancing");
                self.enter(target);
                TickEffect::Advanced(target)
            }
            TickOutcome::Expired => {
                tracing::info!("time up on the last question");
                match self.config.final_expiry {
                    FinalExpiryPolicy::Wait => TickEffect::FinalExpired,
                    FinalExpiryPolicy::AutoSubmit => TickEffect::SubmitDue,
                }
            }
        }
    }

    /// Advance the manual clock by one second.
    pub fn tick(&mut self) -> TickEffect {
        let tick = self.timer.current_tick();
        self.on_tick(tick)
    }

    /// Score the answers and finish the session.
    ///
    /// With unanswered questions and no acknowledgement nothing happens and
    /// [`SubmitOutcome::NeedsConfirmation`] is returned. Scoring runs before any
    /// state change; on failure answers, index and timer are untouched.
    pub async fn submit(&mut self, acknowledge_unanswered: bool) -> Result<SubmitOutcome, ExamError> {
        let SessionState::InProgress(exam) = &self.state else {
            return Err(ExamError::NotInProgress);
        };

        let unanswered = exam.answers.unanswered(&exam.questions);
        if !unanswered.is_empty() && !acknowledge_unanswered {
            tracing::info!(
                unanswered = unanswered.len(),
                "submit needs confirmation"
            );
            return Ok(SubmitOutcome::NeedsConfirmation { unanswered });
        }

        let answers = exam.answers.clone();
        let result = self
            .evaluator
            .evaluate(&exam.questions, &answers, self.context.user_id.as_deref())
            .await
            .map_err(|err| {
                tracing::warn!("scoring failed, exam stays open: {err}");
                err
            })?;

        self.timer.stop();
        let SessionState::InProgress(exam) =
            std::mem::replace(&mut self.state, SessionState::Submitted)
        else {
            return Err(ExamError::NotInProgress);
        };

        tracing::info!(
            score = result.score_percent,
            grade = %result.grade,
            status = %result.status,
            "exam submitted"
        );

        Ok(SubmitOutcome::Submitted(Box::new(ExamSubmission {
            questions: exam.questions,
            answers,
            result,
            started_at: exam.started_at,
            submitted_at: Utc::now(),
        })))
    }

    /// Drop the current exam without scoring. Returns `false` if none was active.
    pub fn abandon(&mut self) -> bool {
        self.timer.stop();
        let was_active = matches!(self.state, SessionState::InProgress(_));
        if was_active {
            tracing::info!("exam abandoned");
            self.state = SessionState::Idle;
        }
        was_active
    }

    // -- internals ----------------------------------------------------------

    fn active(&self) -> Option<&ActiveExam> {
        match &self.state {
            SessionState::InProgress(exam) => Some(exam),
            _ => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveExam, ExamError> {
        match &mut self.state {
            SessionState::InProgress(exam) => Ok(exam),
            _ => Err(ExamError::NotInProgress),
        }
    }

    /// Switch to `target`: stop the old countdown, start the new one.
    fn enter(&mut self, target: usize) {
        let SessionState::InProgress(exam) = &mut self.state else {
            return;
        };
        let remaining = self.timer.remaining_seconds();
        self.timer.stop();

        if !self.config.reset_on_revisit {
            exam.saved_remaining.insert(exam.current, remaining);
        }
        let allotment = if self.config.reset_on_revisit {
            exam.questions[target].time_limit
        } else {
            exam.saved_remaining
                .get(&target)
                .copied()
                .unwrap_or(exam.questions[target].time_limit)
        };

        tracing::debug!(from = exam.current, to = target, allotment, "entering question");
        exam.current = target;
        self.timer.start(allotment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use crate::scoring::{Grade, PassStatus};
    use crate::traits::{RemoteScorer, ScoreRequest, ScoreResponse};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn q(id: &str, secs: u32) -> Question {
        Question::new(id, format!("question {id}"), QuestionKind::ShortAnswer)
            .with_time_limit(secs)
            .with_correct_answer(format!("answer {id}"))
    }

    fn session() -> SessionController {
        SessionController::new(
            SessionContext::for_user("student-1"),
            SessionConfig::default(),
            Evaluator::local(),
        )
    }

    fn ticks(session: &mut SessionController, n: usize) -> Vec<TickEffect> {
        (0..n).map(|_| session.tick()).collect()
    }

    #[test]
    fn load_starts_first_question() {
        let mut s = session();
        assert_eq!(s.phase(), SessionPhase::Idle);
        s.load(vec![q("1", 30), q("2", 45)]).unwrap();
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert_eq!(s.current_index(), Some(0));
        assert_eq!(s.remaining_seconds(), 30);
        assert_eq!(s.timer_state(), TimerState::Running);
        assert!(!s.hint_visible());
    }

    #[test]
    fn load_empty_is_rejected_and_stays_idle() {
        let mut s = session();
        assert_eq!(s.load(vec![]).unwrap_err(), ExamError::EmptyQuestionSet);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.timer_state(), TimerState::Idle);
    }

    #[test]
    fn load_twice_is_rejected() {
        let mut s = session();
        s.load(vec![q("1", 30)]).unwrap();
        assert_eq!(s.load(vec![q("2", 30)]).unwrap_err(), ExamError::AlreadyLoaded);
        assert_eq!(s.current_question().unwrap().id.as_str(), "1");
    }

    #[test]
    fn revisit_resets_full_allotment() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 45)]).unwrap();
        ticks(&mut s, 10);
        assert_eq!(s.remaining_seconds(), 20);
        assert!(s.next().unwrap());
        assert_eq!(s.remaining_seconds(), 45);
        assert!(s.previous().unwrap());
        assert_eq!(s.current_index(), Some(0));
        assert_eq!(s.remaining_seconds(), 30);
    }

    #[test]
    fn revisit_resumes_when_configured() {
        let mut s = SessionController::new(
            SessionContext::default(),
            SessionConfig {
                reset_on_revisit: false,
                ..Default::default()
            },
            Evaluator::local(),
        );
        s.load(vec![q("1", 30), q("2", 45)]).unwrap();
        ticks(&mut s, 10);
        s.next().unwrap();
        ticks(&mut s, 5);
        s.previous().unwrap();
        assert_eq!(s.remaining_seconds(), 20);
        s.next().unwrap();
        assert_eq!(s.remaining_seconds(), 40);
    }

    #[test]
    fn navigation_bounds() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        assert!(!s.previous().unwrap());
        assert!(s.next().unwrap());
        assert!(!s.next().unwrap());
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(
            s.jump(5).unwrap_err(),
            ExamError::QuestionOutOfRange { index: 5, len: 2 }
        );
        assert!(s.jump(0).unwrap());
        assert!(!s.jump(0).unwrap());
    }

    #[test]
    fn expiry_auto_advances_once_and_restarts() {
        let mut s = session();
        s.load(vec![q("1", 1), q("2", 5)]).unwrap();
        assert_eq!(s.tick(), TickEffect::Advanced(1));
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.remaining_seconds(), 5);
        assert_eq!(s.timer_state(), TimerState::Running);
        assert_eq!(s.tick(), TickEffect::Counted(4));
        assert_eq!(s.current_index(), Some(1));
    }

    #[test]
    fn final_expiry_stops_and_keeps_index() {
        let mut s = session();
        s.load(vec![q("1", 1), q("2", 2)]).unwrap();
        let effects = ticks(&mut s, 4);
        assert_eq!(
            effects,
            vec![
                TickEffect::Advanced(1),
                TickEffect::Counted(1),
                TickEffect::FinalExpired,
                TickEffect::Ignored
            ]
        );
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.timer_state(), TimerState::Expired);
        assert_eq!(s.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn final_expiry_auto_submit_policy() {
        let mut s = SessionController::new(
            SessionContext::default(),
            SessionConfig {
                final_expiry: FinalExpiryPolicy::AutoSubmit,
                ..Default::default()
            },
            Evaluator::local(),
        );
        s.load(vec![q("1", 1)]).unwrap();
        assert_eq!(s.tick(), TickEffect::SubmitDue);
    }

    #[test]
    fn stale_tick_after_navigation_is_ignored() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        let stale = s.timer.current_tick();
        s.next().unwrap();
        assert_eq!(s.on_tick(stale), TickEffect::Ignored);
        assert_eq!(s.remaining_seconds(), 30);
    }

    #[test]
    fn hints_are_per_question() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        assert!(s.toggle_hint().unwrap());
        assert_eq!(s.remaining_seconds(), 30);
        s.next().unwrap();
        assert!(!s.hint_visible());
        s.previous().unwrap();
        assert!(s.hint_visible());
        assert!(!s.toggle_hint().unwrap());
    }

    #[test]
    fn next_hides_hint_of_entered_question() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        s.next().unwrap();
        s.toggle_hint().unwrap();
        s.previous().unwrap();
        s.next().unwrap();
        assert!(!s.hint_visible());
    }

    #[test]
    fn answers_for_current_and_named_questions() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        s.answer("first").unwrap();
        s.answer_question("2", "second").unwrap();
        assert_eq!(
            s.answer_question("9", "x").unwrap_err(),
            ExamError::UnknownQuestion("9".into())
        );
        let answers = s.answers().unwrap();
        assert_eq!(answers.get("1"), "first");
        assert_eq!(answers.get("2"), "second");
        assert_eq!(answers.count(), 2);
    }

    #[tokio::test]
    async fn submit_with_unanswered_needs_confirmation() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        s.next().unwrap();

        let outcome = s.submit(false).await.unwrap();
        let SubmitOutcome::NeedsConfirmation { unanswered } = outcome else {
            panic!("expected confirmation request");
        };
        assert_eq!(unanswered.len(), 2);
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert_eq!(s.answers().unwrap().count(), 0);
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.timer_state(), TimerState::Running);
    }

    #[tokio::test]
    async fn acknowledged_submit_scores_and_finishes() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        s.answer("Answer 1 ").unwrap();

        let SubmitOutcome::Submitted(submission) = s.submit(true).await.unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(submission.result.correct_count, 1);
        assert_eq!(submission.result.score_percent, 50.0);
        assert_eq!(submission.result.grade, Grade::C);
        assert_eq!(submission.result.status, PassStatus::Passed);
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert_eq!(s.timer_state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn submitted_session_rejects_mutation_and_ignores_ticks() {
        let mut s = session();
        s.load(vec![q("1", 30), q("2", 30)]).unwrap();
        let late = s.timer.current_tick();
        s.submit(true).await.unwrap();

        assert_eq!(s.on_tick(late), TickEffect::Ignored);
        assert_eq!(s.tick(), TickEffect::Ignored);
        assert_eq!(s.next().unwrap_err(), ExamError::NotInProgress);
        assert_eq!(s.answer("x").unwrap_err(), ExamError::NotInProgress);
        assert_eq!(s.toggle_hint().unwrap_err(), ExamError::NotInProgress);
        assert!(matches!(
            s.submit(true).await,
            Err(ExamError::NotInProgress)
        ));
        assert_eq!(s.phase(), SessionPhase::Submitted);
    }

    struct DownScorer;

    #[async_trait]
    impl RemoteScorer for DownScorer {
        fn name(&self) -> &str {
            "down"
        }

        async fn score(&self, _request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
            anyhow::bail!("scoring service unreachable")
        }
    }

    #[tokio::test]
    async fn failed_submit_leaves_state_untouched() {
        let mut s = SessionController::new(
            SessionContext::default(),
            SessionConfig::default(),
            Evaluator::with_remote(Arc::new(DownScorer)),
        );
        s.load(vec![
            Question::new("1", "Explain", QuestionKind::Essay),
            Question::new("2", "Describe", QuestionKind::Essay),
        ])
        .unwrap();
        s.answer("because").unwrap();
        s.next().unwrap();
        s.tick();

        let err = s.submit(true).await.unwrap_err();
        assert!(matches!(err, ExamError::SubmissionFailed(_)));
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.answers().unwrap().get("1"), "because");
        assert_eq!(s.remaining_seconds(), 29);
        assert_eq!(s.timer_state(), TimerState::Running);
    }

    #[test]
    fn abandon_returns_to_idle() {
        let mut s = session();
        assert!(!s.abandon());
        s.load(vec![q("1", 30)]).unwrap();
        assert!(s.abandon());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.timer_state(), TimerState::Idle);
        assert_eq!(s.tick(), TickEffect::Ignored);
        s.load(vec![q("2", 30)]).unwrap();
        assert_eq!(s.current_index(), Some(0));
    }

    #[test]
    fn context_debug_masks_token() {
        let ctx = SessionContext {
            user_id: Some("u".into()),
            access_token: Some("secret-token".into()),
        };
        let debug = format!("{ctx:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("***"));
    }

    #[tokio::test(start_paused = true)]
    async fn real_time_ticker_drives_auto_advance() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut s = session().with_ticker(tx);
        s.load(vec![q("1", 2), q("2", 3)]).unwrap();

        let mut effects = Vec::new();
        while effects.last() != Some(&TickEffect::Advanced(1)) {
            let tick = rx.recv().await.unwrap();
            effects.push(s.on_tick(tick));
        }
        assert_eq!(effects, vec![TickEffect::Counted(1), TickEffect::Advanced(1)]);
        assert_eq!(s.remaining_seconds(), 3);

        let tick = rx.recv().await.unwrap();
        assert_eq!(s.on_tick(tick), TickEffect::Counted(2));
    }
}
