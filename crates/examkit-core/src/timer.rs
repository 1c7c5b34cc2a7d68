//! Per-question countdown timer.
//!
//! The engine counts down whole seconds for the active question. Ticks are
//! tagged with a generation number that changes on every `start` and `stop`,
//! so a tick scheduled for a previous question (or a torn-down session) is
//! ignored when it finally arrives.
//!
//! The engine can be driven two ways:
//! - manually, by feeding it [`TimerEngine::current_tick`] (deterministic tests,
//!   external clocks);
//! - in real time, by attaching a channel with [`TimerEngine::with_ticker`]; each
//!   `start` then spawns a tokio interval task owned through a [`TickHandle`].

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Default spacing between ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Shortest accepted tick spacing.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Lifecycle of the countdown for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not counting.
    Idle,
    /// Counting down.
    Running,
    /// Reached zero; stays here until the next `start`.
    Expired,
}

/// One scheduled tick, valid only for the generation it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    generation: u64,
}

impl TimerTick {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale tick, or the timer was not running.
    Ignored,
    /// One second elapsed; seconds left.
    Counting(u32),
    /// The countdown reached zero with this tick.
    Expired,
}

/// Cancellable handle to a scheduled tick task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TickHandle(JoinHandle<()>);

impl TickHandle {
    pub fn cancel(self) {
        // Drop aborts.
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Countdown for a single question at a time.
#[derive(Debug)]
pub struct TimerEngine {
    remaining: u32,
    state: TimerState,
    generation: u64,
    period: Duration,
    ticker: Option<UnboundedSender<TimerTick>>,
    task: Option<TickHandle>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    /// A manually driven timer.
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: TimerState::Idle,
            generation: 0,
            period: DEFAULT_TICK_PERIOD,
            ticker: None,
            task: None,
        }
    }

    /// Deliver real-time ticks to `ticker` every `period` while running.
    ///
    /// Periods below [`MIN_TICK_PERIOD`] are raised to it.
    pub fn with_ticker(mut self, ticker: UnboundedSender<TimerTick>, period: Duration) -> Self {
        self.ticker = Some(ticker);
        self.period = period.max(MIN_TICK_PERIOD);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        self.task.is_some()
    }

    /// The tick that the running countdown currently accepts.
    pub fn current_tick(&self) -> TimerTick {
        TimerTick {
            generation: self.generation,
        }
    }

    /// Reset the countdown to `allotment` seconds and begin counting.
    ///
    /// Any previous countdown is stopped first. An allotment of zero expires
    /// immediately without scheduling anything.
    pub fn start(&mut self, allotment: u32) {
        self.stop();
        self.remaining = allotment;
        if allotment == 0 {
            self.state = TimerState::Expired;
            return;
        }
        self.state = TimerState::Running;
        self.schedule();
    }

    /// Cancel any pending tick. Idempotent; an expired countdown stays expired.
    pub fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        if self.state == TimerState::Running {
            self.state = TimerState::Idle;
        }
    }

    /// Apply one elapsed second.
    pub fn tick(&mut self, tick: TimerTick) -> TickOutcome {
        if tick.generation != self.generation || self.state != TimerState::Running {
            return TickOutcome::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Counting(self.remaining);
        }
        self.state = TimerState::Expired;
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        TickOutcome::Expired
    }

    fn schedule(&mut self) {
        let Some(ticker) = self.ticker.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime available, timer falls back to manual ticks");
            return;
        };

        let tick = self.current_tick();
        let period = self.period;
        let handle = runtime.spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if ticker.send(tick).is_err() {
                    break;
                }
            }
        });
        self.task = Some(TickHandle(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resets_to_allotment() {
        let mut timer = TimerEngine::new();
        timer.start(30);
        assert_eq!(timer.remaining_seconds(), 30);
        assert_eq!(timer.state(), TimerState::Running);
        assert!(!timer.is_scheduled());
    }

    #[test]
    fn counts_down_and_expires() {
        let mut timer = TimerEngine::new();
        timer.start(2);
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Counting(1));
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Expired);
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Ignored);
    }

    #[test]
    fn stale_tick_after_restart_is_ignored() {
        let mut timer = TimerEngine::new();
        timer.start(10);
        let stale = timer.current_tick();
        timer.start(5);
        assert_eq!(timer.tick(stale), TickOutcome::Ignored);
        assert_eq!(timer.remaining_seconds(), 5);
    }

    #[test]
    fn stop_is_idempotent_and_blocks_ticks() {
        let mut timer = TimerEngine::new();
        timer.stop();
        timer.start(10);
        let tick = timer.current_tick();
        timer.stop();
        timer.stop();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.tick(tick), TickOutcome::Ignored);
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Ignored);
        assert_eq!(timer.remaining_seconds(), 10);
    }

    #[test]
    fn zero_allotment_expires_immediately() {
        let mut timer = TimerEngine::new();
        timer.start(0);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Ignored);
    }

    #[test]
    fn ticker_outside_runtime_degrades_to_manual() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timer = TimerEngine::new().with_ticker(tx, DEFAULT_TICK_PERIOD);
        timer.start(3);
        assert!(!timer.is_scheduled());
        assert_eq!(timer.tick(timer.current_tick()), TickOutcome::Counting(2));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_ticks_arrive_each_period() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timer = TimerEngine::new().with_ticker(tx, Duration::from_secs(1));
        timer.start(2);
        assert!(timer.is_scheduled());

        let tick = rx.recv().await.unwrap();
        assert_eq!(timer.tick(tick), TickOutcome::Counting(1));
        let tick = rx.recv().await.unwrap();
        assert_eq!(timer.tick(tick), TickOutcome::Expired);
        assert!(!timer.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_clamped() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timer = TimerEngine::new().with_ticker(tx, Duration::ZERO);
        assert_eq!(timer.period(), MIN_TICK_PERIOD);
        timer.start(2);

        let tick = rx.recv().await.unwrap();
        assert_eq!(timer.tick(tick), TickOutcome::Counting(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_scheduled_task() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timer = TimerEngine::new().with_ticker(tx, Duration::from_secs(1));
        timer.start(5);
        timer.stop();
        assert!(!timer.is_scheduled());

        tokio::time::sleep(Duration::from_secs(3)).await;
        if let Ok(tick) = rx.try_recv() {
            assert_eq!(timer.tick(tick), TickOutcome::Ignored);
        }
    }
}
