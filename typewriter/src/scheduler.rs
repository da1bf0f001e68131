//! Recurring timers for playback engines.
//!
//! Engines only need "repeated, cancellable, reschedulable delayed execution",
//! so they take a [`Scheduler`] instead of touching a timer primitive directly.
//! [`TokioScheduler`] runs ticks on the current `LocalSet`; [`ManualScheduler`]
//! runs them against a virtual clock that tests advance explicitly.
//!
//! Everything here is single-threaded: tick callbacks are `!Send` and never run
//! concurrently with each other or with the code that scheduled them.

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

/// Callback invoked once per period. Returning `Break` ends the timer.
pub type Tick = Box<dyn FnMut() -> ControlFlow<()>>;

pub trait Scheduler {
    /// Runs `tick` every `period`, first after one full period has elapsed.
    fn schedule_repeating(&self, period: Duration, tick: Tick) -> TimerHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule_repeating(&self, period: Duration, tick: Tick) -> TimerHandle {
        (**self).schedule_repeating(period, tick)
    }
}

/// Owns one scheduled timer. Dropping the handle cancels the timer.
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    fn new(cancelled: Rc<Cell<bool>>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    /// Prevents any further ticks. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}

/// Real-time scheduler backed by `tokio::time::interval`.
///
/// Ticks are spawned with [`tokio::task::spawn_local`], so this must be used
/// from inside a [`tokio::task::LocalSet`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut tick: Tick) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let task_cancelled = Rc::clone(&cancelled);
        let task = tokio::task::spawn_local(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if task_cancelled.get() {
                    break;
                }
                if tick().is_break() {
                    break;
                }
            }
        });
        TimerHandle::new(cancelled, Some(task.abort_handle()))
    }
}

/// Virtual-clock scheduler for deterministic tests.
///
/// Time only moves when [`ManualScheduler::advance`] is called. Timers due at
/// the same instant fire in the order they were scheduled.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualClock>>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    timers: Vec<ManualTimer>,
}

struct ManualTimer {
    id: u64,
    period: Duration,
    due: Duration,
    tick: Option<Tick>,
    cancelled: Rc<Cell<bool>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers that are still scheduled.
    pub fn active_timers(&self) -> usize {
        self.inner
            .borrow()
            .timers
            .iter()
            .filter(|timer| !timer.cancelled.get())
            .count()
    }

    /// Moves the clock forward by `by`, firing every tick that falls due on
    /// the way, and returns how many ticks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;
        while let Some((id, due, mut tick)) = self.take_next_due(target) {
            self.inner.borrow_mut().now = due;
            let flow = tick();
            fired += 1;
            let mut clock = self.inner.borrow_mut();
            if let Some(timer) = clock.timers.iter_mut().find(|timer| timer.id == id) {
                if flow.is_break() {
                    timer.cancelled.set(true);
                } else {
                    timer.tick = Some(tick);
                    timer.due = due + timer.period;
                }
            }
            clock.timers.retain(|timer| !timer.cancelled.get());
        }
        let mut clock = self.inner.borrow_mut();
        clock.now = target;
        clock.timers.retain(|timer| !timer.cancelled.get());
        fired
    }

    /// Fires ticks one period at a time until no timers remain or `limit`
    /// elapses. Returns the elapsed virtual time.
    pub fn run_until_idle(&self, step: Duration, limit: Duration) -> Duration {
        let start = self.now();
        while self.active_timers() > 0 && self.now() - start < limit {
            self.advance(step);
        }
        self.now() - start
    }

    fn take_next_due(&self, target: Duration) -> Option<(u64, Duration, Tick)> {
        let mut clock = self.inner.borrow_mut();
        let timer = clock
            .timers
            .iter_mut()
            .filter(|timer| !timer.cancelled.get() && timer.due <= target)
            .min_by_key(|timer| (timer.due, timer.id))?;
        let tick = timer.tick.take()?;
        Some((timer.id, timer.due, tick))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, tick: Tick) -> TimerHandle {
        let mut clock = self.inner.borrow_mut();
        let cancelled = Rc::new(Cell::new(false));
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now + period;
        clock.timers.push(ManualTimer {
            id,
            period,
            due,
            tick: Some(tick),
            cancelled: Rc::clone(&cancelled),
        });
        TimerHandle::new(cancelled, None)
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("active_timers", &self.active_timers())
            .finish()
    }
}
