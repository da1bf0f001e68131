//! Dynamic-rate playback.
//!
//! [`Typewriter`] re-times cumulative upstream text so it appears to be typed.
//! Every [`Typewriter::update`] replaces the running timer with one whose
//! cadence is derived from the current backlog (see [`crate::cadence`]), so
//! playback speeds up when a burst arrives and never falls behind upstream.
//!
//! Completion is signalled only once upstream has closed and the backlog has
//! drained, or immediately by [`Typewriter::stop`].

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use tracing::debug;
use tracing::trace;

use crate::cadence::DeliveryPlan;
use crate::cadence::advance;
use crate::cadence::remaining_graphemes;
use crate::completion::Completion;
use crate::completion::CompletionSender;
use crate::config::TypewriterConfig;
use crate::error::ConfigError;
use crate::consumer::IncrementalTextConsumer;
use crate::error::Result;
use crate::error::TypewriterError;
use crate::error::check_incremental;
use crate::scheduler::Scheduler;
use crate::scheduler::TimerHandle;

/// Streams cumulative text to a consumer at a typing-like, self-regulating pace.
///
/// Single-threaded: the timer callback and the public methods share state
/// through `Rc<RefCell<_>>`. The consumer must not call back into the
/// typewriter that is driving it.
pub struct Typewriter {
    state: Rc<RefCell<PlaybackState>>,
    scheduler: Rc<dyn Scheduler>,
    finished: Completion,
}

struct PlaybackState {
    config: TypewriterConfig,
    text: String,
    /// Byte offset into `text`, always on a grapheme boundary.
    emitted: usize,
    upstream_closed: bool,
    stopped: bool,
    timer: Option<TimerHandle>,
    consumer: Box<dyn IncrementalTextConsumer>,
    consumer_closed: bool,
    completion: CompletionSender,
}

impl Typewriter {
    /// Fails if `config` does not pass [`TypewriterConfig::validate`].
    pub fn new<C, S>(
        config: TypewriterConfig,
        consumer: C,
        scheduler: S,
    ) -> std::result::Result<Self, ConfigError>
    where
        C: IncrementalTextConsumer + 'static,
        S: Scheduler + 'static,
    {
        config.validate()?;
        let (completion, finished) = CompletionSender::new();
        let state = PlaybackState {
            config,
            text: String::new(),
            emitted: 0,
            upstream_closed: false,
            stopped: false,
            timer: None,
            consumer: Box::new(consumer),
            consumer_closed: false,
            completion,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            scheduler: Rc::new(scheduler),
            finished,
        })
    }

    /// Supplies the full text produced so far.
    ///
    /// `content` must extend the previously supplied text. Fails without
    /// touching any state if the typewriter was closed or stopped, or if the
    /// content is not a strict extension.
    pub fn update(&self, content: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.upstream_closed {
            return Err(TypewriterError::Closed);
        }
        if state.stopped {
            return Err(TypewriterError::Stopped);
        }
        check_incremental(&state.text, content)?;

        let held = state.text.len();
        state.text.push_str(&content[held..]);
        state.cancel_timer();

        let remaining = remaining_graphemes(&state.text, state.emitted);
        let plan = DeliveryPlan::for_backlog(&state.config, remaining);
        debug!(
            remaining,
            delay_us = u64::try_from(plan.delay.as_micros()).unwrap_or(u64::MAX),
            step = plan.step,
            "typewriter delivery plan"
        );

        let weak = Rc::downgrade(&self.state);
        let handle = self.scheduler.schedule_repeating(
            plan.delay,
            Box::new(move || {
                let Some(state) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                let mut state = state.borrow_mut();
                state.tick(plan.step)
            }),
        );
        state.timer = Some(handle);
        Ok(())
    }

    /// Signals that no further updates will arrive.
    ///
    /// Completes immediately when nothing is left to type; otherwise the
    /// running timer completes once the backlog drains.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        if state.upstream_closed || state.stopped {
            return;
        }
        state.upstream_closed = true;
        debug!(
            len = state.text.len(),
            emitted = state.emitted,
            "typewriter upstream closed"
        );
        if state.timer.is_none() && state.is_drained() {
            state.finish();
        }
    }

    /// Stops typing and flushes whatever text is known.
    ///
    /// The completion resolves if upstream already closed and fails with
    /// [`TypewriterError::Stopped`] otherwise.
    pub fn stop(&self) {
        let mut state = self.state.borrow_mut();
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.cancel_timer();
        state.flush();
        if state.upstream_closed {
            state.finish();
        } else if state.completion.reject() {
            debug!(len = state.text.len(), "typewriter stopped before upstream closed");
        }
    }

    /// Handle to await the final text.
    pub fn finished(&self) -> Completion {
        self.finished.clone()
    }

    /// Graphemes known but not yet delivered to the consumer.
    pub fn backlog(&self) -> usize {
        let state = self.state.borrow();
        remaining_graphemes(&state.text, state.emitted)
    }
}

impl PlaybackState {
    fn is_drained(&self) -> bool {
        self.emitted == self.text.len()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn tick(&mut self, step: usize) -> ControlFlow<()> {
        self.emitted = advance(&self.text, self.emitted, step);
        trace!(
            emitted = self.emitted,
            len = self.text.len(),
            step,
            "typewriter tick"
        );
        self.consumer.update(&self.text[..self.emitted]);

        if !self.is_drained() {
            return ControlFlow::Continue(());
        }
        self.timer = None;
        if self.upstream_closed {
            self.finish();
        }
        ControlFlow::Break(())
    }

    fn flush(&mut self) {
        if self.is_drained() {
            return;
        }
        self.emitted = self.text.len();
        self.consumer.update(&self.text);
    }

    fn finish(&mut self) {
        if !self.consumer_closed {
            self.consumer_closed = true;
            self.consumer.close();
        }
        if self.completion.resolve(&self.text) {
            debug!(len = self.text.len(), "typewriter finished");
        }
    }
}
