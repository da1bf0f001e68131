//! Fixed-rate playback of queued snapshots.
//!
//! [`BufferedTypewriter`] pushes every update onto a [`TypewriterBuffer`] and
//! drains it with a single timer running at `min_delay`. Each tick types one
//! `min_chunk_size` step of the current snapshot; once a snapshot is fully
//! typed the next tick moves on to the next queued one.
//!
//! Progress carries over between snapshots: since every snapshot extends the
//! previous one, typing resumes where the last emitted text ended instead of
//! restarting from the beginning of the new snapshot.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use tokio::sync::watch;
use tracing::debug;
use tracing::trace;

use crate::buffer::TypewriterBuffer;
use crate::cadence::advance;
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

/// Streams queued snapshots to a consumer at a constant cadence.
///
/// Same contract as [`crate::Typewriter`]; the drain timer keeps running while
/// the stream is open so new snapshots are picked up on the next tick.
pub struct BufferedTypewriter {
    state: Rc<RefCell<BufferedState>>,
    scheduler: Rc<dyn Scheduler>,
    finished: Completion,
    drained: watch::Receiver<bool>,
}

struct BufferedState {
    config: TypewriterConfig,
    buffer: TypewriterBuffer,
    /// Most recently enqueued snapshot; the full text known so far.
    latest: String,
    /// Snapshot currently being typed.
    text: String,
    /// Byte offset into `text` delivered so far.
    emitted: usize,
    upstream_closed: bool,
    stopped: bool,
    timer: Option<TimerHandle>,
    consumer: Box<dyn IncrementalTextConsumer>,
    consumer_closed: bool,
    completion: CompletionSender,
    drained: watch::Sender<bool>,
}

impl BufferedTypewriter {
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
        let (drained_tx, drained) = watch::channel(true);
        let state = BufferedState {
            config,
            buffer: TypewriterBuffer::new(),
            latest: String::new(),
            text: String::new(),
            emitted: 0,
            upstream_closed: false,
            stopped: false,
            timer: None,
            consumer: Box::new(consumer),
            consumer_closed: false,
            completion,
            drained: drained_tx,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            scheduler: Rc::new(scheduler),
            finished,
            drained,
        })
    }

    /// Queues the full text produced so far.
    ///
    /// `content` must extend the previously queued snapshot.
    pub fn update(&self, content: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.upstream_closed {
            return Err(TypewriterError::Closed);
        }
        if state.stopped {
            return Err(TypewriterError::Stopped);
        }
        check_incremental(&state.latest, content)?;

        state.latest = content.to_string();
        state.buffer.enqueue(content.to_string());
        state.set_drained(false);
        trace!(queued = state.buffer.len(), "typewriter snapshot queued");

        if state.timer.is_none() {
            let weak = Rc::downgrade(&self.state);
            let handle = self.scheduler.schedule_repeating(
                state.config.min_delay,
                Box::new(move || {
                    let Some(state) = weak.upgrade() else {
                        return ControlFlow::Break(());
                    };
                    let mut state = state.borrow_mut();
                    state.tick()
                }),
            );
            state.timer = Some(handle);
        }
        Ok(())
    }

    /// Signals that no further updates will arrive.
    ///
    /// Completes on the first tick after the queue drains, or immediately if
    /// nothing was ever queued.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        if state.upstream_closed || state.stopped {
            return;
        }
        state.upstream_closed = true;
        debug!(
            queued = state.buffer.len(),
            "buffered typewriter upstream closed"
        );
        if state.timer.is_none() {
            state.finish();
        }
    }

    /// Stops draining, discards queued snapshots and flushes the latest text.
    ///
    /// The completion resolves if upstream already closed and fails with
    /// [`TypewriterError::Stopped`] otherwise.
    pub fn stop(&self) {
        let mut state = self.state.borrow_mut();
        if state.stopped {
            return;
        }
        state.stopped = true;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        state.buffer.clear();
        state.flush();
        state.set_drained(true);
        if state.upstream_closed {
            state.finish();
        } else if state.completion.reject() {
            debug!(
                len = state.latest.len(),
                "buffered typewriter stopped before upstream closed"
            );
        }
    }

    /// Resolves once every queued snapshot has been typed, without closing the stream.
    pub fn wait_for_drain(&self) -> impl Future<Output = ()> + 'static {
        let mut drained = self.drained.clone();
        async move {
            // An error means the typewriter was dropped; nothing is left to wait for.
            let _ = drained.wait_for(|drained| *drained).await;
        }
    }

    pub fn finished(&self) -> Completion {
        self.finished.clone()
    }

    /// Snapshots waiting behind the one currently being typed.
    pub fn queued(&self) -> usize {
        self.state.borrow().buffer.len()
    }

    pub fn is_drained(&self) -> bool {
        *self.drained.borrow()
    }
}

impl BufferedState {
    fn tick(&mut self) -> ControlFlow<()> {
        if self.emitted == self.text.len() {
            let Some(next) = self.buffer.dequeue() else {
                if !self.upstream_closed {
                    return ControlFlow::Continue(());
                }
                self.timer = None;
                self.finish();
                return ControlFlow::Break(());
            };
            self.text = next;
        }

        self.emitted = advance(&self.text, self.emitted, self.config.min_chunk_size);
        trace!(
            emitted = self.emitted,
            len = self.text.len(),
            queued = self.buffer.len(),
            "buffered typewriter tick"
        );
        self.consumer.update(&self.text[..self.emitted]);

        if self.emitted == self.text.len() && self.buffer.is_empty() {
            self.set_drained(true);
        }
        ControlFlow::Continue(())
    }

    fn flush(&mut self) {
        if self.emitted >= self.latest.len() {
            return;
        }
        self.text = self.latest.clone();
        self.emitted = self.text.len();
        self.consumer.update(&self.text);
    }

    fn set_drained(&self, drained: bool) {
        self.drained.send_if_modified(|current| {
            let changed = *current != drained;
            *current = drained;
            changed
        });
    }

    fn finish(&mut self) {
        if !self.consumer_closed {
            self.consumer_closed = true;
            self.consumer.close();
        }
        if self.completion.resolve(&self.latest) {
            debug!(len = self.latest.len(), "buffered typewriter finished");
        }
    }
}
