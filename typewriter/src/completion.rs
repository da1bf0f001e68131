//! Single-assignment completion signal shared by both playback engines.
//!
//! The engine owns the [`CompletionSender`]; callers hold cloneable
//! [`Completion`] handles. The first settlement wins and later attempts are
//! ignored.

use tokio::sync::watch;

use crate::error::Result;
use crate::error::TypewriterError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompletionState {
    #[default]
    Pending,
    /// Playback delivered everything after upstream closed.
    Finished(String),
    /// Playback was stopped before upstream closed.
    Stopped,
}

impl CompletionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    fn to_result(&self) -> Option<Result<String>> {
        match self {
            Self::Pending => None,
            Self::Finished(text) => Some(Ok(text.clone())),
            Self::Stopped => Some(Err(TypewriterError::Stopped)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct CompletionSender {
    tx: watch::Sender<CompletionState>,
}

impl CompletionSender {
    pub(crate) fn new() -> (Self, Completion) {
        let (tx, rx) = watch::channel(CompletionState::Pending);
        (Self { tx }, Completion { rx })
    }

    /// Returns `false` if the completion was already settled.
    pub(crate) fn resolve(&self, text: &str) -> bool {
        self.settle(CompletionState::Finished(text.to_string()))
    }

    /// Returns `false` if the completion was already settled.
    pub(crate) fn reject(&self) -> bool {
        self.settle(CompletionState::Stopped)
    }

    fn settle(&self, outcome: CompletionState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_pending() {
                *state = outcome;
                true
            } else {
                false
            }
        })
    }
}

/// Awaitable view of how a playback ended.
#[derive(Clone, Debug)]
pub struct Completion {
    rx: watch::Receiver<CompletionState>,
}

impl Completion {
    pub fn state(&self) -> CompletionState {
        self.rx.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        !self.rx.borrow().is_pending()
    }

    /// Returns the outcome if already settled, without waiting.
    pub fn try_result(&self) -> Option<Result<String>> {
        self.rx.borrow().to_result()
    }

    /// Waits for the playback to settle.
    ///
    /// Resolves with the final text, or fails with [`TypewriterError::Stopped`]
    /// if playback was stopped before upstream closed. If the engine is dropped
    /// while still pending this fails with [`TypewriterError::Abandoned`].
    pub async fn wait(&self) -> Result<String> {
        let mut rx = self.rx.clone();
        match rx.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.to_result().unwrap_or(Err(TypewriterError::Abandoned)),
            Err(_) => Err(TypewriterError::Abandoned),
        }
    }
}
