//! Adapters between a completion API's delta stream and a [`Playback`].

use std::fmt::Display;

use futures::Stream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::error::Result;
use crate::playback::Playback;

/// Folds streamed deltas into the cumulative text the engines expect.
#[derive(Clone, Debug, Default)]
pub struct CumulativeText {
    text: String,
}

impl CumulativeText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `delta` and returns the text so far.
    ///
    /// Returns `None` for an empty delta, which would not grow the text.
    pub fn push_delta(&mut self, delta: &str) -> Option<&str> {
        if delta.is_empty() {
            return None;
        }
        self.text.push_str(delta);
        Some(&self.text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Drives `playback` from a stream of text deltas and waits for it to finish.
///
/// The stream ending closes the playback. A stream error or `cancel` firing
/// stops it instead, which flushes the known text and completes with
/// [`crate::TypewriterError::Stopped`] unless upstream had already closed.
pub async fn pump<P, S, E>(playback: &P, deltas: S, cancel: &CancellationToken) -> Result<String>
where
    P: Playback + ?Sized,
    S: Stream<Item = std::result::Result<String, E>>,
    E: Display,
{
    let mut deltas = std::pin::pin!(deltas);
    let mut text = CumulativeText::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(len = text.as_str().len(), "playback cancelled");
                playback.stop();
                break;
            }
            next = deltas.next() => next,
        };
        match next {
            Some(Ok(delta)) => {
                let Some(content) = text.push_delta(&delta) else {
                    continue;
                };
                if let Err(err) = playback.update(content) {
                    warn!(error = %err, "playback rejected update");
                    playback.stop();
                    return Err(err);
                }
            }
            Some(Err(err)) => {
                warn!(error = %err, "upstream stream failed; stopping playback");
                playback.stop();
                break;
            }
            None => {
                playback.close();
                break;
            }
        }
    }

    let finished = playback.finished();
    tokio::select! {
        biased;
        result = finished.wait() => result,
        _ = cancel.cancelled() => {
            playback.stop();
            finished.wait().await
        }
    }
}
