//! Delivery cadence for the dynamic-rate typewriter.
//!
//! The delay between steps is `max_delay / remaining`, so the more text is
//! queued the faster it plays. The delay never drops below `min_delay`; when
//! the computed delay would, each step delivers more graphemes instead so the
//! playback still keeps up with the upstream rate.
//!
//! All lengths here count extended grapheme clusters, and all offsets are byte
//! offsets into the text that land on grapheme boundaries.

use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::TypewriterConfig;

/// How one timer run delivers the current backlog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryPlan {
    /// Period of the recurring timer.
    pub delay: Duration,
    /// Graphemes delivered per tick.
    pub step: usize,
}

impl DeliveryPlan {
    /// Computes the plan for `remaining` undelivered graphemes.
    pub fn for_backlog(config: &TypewriterConfig, remaining: usize) -> Self {
        let remaining = u32::try_from(remaining.max(1)).unwrap_or(u32::MAX);
        let calculated = config.max_delay / remaining;
        if calculated < config.min_delay {
            let step = if calculated.is_zero() {
                usize::MAX
            } else {
                let ratio = (config.min_delay.as_secs_f64() / calculated.as_secs_f64()).round();
                if ratio >= usize::MAX as f64 {
                    usize::MAX
                } else {
                    ratio as usize
                }
            };
            Self {
                delay: config.min_delay,
                step: step.max(config.min_chunk_size),
            }
        } else {
            Self {
                delay: calculated,
                step: config.min_chunk_size,
            }
        }
    }
}

/// Number of graphemes in `text` after byte offset `from`.
pub(crate) fn remaining_graphemes(text: &str, from: usize) -> usize {
    text[from..].graphemes(true).count()
}

/// Byte offset reached by advancing `step` graphemes from `from`, clamped to the end.
pub(crate) fn advance(text: &str, from: usize, step: usize) -> usize {
    text[from..]
        .grapheme_indices(true)
        .nth(step)
        .map_or(text.len(), |(idx, _)| from + idx)
}
