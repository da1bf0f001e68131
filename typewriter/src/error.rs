use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypewriterError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypewriterError {
    // Usage errors, returned from `update` at the call site.
    #[error("typewriter already closed")]
    Closed,
    #[error("content must be supplied incrementally: held {held} bytes, received {received}")]
    NotIncremental { held: usize, received: usize },
    #[error("content diverges from previously supplied text at byte {at}")]
    Diverged { at: usize },

    // Termination errors, observed through `Completion`.
    #[error("typewriter stopped")]
    Stopped,
    #[error("typewriter dropped before completion")]
    Abandoned,
}

impl TypewriterError {
    /// Whether this error reports a caller mistake rather than how playback ended.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::NotIncremental { .. } | Self::Diverged { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse typewriter config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid typewriter config value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Checks that `content` strictly extends `held`.
pub(crate) fn check_incremental(held: &str, content: &str) -> Result<()> {
    if content.len() <= held.len() {
        return Err(TypewriterError::NotIncremental {
            held: held.len(),
            received: content.len(),
        });
    }
    if !content.starts_with(held) {
        let at = held
            .char_indices()
            .zip(content.chars())
            .find(|((_, a), b)| a != b)
            .map_or(held.len(), |((idx, _), _)| idx);
        return Err(TypewriterError::Diverged { at });
    }
    Ok(())
}
