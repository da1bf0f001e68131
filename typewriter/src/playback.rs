use crate::buffered::BufferedTypewriter;
use crate::completion::Completion;
use crate::config::PlaybackStrategy;
use crate::config::TypewriterConfig;
use crate::consumer::IncrementalTextConsumer;
use crate::error::ConfigError;
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::typewriter::Typewriter;

/// Producer-side contract shared by both playback engines.
pub trait Playback {
    /// Supplies the full text produced so far.
    fn update(&self, content: &str) -> Result<()>;

    /// Signals that no further updates will arrive.
    fn close(&self);

    /// Forces immediate termination, flushing any known text.
    fn stop(&self);

    /// Handle to await the final text.
    fn finished(&self) -> Completion;
}

impl Playback for Typewriter {
    fn update(&self, content: &str) -> Result<()> {
        Typewriter::update(self, content)
    }

    fn close(&self) {
        Typewriter::close(self);
    }

    fn stop(&self) {
        Typewriter::stop(self);
    }

    fn finished(&self) -> Completion {
        Typewriter::finished(self)
    }
}

impl Playback for BufferedTypewriter {
    fn update(&self, content: &str) -> Result<()> {
        BufferedTypewriter::update(self, content)
    }

    fn close(&self) {
        BufferedTypewriter::close(self);
    }

    fn stop(&self) {
        BufferedTypewriter::stop(self);
    }

    fn finished(&self) -> Completion {
        BufferedTypewriter::finished(self)
    }
}

/// Builds the engine selected by `config.strategy`.
pub fn new_playback<C, S>(
    config: TypewriterConfig,
    consumer: C,
    scheduler: S,
) -> std::result::Result<Box<dyn Playback>, ConfigError>
where
    C: IncrementalTextConsumer + 'static,
    S: Scheduler + 'static,
{
    let playback: Box<dyn Playback> = match config.strategy {
        PlaybackStrategy::Dynamic => Box::new(Typewriter::new(config, consumer, scheduler)?),
        PlaybackStrategy::Buffered => {
            Box::new(BufferedTypewriter::new(config, consumer, scheduler)?)
        }
    };
    Ok(playback)
}
