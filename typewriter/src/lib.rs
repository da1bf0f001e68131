//! Incremental text playback for streamed assistant responses.
//!
//! A completion API produces text token by token; displaying it verbatim looks
//! jumpy. The engines here sit between that producer and a display consumer
//! and re-time delivery so the text appears to be typed, while never falling
//! behind upstream and always settling a [`Completion`] when the stream closes
//! or is stopped.
//!
//! - [`Typewriter`] adapts its cadence to the backlog on every update.
//! - [`BufferedTypewriter`] queues whole snapshots and drains them at a fixed
//!   cadence.
//!
//! Both are single-threaded and drive their timers through a [`Scheduler`]:
//! [`TokioScheduler`] inside a `tokio::task::LocalSet`, or [`ManualScheduler`]
//! in tests.

mod buffer;
mod buffered;
pub mod cadence;
mod completion;
mod config;
mod consumer;
mod error;
mod playback;
mod pump;
mod scheduler;
mod typewriter;

pub use buffer::TypewriterBuffer;
pub use buffered::BufferedTypewriter;
pub use completion::Completion;
pub use completion::CompletionState;
pub use config::MAX_DELAY;
pub use config::MIN_CHAR_CHUNK_SIZE;
pub use config::MIN_DELAY;
pub use config::PlaybackStrategy;
pub use config::TypewriterConfig;
pub use consumer::FnConsumer;
pub use consumer::IncrementalTextConsumer;
pub use error::ConfigError;
pub use error::Result;
pub use error::TypewriterError;
pub use playback::Playback;
pub use playback::new_playback;
pub use pump::CumulativeText;
pub use pump::pump;
pub use scheduler::ManualScheduler;
pub use scheduler::Scheduler;
pub use scheduler::Tick;
pub use scheduler::TimerHandle;
pub use scheduler::TokioScheduler;
pub use typewriter::Typewriter;
