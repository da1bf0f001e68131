use std::time::Duration;

use cody_typewriter::ConfigError;
use cody_typewriter::CumulativeText;
use cody_typewriter::ManualScheduler;
use cody_typewriter::PlaybackStrategy;
use cody_typewriter::TypewriterConfig;
use cody_typewriter::new_playback;
use pretty_assertions::assert_eq;

use super::recorder::Recorder;

const BUFFERED_CONFIG: &str = r#"
strategy = "buffered"
min_delay_ms = 10
min_chunk_size = 2
"#;

#[test]
fn toml_config_selects_and_tunes_the_engine() -> anyhow::Result<()> {
    let config = TypewriterConfig::from_toml(BUFFERED_CONFIG)?;
    assert_eq!(config.strategy, PlaybackStrategy::Buffered);
    assert_eq!(config.max_delay, Duration::from_millis(3000));

    let recorder = Recorder::default();
    let scheduler = ManualScheduler::new();
    let playback = new_playback(config, recorder.clone(), scheduler.clone())?;

    let mut text = CumulativeText::new();
    for delta in ["abcd", "", "ef"] {
        if let Some(content) = text.push_delta(delta) {
            playback.update(content)?;
        }
    }
    playback.close();
    scheduler.run_until_idle(Duration::from_millis(10), Duration::from_secs(5));

    // Two graphemes every 10ms, one snapshot at a time.
    assert_eq!(
        recorder.transcript().updates,
        vec!["ab".to_string(), "abcd".to_string(), "abcdef".to_string()]
    );
    assert_eq!(scheduler.now(), Duration::from_millis(40));
    assert_eq!(playback.finished().try_result(), Some(Ok(text.into_string())));
    Ok(())
}

#[test]
fn empty_document_yields_defaults() -> anyhow::Result<()> {
    assert_eq!(TypewriterConfig::from_toml("")?, TypewriterConfig::default());
    Ok(())
}

#[test]
fn invalid_documents_name_the_offending_key() {
    let err = TypewriterConfig::from_toml("max_delay_ms = 2\nmin_delay_ms = 10\n")
        .expect_err("max below min");
    assert!(
        matches!(err, ConfigError::InvalidValue { key: "max_delay_ms", .. }),
        "{err}"
    );

    let err = TypewriterConfig::from_toml("strategy = \"instant\"\n").expect_err("unknown strategy");
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");

    let err = TypewriterConfig::from_toml("max_delay = 100\n").expect_err("unknown key");
    assert!(err.to_string().contains("max_delay"), "{err}");
}
