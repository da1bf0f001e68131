use std::time::Duration;

use cody_typewriter::ConfigError;
use cody_typewriter::ManualScheduler;
use cody_typewriter::Playback;
use cody_typewriter::PlaybackStrategy;
use cody_typewriter::TypewriterConfig;
use cody_typewriter::TypewriterError;
use cody_typewriter::new_playback;
use pretty_assertions::assert_eq;

use super::recorder::Recorder;

const STRATEGIES: [PlaybackStrategy; 2] = [PlaybackStrategy::Dynamic, PlaybackStrategy::Buffered];

const RESPONSE: &str = "Sure! Here is the function:\n\n```rust\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n```\n\nIt returns the sum: 👍🏽";

/// (delta length in chars, virtual ms to wait before the next delta)
const SCHEDULES: [&[(usize, u64)]; 4] = [
    &[(1, 1)],
    &[(4, 20), (1, 3), (12, 50)],
    &[(40, 0), (2, 700)],
    &[(7, 5), (30, 200), (3, 1)],
];

fn playback(strategy: PlaybackStrategy) -> (Box<dyn Playback>, Recorder, ManualScheduler) {
    let recorder = Recorder::default();
    let scheduler = ManualScheduler::new();
    let playback = new_playback(
        TypewriterConfig::default().with_strategy(strategy),
        recorder.clone(),
        scheduler.clone(),
    )
    .expect("valid config");
    (playback, recorder, scheduler)
}

/// Feeds `RESPONSE` in deltas following `schedule`, cycling it until the text is exhausted.
fn feed(playback: &dyn Playback, scheduler: &ManualScheduler, schedule: &[(usize, u64)]) {
    let chars: Vec<char> = RESPONSE.chars().collect();
    let mut sent = 0;
    for &(len, wait_ms) in schedule.iter().cycle() {
        if sent == chars.len() {
            break;
        }
        sent = (sent + len).min(chars.len());
        let text: String = chars[..sent].iter().collect();
        playback.update(&text).expect("incremental update");
        scheduler.advance(Duration::from_millis(wait_ms));
    }
}

#[test]
fn deliveries_are_growing_prefixes_of_the_final_text() {
    for strategy in STRATEGIES {
        for schedule in SCHEDULES {
            let (playback, recorder, scheduler) = playback(strategy);
            feed(playback.as_ref(), &scheduler, schedule);
            playback.close();
            scheduler.run_until_idle(Duration::from_millis(5), Duration::from_secs(60));

            recorder.transcript().assert_monotonic_prefixes_of(RESPONSE);
            assert_eq!(recorder.transcript().last(), Some(RESPONSE), "{strategy:?}");
            assert_eq!(recorder.transcript().closes, 1, "{strategy:?}");
            assert_eq!(
                playback.finished().try_result(),
                Some(Ok(RESPONSE.to_string())),
                "{strategy:?}"
            );
        }
    }
}

#[test]
fn consumer_is_never_closed_without_close() {
    for strategy in STRATEGIES {
        for schedule in SCHEDULES {
            let (playback, recorder, scheduler) = playback(strategy);
            feed(playback.as_ref(), &scheduler, schedule);
            scheduler.advance(Duration::from_secs(60));

            assert_eq!(recorder.transcript().closes, 0, "{strategy:?}");
            assert!(!playback.finished().is_settled(), "{strategy:?}");

            playback.stop();
            assert_eq!(recorder.transcript().closes, 0, "{strategy:?}");
            assert_eq!(recorder.transcript().last(), Some(RESPONSE), "{strategy:?}");
            assert_eq!(
                playback.finished().try_result(),
                Some(Err(TypewriterError::Stopped)),
                "{strategy:?}"
            );
        }
    }
}

#[test]
fn stop_at_any_point_flushes_known_text() {
    for strategy in STRATEGIES {
        for stop_after_ms in [0, 5, 50, 500, 5000] {
            let (playback, recorder, scheduler) = playback(strategy);
            playback.update("The quick brown fox").expect("update");
            scheduler.advance(Duration::from_millis(stop_after_ms));

            playback.stop();

            recorder.transcript().assert_monotonic_prefixes_of("The quick brown fox");
            assert_eq!(
                recorder.transcript().last(),
                Some("The quick brown fox"),
                "{strategy:?} after {stop_after_ms}ms"
            );
            // Exactly one delivery of the complete text.
            let complete = recorder
                .transcript()
                .updates
                .iter()
                .filter(|update| update.as_str() == "The quick brown fox")
                .count();
            assert_eq!(complete, 1, "{strategy:?} after {stop_after_ms}ms");
        }
    }
}

#[test]
fn usage_errors_are_reported_by_both_strategies() {
    for strategy in STRATEGIES {
        let (playback, _recorder, _scheduler) = playback(strategy);
        playback.update("abc").expect("update");

        let same = playback.update("abc").expect_err("same length");
        assert!(same.is_usage_error(), "{strategy:?}");
        let shorter = playback.update("ab").expect_err("shorter");
        assert!(shorter.is_usage_error(), "{strategy:?}");

        playback.close();
        assert_eq!(playback.update("abcd"), Err(TypewriterError::Closed));
    }
}

#[test]
fn idle_close_settles_without_further_ticks() {
    let (playback, recorder, scheduler) = playback(PlaybackStrategy::Dynamic);
    playback.update("done").expect("update");
    scheduler.advance(Duration::from_secs(60));
    assert_eq!(scheduler.active_timers(), 0);

    playback.close();

    assert_eq!(recorder.transcript().closes, 1);
    assert_eq!(
        playback.finished().try_result(),
        Some(Ok("done".to_string()))
    );
}

#[test]
fn invalid_configs_are_rejected_before_any_timer_starts() {
    for strategy in STRATEGIES {
        for (config, key) in [
            (
                TypewriterConfig {
                    min_chunk_size: 0,
                    ..TypewriterConfig::default()
                },
                "min_chunk_size",
            ),
            (
                TypewriterConfig {
                    min_delay: Duration::ZERO,
                    ..TypewriterConfig::default()
                },
                "min_delay_ms",
            ),
        ] {
            let scheduler = ManualScheduler::new();
            let result = new_playback(
                config.with_strategy(strategy),
                Recorder::default(),
                scheduler.clone(),
            );

            match result {
                Err(ConfigError::InvalidValue { key: rejected, .. }) => {
                    assert_eq!(rejected, key, "{strategy:?}");
                }
                Err(err) => panic!("{strategy:?}: unexpected error {err}"),
                Ok(_) => panic!("{strategy:?}: accepted invalid {key}"),
            }
            assert_eq!(scheduler.active_timers(), 0, "{strategy:?}");
        }
    }
}
