use super::*;
use crate::audio::mock::MockDevice;
use crate::audio::{AudioThread, PlaybackDevice};
use crate::error::PlaybackError;
use crate::library::{Catalog, Track};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::time::Duration;

fn catalog(names: &[&str]) -> Catalog {
    let tracks = names
        .iter()
        .map(|n| Track::from_location(format!("/music/{n}.mp3")))
        .collect();
    Catalog::new(tracks, None, 1)
}

fn session(seed: u64) -> (PlaybackSession<MockDevice>, MockDevice) {
    let mock = MockDevice::default();
    let session = PlaybackSession::new(mock.clone()).with_rng(StdRng::seed_from_u64(seed));
    (session, mock)
}

#[test]
fn play_loads_starts_and_records_history() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);

    s.play(1, &cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.current_index(), Some(1));
    assert!(s.history().contains(1));
    assert_eq!(mock.calls(), vec!["load /music/b.mp3", "play"]);
}

#[test]
fn play_rejects_out_of_range_index() {
    let cat = catalog(&["a"]);
    let (mut s, mock) = session(1);
    let err = s.play(3, &cat).unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 3, len: 1 }));
    assert!(mock.calls().is_empty());
}

#[test]
fn in_order_auto_advance_wraps_around() {
    let cat = catalog(&["A", "B", "C"]);
    let (mut s, _mock) = session(1);

    s.play(0, &cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.current_index(), Some(0));

    assert_eq!(s.on_track_finished(&cat).unwrap(), Some(1));
    assert_eq!(s.on_track_finished(&cat).unwrap(), Some(2));
    assert_eq!(s.on_track_finished(&cat).unwrap(), Some(0));
    assert_eq!(s.current_index(), Some(0));
    assert_eq!(s.state(), PlaybackState::Playing);
}

#[test]
fn shuffle_visits_every_index_once_per_cycle() {
    let names = ["a", "b", "c", "d", "e", "f", "g"];
    let cat = catalog(&names);
    for seed in 0..25 {
        let (mut s, _mock) = session(seed);
        s.toggle_shuffle();
        s.play(0, &cat).unwrap();

        let mut seen = vec![0];
        for _ in 1..names.len() {
            seen.push(s.next(&cat).unwrap());
        }
        let distinct: HashSet<usize> = seen.iter().copied().collect();
        assert_eq!(distinct.len(), names.len(), "seed {seed}: {seen:?}");

        // A new cycle starts without replaying the track that just ended.
        let last = *seen.last().unwrap();
        let first_of_next_cycle = s.next(&cat).unwrap();
        assert_ne!(first_of_next_cycle, last, "seed {seed}");
        assert_eq!(s.history().len(), 1);
    }
}

#[test]
fn shuffle_on_single_track_always_returns_zero() {
    let cat = catalog(&["only"]);
    let (mut s, _mock) = session(9);
    s.toggle_shuffle();
    for _ in 0..5 {
        assert_eq!(s.next(&cat).unwrap(), 0);
    }
    assert_eq!(s.previous(&cat).unwrap(), 0);
}

#[test]
fn previous_is_literal_predecessor_regardless_of_shuffle() {
    let cat = catalog(&["a", "b", "c", "d", "e"]);
    for shuffle in [false, true] {
        let (mut s, _mock) = session(3);
        if shuffle {
            s.toggle_shuffle();
        }
        s.play(2, &cat).unwrap();
        assert_eq!(s.previous(&cat).unwrap(), 1);
        s.play(0, &cat).unwrap();
        assert_eq!(s.previous(&cat).unwrap(), 4);
    }
}

#[test]
fn repeat_one_replays_current_index() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);
    s.toggle_shuffle();
    s.play(1, &cat).unwrap();
    s.cycle_repeat();
    assert_eq!(s.cycle_repeat(), RepeatMode::One);

    for _ in 0..3 {
        assert_eq!(s.on_track_finished(&cat).unwrap(), Some(1));
    }
    assert_eq!(s.current_index(), Some(1));
    let calls = mock.calls();
    assert_eq!(&calls[calls.len() - 2..], ["load /music/b.mp3", "play"]);
}

#[test]
fn repeat_cycles_off_all_one() {
    assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
    assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
    assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
}

#[test]
fn play_pause_resume_restores_playing_on_same_track() {
    let cat = catalog(&["a", "b"]);
    let (mut s, mock) = session(1);

    s.toggle_play_pause(&cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Playing);
    let index = s.current_index();
    assert_eq!(index, Some(0));

    s.toggle_play_pause(&cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Paused);
    s.toggle_play_pause(&cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.current_index(), index);
    assert_eq!(
        mock.calls(),
        vec!["load /music/a.mp3", "play", "pause", "resume"]
    );
}

#[test]
fn play_pause_after_stop_resumes_same_track() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, _mock) = session(1);
    s.play(2, &cat).unwrap();
    s.stop().unwrap();
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.current_index(), Some(2));

    s.toggle_play_pause(&cat).unwrap();
    assert_eq!(s.current_index(), Some(2));
}

#[test]
fn play_pause_on_empty_catalog_reports_no_tracks() {
    let cat = Catalog::empty(1);
    let (mut s, mock) = session(1);
    let err = s.toggle_play_pause(&cat).unwrap_err();
    assert!(matches!(err, PlaybackError::NoTracks));
    assert_eq!(err.to_string(), "no tracks");
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert!(mock.calls().is_empty());
}

#[test]
fn next_and_previous_on_empty_catalog_are_no_ops() {
    let cat = Catalog::empty(1);
    let (mut s, _mock) = session(1);
    assert!(matches!(s.next(&cat), Err(PlaybackError::NoTracks)));
    assert!(matches!(s.previous(&cat), Err(PlaybackError::NoTracks)));
    assert_eq!(s.on_track_finished(&cat).unwrap(), None);
    assert_eq!(s.state(), PlaybackState::Stopped);
}

#[test]
fn failed_load_leaves_stopped_session_untouched() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);
    mock.fail_load("/music/c.mp3");

    let err = s.play(2, &cat).unwrap_err();
    match &err {
        PlaybackError::Load { track, .. } => assert_eq!(track, "c"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains('c'));
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.current_index(), None);
    assert!(s.history().is_empty());
}

#[test]
fn failed_load_keeps_current_track_playing() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);
    mock.fail_load("/music/c.mp3");
    s.play(0, &cat).unwrap();

    assert!(s.play(2, &cat).is_err());
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.current_index(), Some(0));
    assert_eq!(mock.state().loaded.as_deref(), Some(std::path::Path::new("/music/a.mp3")));
}

#[test]
fn failed_auto_advance_stops_session() {
    let cat = catalog(&["a", "b"]);
    let (mut s, mock) = session(1);
    mock.fail_load("/music/b.mp3");
    s.play(0, &cat).unwrap();

    assert!(s.on_track_finished(&cat).is_err());
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.current_index(), Some(0));
}

#[test]
fn set_volume_clamps_and_applies_fraction() {
    let (mut s, mock) = session(1);
    s.set_volume(150.0).unwrap();
    assert_eq!(s.volume_percent(), 100.0);
    s.set_volume(-5.0).unwrap();
    assert_eq!(s.volume_percent(), 0.0);
    s.set_volume(35.0).unwrap();
    assert!((s.volume() - 0.35).abs() < f32::EPSILON);
    assert_eq!(
        mock.calls(),
        vec!["volume 1.00", "volume 0.00", "volume 0.35"]
    );
    assert_eq!(s.state(), PlaybackState::Stopped);
}

#[test]
fn seek_needs_a_loaded_track_and_keeps_pause() {
    let cat = catalog(&["a"]);
    let (mut s, mock) = session(1);
    assert!(matches!(
        s.seek(Duration::from_secs(3)),
        Err(PlaybackError::NothingLoaded)
    ));

    s.play(0, &cat).unwrap();
    s.pause().unwrap();
    s.seek(Duration::from_secs(30)).unwrap();
    assert_eq!(s.state(), PlaybackState::Paused);
    assert_eq!(mock.state().position, Duration::from_secs(30));
}

#[test]
fn seek_by_clamps_at_track_start() {
    let cat = catalog(&["a"]);
    let (mut s, mock) = session(1);
    s.play(0, &cat).unwrap();
    mock.state().position = Duration::from_secs(3);

    assert_eq!(s.seek_by(-5).unwrap(), Duration::ZERO);
    assert_eq!(s.seek_by(7).unwrap(), Duration::from_secs(7));
}

#[test]
fn previous_restarts_track_past_threshold() {
    let cat = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);
    s.play(1, &cat).unwrap();
    let threshold = Some(Duration::from_secs(3));

    mock.state().position = Duration::from_secs(10);
    assert_eq!(s.previous_or_restart(&cat, threshold).unwrap(), 1);
    assert_eq!(mock.calls().last().map(String::as_str), Some("seek 0"));

    mock.state().position = Duration::from_secs(1);
    assert_eq!(s.previous_or_restart(&cat, threshold).unwrap(), 0);
    assert_eq!(s.previous_or_restart(&cat, None).unwrap(), 2);
}

#[test]
fn session_publishes_events() {
    let cat = catalog(&["a", "b"]);
    let (mut s, _mock) = session(1);
    let rx = s.subscribe();

    s.play(1, &cat).unwrap();
    s.pause().unwrap();
    s.pause().unwrap();
    s.toggle_shuffle();
    s.cycle_repeat();

    let events: Vec<PlayerEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            PlayerEvent::TrackChanged { index: 1 },
            PlayerEvent::StateChanged(PlaybackState::Playing),
            PlayerEvent::StateChanged(PlaybackState::Paused),
            PlayerEvent::ShuffleChanged(true),
            PlayerEvent::RepeatChanged(RepeatMode::All),
        ]
    );
}

#[test]
fn rebind_follows_track_to_new_position() {
    let old = catalog(&["a", "b", "c"]);
    let (mut s, _mock) = session(1);
    s.play(1, &old).unwrap();

    let new = catalog(&["b", "c"]);
    s.rebind(&old, &new);
    assert_eq!(s.current_index(), Some(0));
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn rebind_stops_when_track_disappears() {
    let old = catalog(&["a", "b", "c"]);
    let (mut s, mock) = session(1);
    s.play(1, &old).unwrap();

    let new = catalog(&["c"]);
    s.rebind(&old, &new);
    assert_eq!(s.current_index(), None);
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(mock.calls().last().map(String::as_str), Some("stop"));
}

#[test]
fn policy_edges() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut history = ShuffleHistory::default();
    assert_eq!(next_index(None, 0, true, &mut history, &mut rng), None);
    assert_eq!(next_index(None, 4, false, &mut history, &mut rng), Some(0));
    assert_eq!(next_index(Some(3), 4, false, &mut history, &mut rng), Some(0));
    assert_eq!(previous_index(None, 0), None);
    assert_eq!(previous_index(Some(0), 1), Some(0));
    assert_eq!(initial_index(0, true, &mut rng), None);
    assert_eq!(initial_index(5, false, &mut rng), Some(0));
    assert!(initial_index(5, true, &mut rng).is_some_and(|i| i < 5));
}

#[test]
fn configure_applies_settings() {
    let (mut s, mock) = session(1);
    let settings = crate::config::PlaybackSettings {
        shuffle: true,
        repeat: crate::config::RepeatSetting::One,
        volume: 40,
        ..Default::default()
    };
    s.configure(&settings).unwrap();
    assert!(s.shuffle());
    assert_eq!(s.repeat(), RepeatMode::One);
    assert_eq!(mock.calls(), vec!["volume 0.40"]);
}

#[test]
fn previous_with_nothing_loaded_steps_back_from_before_the_first_track() {
    assert_eq!(previous_index(None, 4), Some(2));
    assert_eq!(previous_index(None, 2), Some(0));
    assert_eq!(previous_index(None, 1), Some(0));

    let (mut s, _) = session(1);
    let cat = catalog(&["a", "b", "c", "d", "e"]);
    assert_eq!(s.previous(&cat).unwrap(), 3);
    assert_eq!(s.current_index(), Some(3));
}

#[test]
fn timed_out_load_leaves_session_and_device_stopped() {
    let cat = catalog(&["a", "b"]);
    let mock = MockDevice::default();
    let device = mock.clone();
    let audio = AudioThread::spawn(
        move || Ok(Box::new(device) as Box<dyn PlaybackDevice>),
        Duration::from_millis(50),
    )
    .unwrap();
    let mut s = PlaybackSession::new(audio);
    s.play(0, &cat).unwrap();

    mock.state().load_delay = Duration::from_millis(150);
    assert!(matches!(s.play(1, &cat), Err(PlaybackError::Load { .. })));
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.current_index(), Some(0));

    std::thread::sleep(Duration::from_millis(300));
    {
        let device = mock.state();
        assert!(!device.playing);
        assert_eq!(device.loaded, None);
    }
    // Nothing is left running that the session cannot reach.
    mock.state().load_delay = Duration::ZERO;
    s.toggle_play_pause(&cat).unwrap();
    assert_eq!(s.state(), PlaybackState::Playing);
}

#[test]
fn track_that_loads_but_will_not_start_stops_the_session() {
    let cat = catalog(&["a", "b"]);
    let (mut s, mock) = session(1);
    s.play(0, &cat).unwrap();

    mock.state().play_fails = true;
    assert!(matches!(s.play(1, &cat), Err(PlaybackError::Load { .. })));
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.current_index(), Some(0));
    assert_eq!(mock.calls().last().map(String::as_str), Some("stop"));
    assert_eq!(mock.state().loaded, None);
}
