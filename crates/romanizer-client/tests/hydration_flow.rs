//! Hydration sessions driven end to end through the poll loop.

use std::sync::Arc;
use std::time::Duration;

use romanizer_client::hydration::{
    FINALIZED_MESSAGE, TRANSLATION_TIMEOUT_MESSAGE, VIDEO_TIMEOUT_MESSAGE,
};
use romanizer_client::{
    HydrationReport, HydrationSession, HydrationSettings, HydrationStart, PendingFlags, PollHandle,
    SessionPhase, SlotValue,
};
use romanizer_events::{ContentKind, EventBus, NotificationLevel, SlotStatus};
use romanizer_test_support::assert::{count_kind, drain_events, notifications, single_notification};
use romanizer_test_support::fixtures::{
    ORIGINAL_LYRICS, loading_content, lyrics_only_content, ready_content, status_ok,
    transport_error,
};
use romanizer_test_support::mocks::{ScriptedApi, manual_ticker};

fn settings(max_attempts: u32) -> HydrationSettings {
    HydrationSettings {
        interval: Duration::from_millis(3_000),
        max_attempts,
    }
}

fn polling(start: HydrationStart) -> PollHandle<HydrationReport> {
    match start {
        HydrationStart::Polling(handle) => handle,
        HydrationStart::Settled(report) => panic!("expected polling, got {report:?}"),
    }
}

#[tokio::test]
async fn lyrics_settle_on_second_tick_and_finalize_once() {
    let api = Arc::new(ScriptedApi::new());
    api.push_track_status(Ok(status_ok(loading_content())))
        .push_track_status(Ok(status_ok(ready_content())));
    let events = EventBus::new();
    let mut stream = events.subscribe(None);

    let flags = PendingFlags {
        lyrics: true,
        translation: false,
        video: false,
    };
    let session = HydrationSession::new("42", flags, &ready_content(), settings(30), events);
    let (driver, ticker) = manual_ticker();
    let handle = polling(session.start_with(api.clone(), ticker));
    driver.ticks(4);

    let report = handle.completed().await.expect("loop finished");
    assert_eq!(report.phase, SessionPhase::Finalized);
    assert_eq!(report.attempts, 2);
    assert!(!report.timed_out);
    assert_eq!(api.track_status_calls(), 2);

    let lyrics = report
        .slots
        .iter()
        .find(|slot| slot.kind() == ContentKind::Lyrics)
        .expect("lyrics slot");
    assert_eq!(lyrics.status(), SlotStatus::Ready);
    assert_eq!(lyrics.value(), &SlotValue::Text(ORIGINAL_LYRICS.to_string()));

    let published = drain_events(&mut stream);
    assert_eq!(count_kind(&published, "hydration_finalized"), 1);
    assert_eq!(
        single_notification(&published, NotificationLevel::Info),
        FINALIZED_MESSAGE
    );
}

#[tokio::test]
async fn nothing_pending_never_polls() {
    let api = Arc::new(ScriptedApi::new());
    let session = HydrationSession::new(
        "42",
        PendingFlags::default(),
        &ready_content(),
        settings(30),
        EventBus::new(),
    );
    let (_driver, ticker) = manual_ticker();

    match session.start_with(api.clone(), ticker) {
        HydrationStart::Settled(report) => assert!(report.slots.iter().all(|slot| slot.is_settled())),
        HydrationStart::Polling(_) => panic!("settled session must not poll"),
    }
    assert_eq!(api.track_status_calls(), 0);
}

#[tokio::test]
async fn attempt_budget_times_out_pending_slots() {
    let api = Arc::new(ScriptedApi::new());
    for _ in 0..3 {
        api.push_track_status(Ok(status_ok(lyrics_only_content())));
    }
    let events = EventBus::new();
    let mut stream = events.subscribe(None);
    let flags = PendingFlags {
        lyrics: true,
        translation: true,
        video: true,
    };
    let session = HydrationSession::new("42", flags, &loading_content(), settings(3), events);
    let (driver, ticker) = manual_ticker();
    let handle = polling(session.start_with(api.clone(), ticker));
    driver.ticks(10);

    let report = handle.completed().await.expect("loop finished");
    assert_eq!(report.phase, SessionPhase::Finalized);
    assert_eq!(report.attempts, 3);
    assert!(report.timed_out);
    assert_eq!(api.track_status_calls(), 3);

    for slot in &report.slots {
        match slot.kind() {
            ContentKind::Lyrics | ContentKind::Romanization => {
                assert_eq!(slot.status(), SlotStatus::Ready);
            }
            ContentKind::Translation => {
                assert_eq!(slot.status(), SlotStatus::Failed);
                assert_eq!(
                    slot.value(),
                    &SlotValue::Message(TRANSLATION_TIMEOUT_MESSAGE.to_string())
                );
            }
            ContentKind::Video => {
                assert_eq!(slot.status(), SlotStatus::Failed);
                assert_eq!(
                    slot.value(),
                    &SlotValue::Message(VIDEO_TIMEOUT_MESSAGE.to_string())
                );
            }
        }
    }
    let published = drain_events(&mut stream);
    assert_eq!(count_kind(&published, "hydration_finalized"), 1);
    assert_eq!(count_kind(&published, "slot_settled"), 4);
}

#[tokio::test]
async fn transport_failure_aborts_without_notification() {
    let api = Arc::new(ScriptedApi::new());
    api.push_track_status(Err(transport_error("track.status")));
    let events = EventBus::new();
    let mut stream = events.subscribe(None);
    let session = HydrationSession::new(
        "42",
        PendingFlags {
            lyrics: true,
            translation: false,
            video: false,
        },
        &loading_content(),
        settings(30),
        events,
    );
    let (driver, ticker) = manual_ticker();
    let handle = polling(session.start_with(api.clone(), ticker));
    driver.ticks(3);

    let report = handle.completed().await.expect("loop finished");
    assert_eq!(report.phase, SessionPhase::Aborted);
    assert_eq!(report.attempts, 1);
    assert_eq!(api.track_status_calls(), 1);

    let published = drain_events(&mut stream);
    assert_eq!(count_kind(&published, "hydration_aborted"), 1);
    assert_eq!(count_kind(&published, "hydration_finalized"), 0);
    assert!(notifications(&published, NotificationLevel::Info).is_empty());
}

#[tokio::test]
async fn cancelled_session_stops_before_polling() {
    let api = Arc::new(ScriptedApi::new());
    let session = HydrationSession::new(
        "42",
        PendingFlags {
            lyrics: false,
            translation: true,
            video: false,
        },
        &ready_content(),
        settings(30),
        EventBus::new(),
    );
    let (_driver, ticker) = manual_ticker();
    let handle = polling(session.start_with(api.clone(), ticker));
    handle.cancel();

    let report = handle.completed().await.expect("loop finished");
    assert_eq!(report.phase, SessionPhase::Cancelled);
    assert_eq!(report.attempts, 0);
    assert_eq!(api.track_status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_still_polls_on_the_minimum_period() {
    let api = Arc::new(ScriptedApi::new());
    api.push_track_status(Ok(status_ok(ready_content())));
    let settings = HydrationSettings {
        interval: Duration::ZERO,
        max_attempts: 30,
    };
    let flags = PendingFlags {
        lyrics: true,
        translation: false,
        video: false,
    };
    let session = HydrationSession::new("42", flags, &ready_content(), settings, EventBus::new());

    let report = polling(session.start(api.clone()))
        .completed()
        .await
        .expect("loop finished");
    assert_eq!(report.phase, SessionPhase::Finalized);
    assert_eq!(report.attempts, 1);
    assert_eq!(api.track_status_calls(), 1);
}
