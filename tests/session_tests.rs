// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the photobooth session
//!
//! All tests run on a paused clock; sleeps advance virtual time instantly.

use photobooth::app::{CoinVisual, SessionEvents};
use photobooth::backends::camera::TestPatternBackend;
use photobooth::backends::feedback::Silent;
use photobooth::pipelines::photo::{CaptureOutcome, RejectReason, StageState, Surface};
use photobooth::{Config, FilterId, Screen, SessionController, SessionState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn test_config(export_dir: Option<&Path>) -> Config {
    let mut config = Config::default();
    config.camera.width = 64;
    config.camera.height = 36;
    config.export.directory = export_dir.map(Path::to_path_buf);
    config
}

fn booth(backend: TestPatternBackend) -> (SessionController, SessionEvents) {
    SessionController::new(&test_config(None), Arc::new(backend), Arc::new(Silent))
}

/// Insert a coin and run the resulting activation to completion
async fn pay(controller: &mut SessionController, events: &mut SessionEvents) {
    assert!(controller.insert_coin());
    let event = events.next().await.expect("payment event");
    controller.handle_event(event).await;
}

fn assert_torn_down(controller: &SessionController) {
    assert_eq!(controller.screen(), Screen::Coin);
    assert_eq!(controller.session().state, SessionState::Idle);
    assert_eq!(controller.session().active_filter, FilterId::None);
    assert!(controller.session().id.is_none());
    assert!(!controller.stage().has_stream());
    assert_eq!(controller.stage().open_tracks(), 0);
    assert!(controller.stage().captured_frame().is_none());
    assert_eq!(controller.coin_visual(), CoinVisual::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_neon_capture_is_tagged_neon() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    assert_eq!(controller.session().state, SessionState::CameraActive);

    assert_eq!(controller.select_filter("neon"), Some(FilterId::Neon));

    let CaptureOutcome::Captured(frame) = controller.capture().await else {
        panic!("capture did not produce a frame");
    };
    assert_eq!(frame.filter(), FilterId::Neon);
    assert_eq!(controller.session().state, SessionState::Captured);
}

#[tokio::test(start_paused = true)]
async fn test_denied_acquisition_returns_to_idle() {
    let (mut controller, mut events) = booth(TestPatternBackend::denied());
    pay(&mut controller, &mut events).await;

    assert_torn_down(&controller);
    assert_eq!(
        controller.alert(),
        Some("Could not access camera. Please ensure camera permissions are granted.")
    );

    // Coins are refused until the alert is acknowledged
    assert!(!controller.insert_coin());
    assert!(controller.dismiss_alert());
    assert!(controller.insert_coin());
}

#[tokio::test(start_paused = true)]
async fn test_retake_restores_live_stream() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;

    let CaptureOutcome::Captured(first) = controller.capture().await else {
        panic!("capture did not produce a frame");
    };

    assert!(controller.retake());
    assert_eq!(controller.stage().state(), StageState::Live);
    assert!(controller.stage().captured_frame().is_none());
    assert!(controller.stage().has_stream());
    assert!(matches!(controller.stage().surface(), Surface::Live { .. }));

    let CaptureOutcome::Captured(second) = controller.capture().await else {
        panic!("second capture did not produce a frame");
    };
    assert!(!Arc::ptr_eq(&first, &second));
    let current = controller.stage().captured_frame().expect("still shown");
    assert!(Arc::ptr_eq(&current, &second));
}

#[tokio::test(start_paused = true)]
async fn test_double_capture_yields_one_frame() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;

    let (first, second) = tokio::join!(controller.capture(), controller.capture());

    let CaptureOutcome::Captured(frame) = first else {
        panic!("first capture did not produce a frame");
    };
    assert!(matches!(
        second,
        CaptureOutcome::Rejected(RejectReason::Busy)
    ));
    let current = controller.stage().captured_frame().expect("still shown");
    assert!(Arc::ptr_eq(&current, &frame));
}

#[tokio::test(start_paused = true)]
async fn test_filter_at_shutter_instant_is_baked() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    controller.select_filter(FilterId::Rainbow);

    let capture = tokio::spawn(controller.capture());

    // Countdown still running: the change lands before the shutter
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(controller.session().state, SessionState::Capturing);
    controller.select_filter(FilterId::Sepia);

    let CaptureOutcome::Captured(frame) = capture.await.expect("capture task") else {
        panic!("capture did not produce a frame");
    };
    assert_eq!(frame.filter(), FilterId::Sepia);

    // Restyling the still leaves the baked tag alone
    controller.select_filter(FilterId::Neon);
    let current = controller.stage().captured_frame().expect("still shown");
    assert_eq!(current.filter(), FilterId::Sepia);
    let Surface::Still { display_filter, .. } = controller.stage().surface() else {
        panic!("expected a still surface");
    };
    assert_eq!(display_filter, FilterId::Neon);
}

#[tokio::test(start_paused = true)]
async fn test_capture_when_not_live_is_noop() {
    let (controller, _events) = booth(TestPatternBackend::new());
    assert!(matches!(
        controller.capture().await,
        CaptureOutcome::Rejected(RejectReason::NotLive)
    ));
    assert_eq!(controller.stage().state(), StageState::Inactive);
    assert!(controller.stage().captured_frame().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_end_session_from_idle() {
    let (mut controller, _events) = booth(TestPatternBackend::new());
    controller.end_session();
    controller.end_session();
    assert_torn_down(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_while_acquiring() {
    let backend = TestPatternBackend::new().with_acquire_delay(Duration::from_millis(500));
    let (mut controller, mut events) = booth(backend);
    assert!(controller.insert_coin());
    let _ = events.next().await.expect("payment event");

    let activation = controller.begin_session().expect("activation");
    let pending = tokio::spawn(activation);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.stage().state(), StageState::Acquiring);

    controller.end_session();
    let result = pending.await.expect("activation task");
    controller.finish_activation(result);

    // The stream that arrived late was released
    assert_torn_down(&controller);
    assert!(controller.alert().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_end_session_while_live() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    controller.select_filter(FilterId::Vintage);
    assert_eq!(controller.stage().open_tracks(), 1);

    controller.end_session();
    assert_torn_down(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_during_countdown() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    controller.select_filter(FilterId::Blur);

    let capture = tokio::spawn(controller.capture());
    tokio::time::sleep(Duration::from_millis(1500)).await;
    controller.end_session();

    assert!(matches!(
        capture.await.expect("capture task"),
        CaptureOutcome::Abandoned
    ));
    assert_torn_down(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_while_showing_still() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    controller.select_filter(FilterId::Contrast);
    assert!(matches!(
        controller.capture().await,
        CaptureOutcome::Captured(_)
    ));

    controller.end_session();
    controller.end_session();
    assert_torn_down(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_second_session_after_reset() {
    let (mut controller, mut events) = booth(TestPatternBackend::new());
    pay(&mut controller, &mut events).await;
    let first_id = controller.session().id;
    controller.end_session();

    pay(&mut controller, &mut events).await;
    assert_eq!(controller.session().state, SessionState::CameraActive);
    assert_ne!(controller.session().id, first_id);
    assert_eq!(controller.stage().open_tracks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_download_writes_baked_photo() {
    let dir = tempfile::tempdir().unwrap();
    let (mut controller, mut events) = SessionController::new(
        &test_config(Some(dir.path())),
        Arc::new(TestPatternBackend::new()),
        Arc::new(Silent),
    );
    pay(&mut controller, &mut events).await;
    controller.select_filter(FilterId::Grayscale);
    let CaptureOutcome::Captured(frame) = controller.capture().await else {
        panic!("capture did not produce a frame");
    };

    let path = controller.download().await.expect("download");
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), frame.dimensions());
    assert_eq!(&saved, frame.image());

    let texts: Vec<_> = controller
        .toasts()
        .visible()
        .into_iter()
        .map(|toast| toast.text)
        .collect();
    assert!(texts.iter().any(|text| text.starts_with("Saved: ")));
}
