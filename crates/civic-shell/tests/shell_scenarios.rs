//! Shell Scenario Tests
//!
//! End-to-end flows through the public [`ShellController`] API, driven by
//! the deterministic doubles in `civic_shell::testing`.
//!
//! ## Scenarios Covered
//!
//! 1. **Routing**: registered views get the active profile, unknown modules
//!    fall back to the placeholder
//! 2. **Identity switching**: immediate `Switching`, completion after the
//!    latency window, single flight
//! 3. **Camera**: capture, denial, release while the request is pending
//! 4. **Upload**: works in every camera state
//! 5. **Service trigger**: last open wins, close keeps the payload

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use civic_shell::capture::AcquireOutcome;
use civic_shell::effects::{CameraError, UploadedFile, VideoFrame};
use civic_shell::identity::{CitizenProfile, ProfileId, SwitchOutcome, SwitchPhase};
use civic_shell::router::{Rendered, Screen, DEFAULT_FALLBACK_MESSAGE};
use civic_shell::shell::{ShellController, ShellEffects};
use civic_shell::testing::{
    FakeCaptureResource, GatedCamera, ManualScheduler, MemoryFileReader, RecordingView,
    ScriptedCamera,
};
use civic_shell::trigger::ServiceKind;
use civic_shell::views::ViewRegistry;
use civic_shell::{CaptureState, ShellConfig};

const LATENCY: Duration = Duration::from_millis(1500);

fn two_citizen_config() -> ShellConfig {
    ShellConfig {
        roster: vec![
            CitizenProfile::new("a", "Ayu", "Warga", "ayu"),
            CitizenProfile::new("b", "Bima", "Ketua RT", "bima"),
        ],
        ..ShellConfig::default()
    }
}

struct Fixture {
    shell: ShellController,
    scheduler: ManualScheduler,
    camera: Arc<ScriptedCamera>,
}

fn fixture(registry: ViewRegistry) -> Fixture {
    let scheduler = ManualScheduler::new();
    let camera = Arc::new(ScriptedCamera::new());
    let effects = ShellEffects::new(
        camera.clone(),
        Arc::new(MemoryFileReader::new()),
        Arc::new(scheduler.clone()),
    );
    let shell = ShellController::new(two_citizen_config(), registry, effects).unwrap();
    Fixture {
        shell,
        scheduler,
        camera,
    }
}

fn jpeg() -> VideoFrame {
    VideoFrame::new(640, 480, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43])
}

#[test]
fn routing_renders_registered_view_with_active_profile() {
    let dashboard = RecordingView::new();
    let mut registry = ViewRegistry::new();
    registry.register(Screen::Dashboard, dashboard.clone());
    let f = fixture(registry);

    f.shell.set_view(Screen::Dashboard);
    let rendered = f.shell.render_active();
    assert_matches!(rendered, Rendered::View(ref content) if content.screen == Screen::Dashboard);

    let record = dashboard.last().unwrap();
    assert_eq!(record.profile, Some("a".into()));
    assert!(record.had_navigate);
    assert!(!record.had_service);
}

#[test]
fn routing_unregistered_screen_falls_back() {
    let f = fixture(ViewRegistry::new());
    for screen in Screen::all() {
        f.shell.set_view(*screen);
        match f.shell.render_active() {
            Rendered::Fallback(placeholder) => {
                assert_eq!(placeholder.screen, *screen);
                assert_eq!(placeholder.message, DEFAULT_FALLBACK_MESSAGE);
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
    }
}

#[test]
fn switching_to_active_profile_is_a_noop() {
    let f = fixture(ViewRegistry::new());
    let a = f.shell.active_profile();
    assert_eq!(f.shell.switch_to(a.clone()), SwitchOutcome::AlreadyActive);
    assert_eq!(f.shell.switch_phase(), SwitchPhase::Idle);
    assert_eq!(f.shell.active_profile(), a);
    assert_eq!(f.scheduler.pending_count(), 0);
}

#[test]
fn roster_scenario_switch_a_to_b() {
    let f = fixture(ViewRegistry::new());
    let b = f.shell.roster().get(&"b".into()).unwrap().clone();

    assert_matches!(f.shell.switch_to(b), SwitchOutcome::Started(_));
    assert_eq!(f.shell.switch_phase(), SwitchPhase::Switching);
    assert_eq!(f.shell.active_profile().id.as_str(), "a");

    f.scheduler.advance(LATENCY);
    assert_eq!(f.shell.switch_phase(), SwitchPhase::Idle);
    assert_eq!(f.shell.active_profile().id.as_str(), "b");
}

#[test]
fn second_switch_during_switching_is_dropped() {
    let config = ShellConfig {
        roster: vec![
            CitizenProfile::new("a", "Ayu", "Warga", "ayu"),
            CitizenProfile::new("b", "Bima", "Ketua RT", "bima"),
            CitizenProfile::new("c", "Citra", "Kader", "citra"),
        ],
        ..ShellConfig::default()
    };
    let scheduler = ManualScheduler::new();
    let effects = ShellEffects::new(
        Arc::new(ScriptedCamera::new()),
        Arc::new(MemoryFileReader::new()),
        Arc::new(scheduler.clone()),
    );
    let shell = ShellController::new(config, ViewRegistry::new(), effects).unwrap();

    shell.switch_to_id(&"b".into()).unwrap();
    scheduler.advance(Duration::from_millis(700));
    assert_eq!(
        shell.switch_to_id(&"c".into()).unwrap(),
        SwitchOutcome::InFlight
    );
    assert_eq!(scheduler.pending_count(), 1);

    scheduler.run_all();
    assert_eq!(shell.active_profile().id.as_str(), "b");
    assert_eq!(shell.switch_phase(), SwitchPhase::Idle);
}

#[test]
fn views_see_new_profile_after_switch() {
    let parking = RecordingView::new();
    let mut registry = ViewRegistry::new();
    registry.register(Screen::Parking, parking.clone());
    let f = fixture(registry);

    f.shell.switch_to_id(&"b".into()).unwrap();
    f.shell.render_active();
    f.scheduler.advance(LATENCY);
    f.shell.render_active();

    let seen: Vec<_> = parking
        .renders()
        .into_iter()
        .map(|r| r.profile.unwrap())
        .collect();
    assert_eq!(seen, vec![ProfileId::from("a"), ProfileId::from("b")]);
}

#[tokio::test]
async fn camera_capture_sets_photo_and_closes() {
    let f = fixture(ViewRegistry::new());
    let resource = FakeCaptureResource::new(2, jpeg());
    let tracks = resource.probe();
    f.camera.push_grant(resource);

    assert_eq!(f.shell.open_camera().await.unwrap(), AcquireOutcome::Streaming);
    assert_eq!(f.shell.camera_state(), CaptureState::Streaming);

    let payload = f.shell.capture_photo().unwrap();
    assert!(!payload.as_str().is_empty());
    assert_eq!(payload.decode(), jpeg().data);
    assert_eq!(f.shell.active_profile().photo, Some(payload));
    assert_eq!(f.shell.camera_state(), CaptureState::Closed);
    assert_eq!(tracks.live_tracks(), 0);
}

#[tokio::test]
async fn camera_denial_leaves_photo_unchanged() {
    let f = fixture(ViewRegistry::new());
    f.camera.push_denial(CameraError::Denied);

    assert_eq!(
        f.shell.open_camera().await.unwrap(),
        AcquireOutcome::Denied(CameraError::Denied)
    );
    assert_eq!(f.shell.camera_state(), CaptureState::Closed);
    assert!(f.shell.active_profile().photo.is_none());
    assert_eq!(f.shell.notices().len(), 1);

    // Retry after denial is allowed.
    f.camera.push_grant(FakeCaptureResource::new(1, jpeg()));
    assert_eq!(f.shell.open_camera().await.unwrap(), AcquireOutcome::Streaming);
    assert_eq!(f.camera.request_count(), 2);
}

#[tokio::test]
async fn capture_rejected_unless_streaming() {
    let f = fixture(ViewRegistry::new());
    let err = f.shell.capture_photo().unwrap_err();
    assert_eq!(err.code(), "CAMERA_STATE");
    assert!(f.shell.notices().is_empty());
}

#[tokio::test]
async fn release_while_requesting_stops_late_grant() {
    let (camera, gate) = GatedCamera::pair();
    let effects = ShellEffects::new(
        Arc::new(camera),
        Arc::new(MemoryFileReader::new()),
        Arc::new(ManualScheduler::new()),
    );
    let shell = ShellController::new(two_citizen_config(), ViewRegistry::new(), effects).unwrap();

    let opener = {
        let shell = shell.clone();
        tokio::spawn(async move { shell.open_camera().await })
    };
    while shell.camera_state() != CaptureState::Requesting {
        tokio::task::yield_now().await;
    }

    assert!(shell.close_camera());
    let resource = FakeCaptureResource::new(1, jpeg());
    let tracks = resource.probe();
    assert!(gate.grant(resource));

    let outcome = opener.await.unwrap().unwrap();
    assert_eq!(outcome, AcquireOutcome::Cancelled);
    assert_eq!(shell.camera_state(), CaptureState::Closed);
    assert_eq!(tracks.live_tracks(), 0);
}

#[tokio::test]
async fn upload_works_in_every_camera_state() {
    let f = fixture(ViewRegistry::new());
    let png = UploadedFile::new(
        "me.png",
        Some("image/png"),
        vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1],
    );

    let closed = f.shell.ingest_file(Some(&png)).unwrap();
    assert_eq!(closed.decode(), png.bytes);

    f.camera.push_grant(FakeCaptureResource::new(1, jpeg()));
    f.shell.open_camera().await.unwrap();
    let other = UploadedFile::new("other.bin", None, vec![1, 2, 3]);
    let streaming = f.shell.ingest_file(Some(&other)).unwrap();
    assert_eq!(streaming.media_type(), "application/octet-stream");
    assert_eq!(f.shell.active_profile().photo, Some(streaming));
    assert_eq!(f.shell.camera_state(), CaptureState::Streaming);

    assert_eq!(f.shell.ingest_file(None), None);
}

#[test]
fn service_trigger_last_open_wins_and_close_keeps_payload() {
    let f = fixture(ViewRegistry::new());
    f.shell.open_service(Some(ServiceKind::Trash), "organic");
    f.shell.open_service(Some(ServiceKind::Trash), "plastic");
    let trigger = f.shell.service_trigger();
    assert!(trigger.open);
    assert_eq!(trigger.note, "plastic");

    f.shell.open_service(Some(ServiceKind::Package), "pickup at 5pm");
    f.shell.close_service();
    let trigger = f.shell.service_trigger();
    assert!(!trigger.open);
    assert_eq!(trigger.service_kind, Some(ServiceKind::Package));
    assert_eq!(trigger.note, "pickup at 5pm");

    let frame = f.shell.frame();
    assert!(!frame.service_dialog.open);
    assert_eq!(frame.service_dialog.profile.id.as_str(), "a");
}

#[tokio::test(start_paused = true)]
async fn tokio_scheduler_completes_switch() {
    let effects = ShellEffects::new(
        Arc::new(ScriptedCamera::new()),
        Arc::new(MemoryFileReader::new()),
        Arc::new(civic_shell::TokioScheduler::try_current().unwrap()),
    );
    let shell = ShellController::new(two_citizen_config(), ViewRegistry::new(), effects).unwrap();
    let mut updates = shell.subscribe();

    shell.switch_to_id(&"b".into()).unwrap();
    assert_eq!(updates.borrow_and_update().switch_phase, SwitchPhase::Switching);

    tokio::time::sleep(LATENCY + Duration::from_millis(1)).await;
    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.switch_phase, SwitchPhase::Idle);
    assert_eq!(snapshot.active_profile.id.as_str(), "b");
}
