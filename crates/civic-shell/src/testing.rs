//! # Test Doubles
//!
//! Deterministic stand-ins for the platform capabilities, for unit tests,
//! integration tests and headless frontends.
//!
//! - [`ManualScheduler`]: virtual clock, tasks fire only on [`ManualScheduler::advance`];
//!   background work runs only on [`ManualScheduler::run_background`]
//! - [`ScriptedCamera`] / [`FakeCaptureResource`]: scripted grants and denials
//!   with observable track state
//! - [`GatedCamera`]: a camera whose answer is released by the test
//! - [`MemoryFileReader`]: in-memory file selection
//! - [`RecordingView`]: a module view that records what it was given

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

use crate::effects::{
    BackgroundTask, CameraEffects, CameraError, CaptureResource, DeferredTask, FileHandle,
    FileReadEffects, FileReadError, ScheduledTask, SchedulerEffects, UploadedFile, VideoFrame,
};
use crate::identity::ProfileId;
use crate::router::Screen;
use crate::views::{ModuleView, ViewContent, ViewContext};

// ============================================================================
// Scheduler
// ============================================================================

struct QueuedTask {
    due: Duration,
    seq: u64,
    task: DeferredTask,
    handle: ScheduledTask,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_seq: u64,
    queue: Vec<QueuedTask>,
    background: VecDeque<BackgroundTask>,
}

/// Scheduler driven by a virtual clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Tasks scheduled but not yet fired or discarded
    pub fn pending_count(&self) -> usize {
        self.clock.lock().queue.len()
    }

    /// Move the clock forward and run every task that became due, in due
    /// order. Tasks scheduled while firing are picked up if already due.
    /// Returns the number of tasks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let mut clock = self.clock.lock();
            clock.now += by;
            clock.now
        };
        let mut fired = 0;
        while let Some(next) = self.pop_due(target) {
            // Run outside the clock lock so the task may schedule again.
            if next.handle.is_cancelled() {
                continue;
            }
            (next.task)();
            fired += 1;
        }
        fired
    }

    /// Fire everything currently queued, however far out.
    pub fn run_all(&self) -> usize {
        let latest = {
            let clock = self.clock.lock();
            clock
                .queue
                .iter()
                .map(|t| t.due.saturating_sub(clock.now))
                .max()
        };
        latest.map_or(0, |delay| self.advance(delay))
    }

    /// Background tasks spawned but not yet run
    pub fn background_count(&self) -> usize {
        self.clock.lock().background.len()
    }

    /// Run spawned background tasks to completion, in spawn order. Tasks
    /// spawned meanwhile run too. Returns the number of tasks that ran.
    pub async fn run_background(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.clock.lock().background.pop_front();
            let Some(task) = next else {
                return ran;
            };
            task.await;
            ran += 1;
        }
    }

    fn pop_due(&self, target: Duration) -> Option<QueuedTask> {
        let mut clock = self.clock.lock();
        let index = clock
            .queue
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(clock.queue.swap_remove(index))
    }
}

impl SchedulerEffects for ManualScheduler {
    fn schedule(&self, delay: Duration, task: DeferredTask) -> ScheduledTask {
        let handle = ScheduledTask::new();
        let mut clock = self.clock.lock();
        let seq = clock.next_seq;
        clock.next_seq += 1;
        let due = clock.now + delay;
        clock.queue.push(QueuedTask {
            due,
            seq,
            task,
            handle: handle.clone(),
        });
        handle
    }

    fn spawn(&self, task: BackgroundTask) {
        self.clock.lock().background.push_back(task);
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Shared view of a fake resource's running tracks.
#[derive(Clone, Debug)]
pub struct TrackProbe {
    live: Arc<AtomicUsize>,
}

impl TrackProbe {
    pub fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Capture resource returning a fixed frame.
#[derive(Debug)]
pub struct FakeCaptureResource {
    live: Arc<AtomicUsize>,
    frame: VideoFrame,
    read_error: Option<CameraError>,
}

impl FakeCaptureResource {
    /// Resource with `tracks` running tracks that always yields `frame`.
    pub fn new(tracks: usize, frame: VideoFrame) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(tracks)),
            frame,
            read_error: None,
        }
    }

    /// Make every frame read fail with `err`.
    pub fn failing_reads(mut self, err: CameraError) -> Self {
        self.read_error = Some(err);
        self
    }

    /// Observe the track count after the resource has been moved away.
    pub fn probe(&self) -> TrackProbe {
        TrackProbe {
            live: Arc::clone(&self.live),
        }
    }
}

impl CaptureResource for FakeCaptureResource {
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if self.live_tracks() == 0 {
            return Err(CameraError::FrameUnavailable {
                reason: "tracks stopped".to_string(),
            });
        }
        match &self.read_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.frame.clone()),
        }
    }

    fn stop(&mut self) {
        self.live.store(0, Ordering::SeqCst);
    }

    fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

type CameraResponse = Result<Box<dyn CaptureResource>, CameraError>;

/// Camera answering requests from a script, oldest first. An exhausted
/// script answers `Unavailable`.
#[derive(Default)]
pub struct ScriptedCamera {
    responses: Mutex<VecDeque<CameraResponse>>,
    requests: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera that grants `resource` to the first request.
    pub fn granting(resource: impl CaptureResource + 'static) -> Self {
        let camera = Self::new();
        camera.push_grant(resource);
        camera
    }

    /// Camera that refuses the first request with `err`.
    pub fn denying(err: CameraError) -> Self {
        let camera = Self::new();
        camera.push_denial(err);
        camera
    }

    pub fn push_grant(&self, resource: impl CaptureResource + 'static) {
        self.responses.lock().push_back(Ok(Box::new(resource)));
    }

    pub fn push_denial(&self, err: CameraError) {
        self.responses.lock().push_back(Err(err));
    }

    /// Number of requests made so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraEffects for ScriptedCamera {
    async fn request(&self) -> Result<Box<dyn CaptureResource>, CameraError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| {
            Err(CameraError::Unavailable {
                reason: "no scripted response".to_string(),
            })
        })
    }
}

/// Camera whose single request stays pending until the paired
/// [`CameraGate`] answers it.
pub struct GatedCamera {
    answer: Mutex<Option<oneshot::Receiver<CameraResponse>>>,
}

/// Answers the request pending on a [`GatedCamera`].
pub struct CameraGate {
    sender: oneshot::Sender<CameraResponse>,
}

impl GatedCamera {
    pub fn pair() -> (Self, CameraGate) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                answer: Mutex::new(Some(receiver)),
            },
            CameraGate { sender },
        )
    }
}

impl CameraGate {
    /// Grant the pending request. Returns false if the requester went away,
    /// in which case the resource is dropped unstopped.
    pub fn grant(self, resource: impl CaptureResource + 'static) -> bool {
        self.sender.send(Ok(Box::new(resource))).is_ok()
    }

    pub fn deny(self, err: CameraError) -> bool {
        self.sender.send(Err(err)).is_ok()
    }
}

#[async_trait]
impl CameraEffects for GatedCamera {
    async fn request(&self) -> Result<Box<dyn CaptureResource>, CameraError> {
        let receiver = self.answer.lock().take();
        let unavailable = |reason: &str| CameraError::Unavailable {
            reason: reason.to_string(),
        };
        match receiver {
            Some(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(unavailable("gate dropped"))),
            None => Err(unavailable("gate already used")),
        }
    }
}

// ============================================================================
// Files
// ============================================================================

/// In-memory file selection.
#[derive(Default)]
pub struct MemoryFileReader {
    files: Mutex<HashMap<String, UploadedFile>>,
    failures: Mutex<HashMap<String, FileReadError>>,
}

impl MemoryFileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, file: UploadedFile) -> Self {
        self.insert(file);
        self
    }

    pub fn insert(&self, file: UploadedFile) {
        self.files.lock().insert(file.name.clone(), file);
    }

    /// Make reads of `name` fail with `err`.
    pub fn fail(&self, name: impl Into<String>, err: FileReadError) {
        self.failures.lock().insert(name.into(), err);
    }
}

#[async_trait]
impl FileReadEffects for MemoryFileReader {
    async fn read_file(&self, handle: &FileHandle) -> Result<UploadedFile, FileReadError> {
        if let Some(err) = self.failures.lock().get(&handle.name) {
            return Err(err.clone());
        }
        self.files
            .lock()
            .get(&handle.name)
            .cloned()
            .ok_or_else(|| FileReadError::NotFound {
                name: handle.name.clone(),
            })
    }
}

// ============================================================================
// Views
// ============================================================================

/// What one render call received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRecord {
    pub screen: Screen,
    pub profile: Option<ProfileId>,
    pub had_navigate: bool,
    pub had_service: bool,
    /// Ambient flag, when the view was given the ambient control
    pub ambient: Option<bool>,
}

/// Module view that records every render. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingView {
    log: Arc<Mutex<Vec<RenderRecord>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<RenderRecord> {
        self.log.lock().clone()
    }

    pub fn last(&self) -> Option<RenderRecord> {
        self.log.lock().last().cloned()
    }
}

impl ModuleView for RecordingView {
    fn render(&self, ctx: &ViewContext<'_>) -> ViewContent {
        let record = RenderRecord {
            screen: ctx.screen,
            profile: ctx.profile.map(|p| p.id.clone()),
            had_navigate: ctx.navigate.is_some(),
            had_service: ctx.open_service.is_some(),
            ambient: ctx.ambient.as_ref().map(|a| a.enabled),
        };
        self.log.lock().push(record);
        ViewContent::new(
            ctx.screen,
            json!({
                "screen": ctx.screen.tag(),
                "profile": ctx.profile.map(|p| p.id.as_str()),
                "name": ctx.profile.map(|p| p.name.as_str()),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_fires_in_due_order() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            scheduler.schedule(
                Duration::from_millis(delay),
                Box::new(move || log.lock().push(label)),
            );
        }

        assert_eq!(scheduler.advance(Duration::from_millis(15)), 1);
        assert_eq!(scheduler.pending_count(), 2);
        assert_eq!(scheduler.run_all(), 2);
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.now(), Duration::from_millis(30));
    }

    #[test]
    fn test_manual_scheduler_skips_cancelled() {
        let scheduler = ManualScheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(5), Box::new(|| panic!("ran")));
        handle.cancel();
        assert_eq!(scheduler.advance(Duration::from_millis(5)), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_manual_scheduler_runs_background_in_spawn_order() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second"] {
            let log = log.clone();
            let nested = scheduler.clone();
            scheduler.spawn(Box::pin(async move {
                log.lock().push(label);
                if label == "first" {
                    let log = log.clone();
                    nested.spawn(Box::pin(async move { log.lock().push("nested") }));
                }
            }));
        }

        assert_eq!(scheduler.background_count(), 2);
        assert!(log.lock().is_empty());
        assert_eq!(scheduler.run_background().await, 3);
        assert_eq!(*log.lock(), vec!["first", "second", "nested"]);
        assert_eq!(scheduler.background_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_camera_exhausts_to_unavailable() {
        let camera = ScriptedCamera::denying(CameraError::Denied);
        assert_eq!(camera.request().await.err(), Some(CameraError::Denied));
        assert!(matches!(
            camera.request().await.err(),
            Some(CameraError::Unavailable { .. })
        ));
        assert_eq!(camera.request_count(), 2);
    }

    #[test]
    fn test_stopped_resource_yields_no_frames() {
        let mut resource = FakeCaptureResource::new(
            1,
            VideoFrame::new(1, 1, "image/jpeg", vec![0xFF]),
        );
        assert!(resource.read_frame().is_ok());
        resource.stop();
        resource.stop();
        assert_eq!(resource.live_tracks(), 0);
        assert!(resource.read_frame().is_err());
    }
}
