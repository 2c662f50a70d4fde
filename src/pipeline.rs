use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::field::{Completion, FetchEngine, ServiceError, SurfaceQuery, SurfaceService};
use crate::params::PatternParameters;
use crate::scene::framer::{self, CameraFrame};
use crate::scene::material::MaterialKind;
use crate::scene::{MaterialManager, RenderMode, Scene, SurfaceMesh};
use crate::snapshot::{Snapshot, SnapshotError};

/// Quiescence window for coalescing bursts of parameter edits.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

enum CoalescerState {
    Idle,
    Pending {
        deadline: Instant,
        params: PatternParameters,
    },
}

/// Trailing-edge debounce over parameter-change signals. Every signal
/// replaces the pending deadline and arguments; only the last signal of
/// a burst survives to `poll`. Not a rate limiter: nothing fires until
/// the burst has been quiet for a full window.
pub struct Coalescer {
    state: CoalescerState,
    window: Duration,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            state: CoalescerState::Idle,
            window,
        }
    }

    pub fn signal(&mut self, params: PatternParameters, now: Instant) {
        self.state = CoalescerState::Pending {
            deadline: now + self.window,
            params,
        };
    }

    pub fn poll(&mut self, now: Instant) -> Option<PatternParameters> {
        match self.state {
            CoalescerState::Pending { deadline, params } if now >= deadline => {
                self.state = CoalescerState::Idle;
                Some(params)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, CoalescerState::Pending { .. })
    }
}

/// Status line surfaced in the UI. Blocking entries (invalid input) stay
/// until acknowledged; the rest are informational and overwritten freely.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusLine {
    pub message: String,
    pub blocking: bool,
}

/// Pipeline orchestrator: owns the scene, material state machine, fetch
/// engine and request bookkeeping. All scene mutation funnels through
/// here on the event-loop thread; the render tick only reads.
pub struct Viewer {
    pub scene: Scene,
    pub materials: MaterialManager,
    coalescer: Coalescer,
    fetcher: FetchEngine,
    fov: f32,
    /// Monotonic sequence of issued requests. A completion is applied
    /// only when its echoed number is still the latest issued; stale
    /// responses from superseded requests are dropped.
    latest_seq: u64,
    last_applied_seq: u64,
    pending_frame: Option<CameraFrame>,
    status: Option<StatusLine>,
}

impl Viewer {
    pub fn new(service: impl SurfaceService, fov: f32) -> Self {
        Self {
            scene: Scene::default(),
            materials: MaterialManager::default(),
            coalescer: Coalescer::new(DEBOUNCE_WINDOW),
            fetcher: FetchEngine::new(service),
            fov,
            latest_seq: 0,
            last_applied_seq: 0,
            pending_frame: None,
            status: None,
        }
    }

    /// The very first render is not debounced.
    pub fn initial_fetch(&mut self, params: PatternParameters) {
        self.issue(params);
    }

    /// Parameter edits funnel through the coalescer.
    pub fn params_changed(&mut self, params: PatternParameters, now: Instant) {
        self.coalescer.signal(params, now);
    }

    /// Event-loop step: fire a settled burst, drain finished requests.
    /// Non-blocking; safe to call at frame cadence.
    pub fn tick(&mut self, now: Instant) {
        if let Some(params) = self.coalescer.poll(now) {
            self.issue(params);
        }
        while let Some(completion) = self.fetcher.try_recv_completion() {
            self.apply_completion(completion);
        }
    }

    /// Validates and dispatches one request. Invalid mode numbers block
    /// the fetch and raise an acknowledgment prompt.
    pub fn issue(&mut self, params: PatternParameters) {
        if let Err(e) = params.validate() {
            log::warn!("rejecting surface request: {e}");
            self.status = Some(StatusLine {
                message: e.to_string(),
                blocking: true,
            });
            return;
        }
        if params.has_degenerate_box() {
            log::warn!("bounding box is degenerate; expect an empty surface");
        }

        self.latest_seq += 1;
        let query = SurfaceQuery::new(params);
        log::debug!("issuing surface request #{}: {}", self.latest_seq, query.encode());
        self.fetcher.request(self.latest_seq, query);
    }

    /// Applies one finished request to the scene, or drops it if it was
    /// superseded while in flight.
    pub fn apply_completion(&mut self, completion: Completion) {
        if completion.seq != self.latest_seq {
            log::debug!(
                "dropping stale completion #{} (latest is #{})",
                completion.seq,
                self.latest_seq
            );
            return;
        }
        self.last_applied_seq = completion.seq;

        match completion.result {
            Ok(payload) if payload.is_empty() => {
                // Valid but degenerate: no iso-crossing for these
                // parameters. The previous mesh stays up.
                log::info!("surface request #{} returned no geometry", completion.seq);
                self.status = Some(StatusLine {
                    message: "parameters yield an empty surface".into(),
                    blocking: false,
                });
            }
            Ok(payload) => {
                let mesh = Arc::new(SurfaceMesh::from_payload(&payload));
                log::info!(
                    "surface #{}: {} vertices, {} triangles",
                    completion.seq,
                    mesh.vertex_count(),
                    mesh.indices.len() / 3
                );
                self.materials.realize(&mut self.scene, mesh);
                self.pending_frame = framer::frame(&self.scene, self.fov);
                self.status = None;
            }
            Err(e) => {
                // Transport failures and malformed bodies leave the
                // previous mesh untouched; the user retries by editing.
                log::error!("surface request #{} failed: {e}", completion.seq);
                self.status = Some(StatusLine {
                    message: e.to_string(),
                    blocking: false,
                });
            }
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.latest_seq > self.last_applied_seq
    }

    /// Camera placement computed by the last surface replacement, handed
    /// to the camera exactly once.
    pub fn take_camera_frame(&mut self) -> Option<CameraFrame> {
        self.pending_frame.take()
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn acknowledge_status(&mut self) {
        self.status = None;
    }

    // Material edits never re-frame the camera.

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.materials.set_mode(&mut self.scene, mode);
    }

    pub fn set_material_kind(&mut self, kind: MaterialKind) {
        self.materials.set_kind(&mut self.scene, kind);
    }

    pub fn set_front_color(&mut self, color: [f32; 3]) {
        self.materials.set_front_color(&mut self.scene, color);
    }

    pub fn set_back_color(&mut self, color: [f32; 3]) {
        self.materials.set_back_color(&mut self.scene, color);
    }

    pub fn export_snapshot(&self, params: PatternParameters) -> Result<Snapshot, SnapshotError> {
        Snapshot::export(params, &self.scene)
    }

    /// Replaces the live mesh with snapshot geometry under a default
    /// single-sided appearance and re-frames the camera. Returns the
    /// imported parameters so the UI can adopt them.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> PatternParameters {
        self.materials
            .realize_default(&mut self.scene, snapshot.geometry());
        self.pending_frame = framer::frame(&self.scene, self.fov);
        self.status = None;
        snapshot.parameters
    }

    pub fn fetch_error(&self) -> Option<String> {
        self.fetcher.last_error()
    }

    pub fn shutdown(&self) {
        self.fetcher.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SurfacePayload;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FOV: f32 = 1.308997; // 75 degrees

    /// Service whose payload encodes the A coefficient, so responses are
    /// distinguishable, and which counts how often it is called.
    struct TaggedService {
        calls: Arc<AtomicUsize>,
    }

    fn tagged_payload(tag: f32) -> SurfacePayload {
        SurfacePayload {
            vertices: vec![[tag, 0.0, 0.0], [tag + 1.0, 0.0, 0.0], [tag, 1.0, 0.0]],
            faces: vec![[0, 1, 2]],
        }
    }

    impl SurfaceService for TaggedService {
        fn generate(&self, query: &SurfaceQuery) -> Result<SurfacePayload, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(tagged_payload(query.params.a as f32))
        }
    }

    fn viewer() -> (Viewer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let viewer = Viewer::new(
            TaggedService {
                calls: Arc::clone(&calls),
            },
            FOV,
        );
        (viewer, calls)
    }

    fn drain(viewer: &mut Viewer) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while viewer.is_fetching() {
            assert!(Instant::now() < deadline, "fetch timed out");
            viewer.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn burst_of_edits_issues_one_fetch_with_last_values() {
        let mut coalescer = Coalescer::new(DEBOUNCE_WINDOW);
        let t0 = Instant::now();

        let mut p = PatternParameters::default();
        for i in 0..5 {
            p.a = i as f64;
            coalescer.signal(p, t0 + Duration::from_millis(i * 50));
        }

        // Quiet until a full window after the last signal.
        let last = t0 + Duration::from_millis(200);
        assert_eq!(coalescer.poll(last + Duration::from_millis(299)), None);
        let fired = coalescer.poll(last + DEBOUNCE_WINDOW).unwrap();
        assert_eq!(fired.a, 4.0);

        // Suppressed signals are gone, not queued.
        assert_eq!(coalescer.poll(last + Duration::from_secs(10)), None);
        assert!(!coalescer.is_pending());
    }

    #[test]
    fn initial_fetch_is_not_debounced() {
        let (mut viewer, calls) = viewer();
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(viewer.scene.entities().len(), 1);
    }

    #[test]
    fn invalid_mode_numbers_never_reach_the_service() {
        let (mut viewer, calls) = viewer();
        let mut p = PatternParameters::default();
        p.u = 0;
        viewer.issue(p);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!viewer.is_fetching());
        let status = viewer.status().unwrap();
        assert!(status.blocking);
        viewer.acknowledge_status();
        assert!(viewer.status().is_none());
    }

    #[test]
    fn debounced_edits_fetch_once_via_tick() {
        let (mut viewer, calls) = viewer();
        let t0 = Instant::now();
        let mut p = PatternParameters::default();
        for i in 0..5 {
            p.a = i as f64;
            viewer.params_changed(p, t0);
            viewer.tick(t0 + Duration::from_millis(i * 10));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0, "burst must not fetch");

        viewer.tick(t0 + Duration::from_secs(1));
        drain(&mut viewer);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (mut viewer, _) = viewer();
        viewer.issue(PatternParameters::default()); // seq 1
        viewer.issue(PatternParameters::default()); // seq 2

        // Later-issued request finishes first.
        viewer.apply_completion(Completion {
            seq: 2,
            result: Ok(tagged_payload(2.0)),
        });
        assert_eq!(viewer.scene.entities()[0].geometry.positions[0], 2.0);

        // The slower, earlier request must not clobber it.
        viewer.apply_completion(Completion {
            seq: 1,
            result: Ok(tagged_payload(1.0)),
        });
        assert_eq!(viewer.scene.entities()[0].geometry.positions[0], 2.0);
    }

    #[test]
    fn empty_surface_keeps_previous_mesh_and_camera() {
        let (mut viewer, _) = viewer();
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        assert!(viewer.take_camera_frame().is_some());

        viewer.issue(PatternParameters::default());
        viewer.apply_completion(Completion {
            seq: viewer.latest_seq,
            result: Ok(SurfacePayload::default()),
        });

        assert_eq!(viewer.scene.entities().len(), 1, "previous mesh kept");
        assert!(viewer.take_camera_frame().is_none(), "no re-frame");
        let status = viewer.status().unwrap();
        assert!(!status.blocking);
    }

    #[test]
    fn failed_fetch_leaves_scene_untouched() {
        let (mut viewer, _) = viewer();
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        let epoch = viewer.scene.epoch();

        viewer.issue(PatternParameters::default());
        viewer.apply_completion(Completion {
            seq: viewer.latest_seq,
            result: Err(ServiceError::FetchFailed("connection refused".into())),
        });

        assert_eq!(viewer.scene.epoch(), epoch);
        assert!(viewer.status().unwrap().message.contains("connection refused"));
    }

    #[test]
    fn rogue_service_indices_are_recovered_not_fatal() {
        struct RogueService;
        impl SurfaceService for RogueService {
            fn generate(&self, _: &SurfaceQuery) -> Result<SurfacePayload, ServiceError> {
                // Face points past the two vertices it ships.
                Ok(SurfacePayload {
                    vertices: vec![[0.0; 3], [1.0, 0.0, 0.0]],
                    faces: vec![[0, 1, 7]],
                })
            }
        }

        let mut viewer = Viewer::new(RogueService, FOV);
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);

        assert!(viewer.scene.entities().is_empty(), "bad mesh never lands");
        assert!(viewer.take_camera_frame().is_none());
        let status = viewer.status().unwrap();
        assert!(!status.blocking);
        assert!(status.message.contains("out of range"));
    }

    #[test]
    fn successful_fetch_frames_camera_on_geometry() {
        let (mut viewer, _) = viewer();
        let mut p = PatternParameters::default();
        p.a = 4.0;
        viewer.initial_fetch(p);
        drain(&mut viewer);

        let frame = viewer.take_camera_frame().unwrap();
        let aabb = viewer.scene.aabb().unwrap();
        assert!((frame.target - aabb.center()).length() < 1e-5);
        // Handed out exactly once.
        assert!(viewer.take_camera_frame().is_none());
    }

    #[test]
    fn double_mode_fetch_realizes_two_entities() {
        let (mut viewer, _) = viewer();
        viewer.set_render_mode(RenderMode::Double);
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        assert_eq!(viewer.scene.entities().len(), 2);
    }

    #[test]
    fn material_edits_do_not_reframe() {
        let (mut viewer, _) = viewer();
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        let _ = viewer.take_camera_frame();

        viewer.set_front_color([0.2, 0.2, 0.2]);
        viewer.set_material_kind(MaterialKind::Toon);
        viewer.set_render_mode(RenderMode::Double);
        assert!(viewer.take_camera_frame().is_none());
    }

    #[test]
    fn import_replaces_scene_and_reframes() {
        let (mut viewer, _) = viewer();
        viewer.initial_fetch(PatternParameters::default());
        drain(&mut viewer);
        viewer.set_render_mode(RenderMode::Double);
        let _ = viewer.take_camera_frame();

        let mut params = PatternParameters::default();
        params.v = 7;
        let snapshot = Snapshot {
            parameters: params,
            pattern_data: SurfaceMesh::from_payload(&tagged_payload(9.0)),
        };
        let adopted = viewer.import_snapshot(snapshot);

        assert_eq!(adopted.v, 7);
        assert_eq!(viewer.scene.entities().len(), 1, "import is single mode");
        assert_eq!(viewer.scene.entities()[0].geometry.positions[0], 9.0);
        assert!(viewer.take_camera_frame().is_some());
    }
}
