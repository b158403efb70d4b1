//! State shared between the UI/event side and the render loop.
//!
//! Everything the mutator operations touch lives in [`SharedState`] behind
//! `parking_lot` locks; the render loop reads a snapshot once per frame.
//! [`ViewerHandle`] is the cloneable entry point for input handlers and may be
//! used from any thread.

use crate::camera::Camera;
use crate::model::{export_source, geometry::Extents};
use mesh_io::{AssetImporter, ExportError};
use parking_lot::Mutex;
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Single-item mailbox. A second `put` before a `take` replaces the first
/// value; it is not a queue.
#[derive(Debug)]
pub struct TaskSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

impl<T> TaskSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the unconsumed value it replaced.
    pub fn put(&self, value: T) -> Option<T> {
        self.value.lock().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.value.lock().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    Points,
    Wireframe,
    /// Hard-edged shading from the per-face normal stream.
    Flat,
    Smooth,
    #[default]
    Triangles,
}

impl PrimitiveMode {
    pub const ALL: [PrimitiveMode; 5] = [
        PrimitiveMode::Points,
        PrimitiveMode::Wireframe,
        PrimitiveMode::Flat,
        PrimitiveMode::Smooth,
        PrimitiveMode::Triangles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PrimitiveMode::Points => "Points",
            PrimitiveMode::Wireframe => "Wireframe",
            PrimitiveMode::Flat => "Flat shaded",
            PrimitiveMode::Smooth => "Smooth shaded",
            PrimitiveMode::Triangles => "Triangles",
        }
    }
}

/// Which axis indicators are drawn with the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisMask {
    pub const ALL: Self = Self::new(true, true, true);

    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    pub fn as_array(self) -> [bool; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetView {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

/// Keeps the top/bottom presets off the elevation clamp.
const POLE_OFFSET: f64 = 1e-7;
/// Preset radius in multiples of the model's scaled vertical half-extent.
const PRESET_RADIUS_FACTOR: f64 = 5.0;

impl PresetView {
    pub const ALL: [PresetView; 6] = [
        PresetView::Top,
        PresetView::Bottom,
        PresetView::Left,
        PresetView::Right,
        PresetView::Front,
        PresetView::Back,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PresetView::Top => "Top",
            PresetView::Bottom => "Bottom",
            PresetView::Left => "Left",
            PresetView::Right => "Right",
            PresetView::Front => "Front",
            PresetView::Back => "Back",
        }
    }

    /// `(elevation, azimuth, mask)` for this preset.
    pub fn orbit(self) -> (f64, f64, AxisMask) {
        let horizontal = AxisMask::new(true, false, true);
        match self {
            PresetView::Top => (-FRAC_PI_2 + POLE_OFFSET, FRAC_PI_2, horizontal),
            PresetView::Bottom => (FRAC_PI_2 - POLE_OFFSET, FRAC_PI_2, horizontal),
            PresetView::Left => (0.0, 0.0, AxisMask::new(false, true, true)),
            PresetView::Right => (0.0, PI, AxisMask::new(false, true, true)),
            PresetView::Front => (0.0, FRAC_PI_2, AxisMask::new(true, true, false)),
            PresetView::Back => (0.0, -FRAC_PI_2, AxisMask::new(true, true, false)),
        }
    }
}

/// Resize requests and surface moves, coalesced until the surface has been
/// left alone for `window`.
#[derive(Debug, Clone)]
pub struct ResizeDebounce {
    window: Duration,
    last_move: Option<Instant>,
    pending: Option<PendingResize>,
}

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    size: (u32, u32),
    requested_at: Instant,
}

impl ResizeDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_move: None,
            pending: None,
        }
    }

    pub fn on_moved(&mut self, now: Instant) {
        self.last_move = Some(now);
    }

    /// Records the latest target size. Zero-sized (minimised) requests are
    /// ignored.
    pub fn on_resize(&mut self, width: u32, height: u32, now: Instant) {
        if width == 0 || height == 0 {
            return;
        }
        self.pending = Some(PendingResize {
            size: (width, height),
            requested_at: now,
        });
    }

    /// True while the surface moved within the window; the frame is skipped.
    pub fn should_skip(&self, now: Instant) -> bool {
        self.last_move
            .is_some_and(|t| now.saturating_duration_since(t) < self.window)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the pending size once the window has elapsed since both the
    /// request and the last move, clearing it.
    pub fn take_due(&mut self, now: Instant) -> Option<(u32, u32)> {
        let pending = self.pending?;
        let quiet_since = match self.last_move {
            Some(moved) => moved.max(pending.requested_at),
            None => pending.requested_at,
        };
        if now.saturating_duration_since(quiet_since) < self.window {
            return None;
        }
        self.pending = None;
        Some(pending.size)
    }
}

/// What the status label and save/preset operations need from the active model.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModelInfo {
    pub name: String,
    pub source: Option<PathBuf>,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub extents: Extents,
    pub scale: f32,
}

impl ActiveModelInfo {
    pub fn status_line(&self) -> String {
        format!(
            "Model: {} | Vertices: {} | Triangles: {}",
            self.name, self.vertex_count, self.triangle_count
        )
    }
}

/// View parameters mutated by input and read once per frame.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub camera: Camera,
    pub mode: PrimitiveMode,
    pub light_intensity: f32,
    pub axis_mask: AxisMask,
    pub paused: bool,
    pub debounce: ResizeDebounce,
}

#[derive(Debug)]
pub struct SharedState {
    pub view: Mutex<ViewState>,
    /// Files the user asked to open, consumed by the render loop.
    pub model_requests: TaskSlot<PathBuf>,
    pub active: Mutex<Option<ActiveModelInfo>>,
}

impl SharedState {
    pub fn new(camera: Camera, light_intensity: f32, debounce: Duration) -> Self {
        Self {
            view: Mutex::new(ViewState {
                camera,
                mode: PrimitiveMode::default(),
                light_intensity,
                axis_mask: AxisMask::ALL,
                paused: false,
                debounce: ResizeDebounce::new(debounce),
            }),
            model_requests: TaskSlot::new(),
            active: Mutex::new(None),
        }
    }
}

/// Cloneable handle through which UI and input drive the viewer.
#[derive(Clone)]
pub struct ViewerHandle {
    shared: Arc<SharedState>,
    importer: Arc<dyn AssetImporter>,
}

impl ViewerHandle {
    pub fn new(shared: Arc<SharedState>, importer: Arc<dyn AssetImporter>) -> Self {
        Self { shared, importer }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Queues `path` to replace the active model. Overwrites an unconsumed
    /// earlier request.
    pub fn request_model_swap(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(dropped) = self.shared.model_requests.put(path.clone()) {
            log::debug!("Model request {} superseded", dropped.display());
        }
        log::info!("Requested model {}", path.display());
    }

    /// Re-exports the active model's source file to `dest` as OBJ. Blocks the
    /// caller. Without an active model this is a no-op.
    pub fn request_save_active(&self, dest: &Path) -> Result<(), ExportError> {
        let Some(info) = self.active_model() else {
            log::warn!("No active model to save");
            return Ok(());
        };
        export_source(self.importer.as_ref(), info.source.as_deref(), dest)
    }

    pub fn set_primitive_mode(&self, mode: PrimitiveMode) {
        self.shared.view.lock().mode = mode;
    }

    pub fn primitive_mode(&self) -> PrimitiveMode {
        self.shared.view.lock().mode
    }

    pub fn rotate(&self, dx: f64, dy: f64) {
        let mut view = self.shared.view.lock();
        view.camera.rotate(dx, dy);
        view.axis_mask = AxisMask::ALL;
    }

    pub fn pan(&self, dx: f64, dy: f64) {
        let mut view = self.shared.view.lock();
        view.camera.pan(dx, dy);
        view.axis_mask = AxisMask::ALL;
    }

    pub fn scale(&self, delta: f64) {
        self.shared.view.lock().camera.scale(delta);
    }

    /// Frames the active model from a fixed direction. Without an active
    /// model only the orientation changes.
    pub fn set_preset_view(&self, preset: PresetView) {
        let framing = self.shared.active.lock().as_ref().map(|info| {
            let scale = info.scale as f64;
            let center = info.extents.center();
            let half_height = (info.extents.max[1] - center.y) as f64 * scale;
            (center.as_dvec3() * scale, PRESET_RADIUS_FACTOR * half_height)
        });

        let (elevation, azimuth, mask) = preset.orbit();
        let mut view = self.shared.view.lock();
        let (origin, radius) = framing.unwrap_or((view.camera.origin, view.camera.radius));
        view.camera.look_at_orbit(origin, azimuth, elevation, radius);
        view.axis_mask = mask;
    }

    pub fn set_light_intensity(&self, value: f32) {
        self.shared.view.lock().light_intensity = value.max(0.0);
    }

    pub fn light_intensity(&self) -> f32 {
        self.shared.view.lock().light_intensity
    }

    pub fn on_resize(&self, width: u32, height: u32) {
        self.shared
            .view
            .lock()
            .debounce
            .on_resize(width, height, Instant::now());
    }

    /// Records that the host surface is being moved or dragged.
    pub fn on_surface_moved(&self) {
        self.shared.view.lock().debounce.on_moved(Instant::now());
    }

    pub fn toggle_pause(&self) -> bool {
        let mut view = self.shared.view.lock();
        view.paused = !view.paused;
        view.paused
    }

    pub fn active_model(&self) -> Option<ActiveModelInfo> {
        self.shared.active.lock().clone()
    }

    pub fn status_line(&self) -> String {
        self.shared
            .active
            .lock()
            .as_ref()
            .map_or_else(|| "No model".to_owned(), ActiveModelInfo::status_line)
    }

    pub fn camera(&self) -> Camera {
        self.shared.view.lock().camera.clone()
    }

    pub fn load_pending(&self) -> bool {
        self.shared.model_requests.is_pending()
    }
}

impl std::fmt::Debug for ViewerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use mesh_io::Importer;

    fn handle() -> ViewerHandle {
        let shared = SharedState::new(Camera::default(), 1.0, Duration::from_millis(150));
        ViewerHandle::new(Arc::new(shared), Arc::new(Importer))
    }

    fn with_model(handle: &ViewerHandle) {
        *handle.shared().active.lock() = Some(ActiveModelInfo {
            name: "box.obj".into(),
            source: None,
            vertex_count: 8,
            triangle_count: 12,
            extents: Extents {
                min: [-1.0, 0.0, -1.0],
                max: [1.0, 4.0, 3.0],
            },
            scale: 100.0,
        });
    }

    #[test]
    fn task_slot_is_last_write_wins() {
        let slot = TaskSlot::new();
        assert_eq!(slot.take(), None::<&str>);

        assert_eq!(slot.put("first"), None);
        assert_eq!(slot.put("second"), Some("first"));
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some("second"));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_pending());
    }

    #[test]
    fn task_slot_across_threads() {
        let slot = Arc::new(TaskSlot::new());
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let slot = slot.clone();
                std::thread::spawn(move || {
                    slot.put(i);
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        assert!(slot.take().is_some_and(|v| (0..4).contains(&v)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn resize_waits_for_quiet_window() {
        let window = Duration::from_millis(150);
        let t0 = Instant::now();
        let ms = |n| t0 + Duration::from_millis(n);
        let mut debounce = ResizeDebounce::new(window);

        debounce.on_resize(800, 600, t0);
        debounce.on_moved(ms(50));

        assert_eq!(debounce.take_due(ms(150)), None);
        assert!(debounce.should_skip(ms(150)));
        assert_eq!(debounce.take_due(ms(199)), None);

        assert!(!debounce.should_skip(ms(200)));
        assert_eq!(debounce.take_due(ms(200)), Some((800, 600)));
        assert!(!debounce.has_pending());
    }

    #[test]
    fn resize_commits_after_window_without_moves() {
        let t0 = Instant::now();
        let mut debounce = ResizeDebounce::new(Duration::from_millis(150));

        debounce.on_resize(640, 480, t0);
        assert_eq!(debounce.take_due(t0 + Duration::from_millis(149)), None);
        debounce.on_resize(1024, 768, t0 + Duration::from_millis(100));
        assert_eq!(debounce.take_due(t0 + Duration::from_millis(200)), None);
        assert_eq!(
            debounce.take_due(t0 + Duration::from_millis(250)),
            Some((1024, 768))
        );
    }

    #[test]
    fn zero_size_resize_is_ignored() {
        let t0 = Instant::now();
        let mut debounce = ResizeDebounce::new(Duration::ZERO);
        debounce.on_resize(0, 600, t0);
        assert!(!debounce.has_pending());
    }

    #[test]
    fn presets_frame_the_active_model() {
        let handle = handle();
        with_model(&handle);

        handle.set_preset_view(PresetView::Front);
        let camera = handle.camera();
        assert_eq!(camera.origin, DVec3::new(0.0, 200.0, 100.0));
        // 5 * (maxY - midY) * scale
        assert_eq!(camera.radius, 1000.0);
        assert_eq!((camera.elevation, camera.azimuth), (0.0, FRAC_PI_2));
        assert_eq!(handle.shared().view.lock().axis_mask, AxisMask::new(true, true, false));

        handle.set_preset_view(PresetView::Top);
        assert_eq!(handle.shared().view.lock().axis_mask, AxisMask::new(true, false, true));
        assert!(handle.camera().elevation > -FRAC_PI_2);

        handle.rotate(1.0, 0.0);
        assert_eq!(handle.shared().view.lock().axis_mask, AxisMask::ALL);
    }

    #[test]
    fn preset_without_model_keeps_origin() {
        let handle = handle();
        let before = handle.camera();
        handle.set_preset_view(PresetView::Left);
        let after = handle.camera();
        assert_eq!(after.origin, before.origin);
        assert_eq!(after.radius, before.radius);
        assert_eq!(after.azimuth, 0.0);
    }

    #[test]
    fn status_line() {
        let handle = handle();
        assert_eq!(handle.status_line(), "No model");
        with_model(&handle);
        assert_eq!(handle.status_line(), "Model: box.obj | Vertices: 8 | Triangles: 12");
    }

    #[test]
    fn save_without_model_is_a_no_op() {
        let handle = handle();
        let dest = std::env::temp_dir().join(format!("model_viewer_{}_none.obj", std::process::id()));
        assert!(handle.request_save_active(&dest).is_ok());
        assert!(!dest.exists());
    }

    #[test]
    fn swap_requests_overwrite() {
        let handle = handle();
        handle.request_model_swap("a.obj");
        handle.request_model_swap("b.obj");
        assert_eq!(handle.shared().model_requests.take(), Some(PathBuf::from("b.obj")));
        assert!(!handle.load_pending());
    }
}
