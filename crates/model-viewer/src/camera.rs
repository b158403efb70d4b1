use crate::controls::ViewerHandle;
use glam::{DMat4, DVec3, Mat4};
use std::f64::consts::PI;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::ModifiersState;

/// Degrees of rotation per pixel of cursor travel.
const ROTATE_DEG_PER_PX: f64 = 0.25;
const ROTATE_AZIMUTH_GAIN: f64 = 1.7;
const ROTATE_ELEVATION_GAIN: f64 = 0.7;
/// Keeps elevation off ±π.
pub const ELEVATION_EPS: f64 = 1e-8;

const PAN_GAIN: f64 = 30.0;
const PAN_RIGHT: f64 = -0.2;
const PAN_UP: f64 = 0.2;

/// Radius factor per wheel notch.
const ZOOM_STEP: f64 = 1.1;
pub const MIN_RADIUS: f64 = 1.0;
pub const MAX_RADIUS: f64 = 10_000.0;

const FOV_Y: f64 = 0.25 * PI;
const Z_NEAR: f64 = 1.0;
const Z_FAR: f64 = 1_000_000.0;

/// Orbit camera in the left-handed, Y-up world the importer produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Angle around the up axis (radians).
    pub azimuth: f64,
    /// Angle above/below the XZ plane (radians).
    pub elevation: f64,
    /// Distance from eye to `origin`.
    pub radius: f64,
    /// The point the camera orbits and looks at.
    pub origin: DVec3,
    pub up: DVec3,
    pub aspect_ratio: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl Camera {
    pub fn new(aspect_ratio: f64) -> Self {
        Self {
            azimuth: 2.290308,
            elevation: -0.235183,
            radius: 1880.0,
            origin: DVec3::new(0.0, 400.0, 0.0),
            up: DVec3::Y,
            aspect_ratio,
        }
    }

    /// Zooms by `delta` wheel notches; positive zooms in.
    pub fn scale(&mut self, delta: f64) {
        self.radius = (self.radius * ZOOM_STEP.powf(-delta)).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Orbits by a cursor offset in pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let dx = -(ROTATE_DEG_PER_PX * dx).to_radians();
        let dy = -(ROTATE_DEG_PER_PX * dy).to_radians();

        self.azimuth += dx * ROTATE_AZIMUTH_GAIN;
        self.elevation = Self::clamp_elevation(self.elevation + dy * ROTATE_ELEVATION_GAIN);
    }

    /// Slides the orbit origin along the camera's horizontal right axis and
    /// the world up axis.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let right = DVec3::new(self.azimuth.sin(), 0.0, -self.azimuth.cos());

        self.origin += DVec3::Y * dy * PAN_UP * PAN_GAIN;
        self.origin += right * dx * PAN_RIGHT * PAN_GAIN;
    }

    /// Places the camera explicitly, clamping like the interactive operations.
    pub fn look_at_orbit(&mut self, origin: DVec3, azimuth: f64, elevation: f64, radius: f64) {
        self.origin = origin;
        self.azimuth = azimuth;
        self.elevation = Self::clamp_elevation(elevation);
        self.radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width.max(1) as f64 / height.max(1) as f64;
    }

    pub fn eye_position(&self) -> DVec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let offset = DVec3::new(
            self.radius * cos_el * cos_az,
            self.radius * sin_el,
            self.radius * cos_el * sin_az,
        );
        self.origin - offset
    }

    pub fn view_matrix(&self) -> Mat4 {
        DMat4::look_at_lh(self.eye_position(), self.origin, self.up).as_mat4()
    }

    /// Depth maps to [0, 1], which is what wgpu expects.
    pub fn projection_matrix(&self) -> Mat4 {
        DMat4::perspective_lh(FOV_Y, self.aspect_ratio, Z_NEAR, Z_FAR).as_mat4()
    }

    fn clamp_elevation(elevation: f64) -> f64 {
        elevation.clamp(ELEVATION_EPS - PI, PI - ELEVATION_EPS)
    }
}

/// Pan offsets are scaled down relative to raw cursor travel.
const PAN_CURSOR_SCALE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Turns window input into camera operations on the shared viewer state.
///
/// Middle mouse or Alt rotates, Shift pans, the wheel zooms.
pub struct CameraController {
    modifiers: ModifiersState,
    middle_down: bool,
    last_cursor: Option<(f64, f64)>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            modifiers: ModifiersState::empty(),
            middle_down: false,
            last_cursor: None,
        }
    }

    fn drag(&self) -> Drag {
        if self.middle_down || self.modifiers.alt_key() {
            Drag::Rotate
        } else if self.modifiers.shift_key() {
            Drag::Pan
        } else {
            Drag::None
        }
    }

    pub fn handle_event(&mut self, event: &WindowEvent, viewer: &ViewerHandle) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Middle {
                    self.middle_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let xy = (position.x, position.y);
                if let Some(last) = self.last_cursor {
                    let (dx, dy) = (xy.0 - last.0, xy.1 - last.1);
                    match self.drag() {
                        Drag::Rotate => viewer.rotate(dx, dy),
                        Drag::Pan => viewer.pan(dx * PAN_CURSOR_SCALE, dy * PAN_CURSOR_SCALE),
                        Drag::None => {}
                    }
                }
                self.last_cursor = Some(xy);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / 120.0,
                };
                viewer.scale(notches);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_stays_inside_the_open_interval() {
        let mut camera = Camera::default();
        for dy in [-1e9, -50_000.0, -3.0, 0.0, 7.5, 12_345.0, 1e9] {
            for _ in 0..3 {
                camera.rotate(13.0, dy);
                assert!(camera.elevation >= ELEVATION_EPS - PI);
                assert!(camera.elevation <= PI - ELEVATION_EPS);
                assert!(camera.elevation > -PI && camera.elevation < PI);
            }
        }
    }

    #[test]
    fn radius_stays_in_range() {
        let mut camera = Camera::default();
        for delta in [-1e6, -10.0, -1.0, 0.0, 0.5, 3.0, 1e6] {
            camera.scale(delta);
            assert!((MIN_RADIUS..=MAX_RADIUS).contains(&camera.radius));
        }
        camera.scale(1e6);
        assert_eq!(camera.radius, MIN_RADIUS);
        camera.scale(-1e6);
        assert_eq!(camera.radius, MAX_RADIUS);
    }

    #[test]
    fn matrices_are_pure() {
        let mut camera = Camera::new(1.75);
        camera.rotate(40.0, -12.0);
        camera.pan(3.0, 1.0);

        let (v1, p1) = (camera.view_matrix(), camera.projection_matrix());
        let (v2, p2) = (camera.view_matrix(), camera.projection_matrix());
        assert_eq!(v1.to_cols_array().map(f32::to_bits), v2.to_cols_array().map(f32::to_bits));
        assert_eq!(p1.to_cols_array().map(f32::to_bits), p2.to_cols_array().map(f32::to_bits));
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let camera = Camera::default();
        let clip = camera.projection_matrix() * camera.view_matrix() * camera.origin.as_vec3().extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{ndc:?}");
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn eye_sits_at_radius_from_origin() {
        let mut camera = Camera::default();
        camera.rotate(-200.0, 90.0);
        let d = camera.eye_position().distance(camera.origin);
        assert!((d - camera.radius).abs() < 1e-9);
    }

    #[test]
    fn pan_moves_along_right_and_up() {
        let mut camera = Camera::default();
        camera.azimuth = 0.0;
        let start = camera.origin;

        camera.pan(0.0, 1.0);
        assert!((camera.origin - start - DVec3::new(0.0, 6.0, 0.0)).length() < 1e-12);

        camera.pan(1.0, 0.0);
        // right = (0, 0, -1) at azimuth 0, scaled by -0.2 * 30
        assert!((camera.origin.z - start.z - 6.0).abs() < 1e-12);
        assert_eq!(camera.radius, 1880.0);
    }

    #[test]
    fn explicit_placement_is_clamped() {
        let mut camera = Camera::default();
        camera.look_at_orbit(DVec3::ZERO, 0.0, 10.0, 0.0);
        assert_eq!(camera.elevation, PI - ELEVATION_EPS);
        assert_eq!(camera.radius, MIN_RADIUS);
    }
}
