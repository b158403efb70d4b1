//! Per-frame pass constants shared by the main and grid shaders.

use glam::{Mat4, Vec3};

pub const MAX_LIGHTS: usize = 8;

/// Lights sit on the corners of a cube of this half-size around the origin.
pub const LIGHT_DISTANCE: f32 = 800.0;

pub const DEFAULT_LIGHT_INTENSITY: f32 = 2_500_000.0;
pub const MAX_LIGHT_INTENSITY: f32 = 6_000_000.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub albedo: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: [0.8, 0.8, 0.8],
            metallic: 0.0,
            roughness: 0.6,
            ao: 1.0,
        }
    }
}

/// Mirrors `PassConstants` in `pbr.wgsl` and `grid.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassConstants {
    pub model: Mat4,                               // 0
    pub view: Mat4,                                // 64
    pub proj: Mat4,                                // 128
    pub albedo: [f32; 3],                          // 192
    pub metallic: f32,                             // 204
    pub roughness: f32,                            // 208
    pub ao: f32,                                   // 212
    pub light_count: i32,                          // 216
    pub _pad0: f32,                                // 220
    pub light_positions: [[f32; 4]; MAX_LIGHTS],   // 224
    pub light_colors: [[f32; 4]; MAX_LIGHTS],      // 352
    pub camera_pos: [f32; 3],                      // 480
    pub _pad1: f32,                                // 492 -> 496
}

const _: [(); 496] = [(); core::mem::size_of::<PassConstants>()];

/// The fixed rig: one light per cube corner, all of colour `intensity`.
pub fn light_rig(intensity: f32) -> ([[f32; 4]; MAX_LIGHTS], [[f32; 4]; MAX_LIGHTS]) {
    let mut positions = [[0.0; 4]; MAX_LIGHTS];
    for (i, p) in positions.iter_mut().enumerate() {
        let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
        *p = [
            sign(4) * LIGHT_DISTANCE,
            sign(2) * LIGHT_DISTANCE,
            sign(1) * LIGHT_DISTANCE,
            1.0,
        ];
    }
    let colors = [[intensity, intensity, intensity, 1.0]; MAX_LIGHTS];
    (positions, colors)
}

impl PassConstants {
    pub fn new(
        model: Mat4,
        view: Mat4,
        proj: Mat4,
        camera_pos: Vec3,
        material: Material,
        light_intensity: f32,
    ) -> Self {
        let (light_positions, light_colors) = light_rig(light_intensity);
        Self {
            model,
            view,
            proj,
            albedo: material.albedo,
            metallic: material.metallic,
            roughness: material.roughness,
            ao: material.ao,
            light_count: MAX_LIGHTS as i32,
            _pad0: 0.0,
            light_positions,
            light_colors,
            camera_pos: camera_pos.to_array(),
            _pad1: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_offsets_match_wgsl_layout() {
        assert_eq!(std::mem::offset_of!(PassConstants, albedo), 192);
        assert_eq!(std::mem::offset_of!(PassConstants, light_count), 216);
        assert_eq!(std::mem::offset_of!(PassConstants, light_positions), 224);
        assert_eq!(std::mem::offset_of!(PassConstants, light_colors), 352);
        assert_eq!(std::mem::offset_of!(PassConstants, camera_pos), 480);
    }

    #[test]
    fn rig_covers_every_cube_corner() {
        let (positions, colors) = light_rig(3.0);
        let corners: HashSet<[i32; 3]> = positions
            .iter()
            .map(|p| [p[0] as i32, p[1] as i32, p[2] as i32])
            .collect();
        assert_eq!(corners.len(), MAX_LIGHTS);
        assert!(corners.iter().all(|c| c.iter().all(|v| v.abs() == 800)));
        assert!(colors.iter().all(|c| c[..3] == [3.0, 3.0, 3.0]));
    }

    #[test]
    fn intensity_scales_all_channels() {
        let c = PassConstants::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec3::ZERO,
            Material::default(),
            DEFAULT_LIGHT_INTENSITY,
        );
        assert_eq!(c.light_count, 8);
        assert_eq!(c.light_colors[5], [2_500_000.0, 2_500_000.0, 2_500_000.0, 1.0]);
        assert_eq!(c.roughness, 0.6);
    }
}
