//! Post-processing steps applied to a freshly parsed scene.

use crate::scene::{Mesh, Scene};

/// Post-processing requested at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Fan-triangulate every polygon with more than three corners.
    pub triangulate: bool,
    /// Compute smooth per-vertex normals for meshes that have none.
    pub generate_normals: bool,
    /// Convert from the right-handed source convention to left-handed
    /// (Z mirrored, winding reversed).
    pub left_handed: bool,
}

impl ImportOptions {
    /// The options the viewer renders with.
    pub const VIEWER: Self = Self {
        triangulate: true,
        generate_normals: true,
        left_handed: true,
    };

    /// No processing: the scene exactly as stored. Used for re-export.
    pub const RAW: Self = Self {
        triangulate: false,
        generate_normals: false,
        left_handed: false,
    };
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::VIEWER
    }
}

pub fn apply(scene: &mut Scene, options: ImportOptions) {
    for mesh in &mut scene.meshes {
        if options.triangulate {
            triangulate(mesh);
        }
        if options.generate_normals && !mesh.has_normals() {
            generate_normals(mesh);
        }
        if options.left_handed {
            make_left_handed(mesh);
        }
    }
}

/// Replaces each polygon by a fan of triangles around its first corner.
/// Degenerate faces (fewer than three corners) are removed.
pub fn triangulate(mesh: &mut Mesh) {
    if mesh.faces.iter().all(|f| f.len() == 3) {
        return;
    }
    let mut out = Vec::with_capacity(mesh.triangle_count());
    for face in &mesh.faces {
        for i in 1..face.len().saturating_sub(1) {
            out.push(vec![face[0], face[i], face[i + 1]]);
        }
    }
    mesh.faces = out;
}

/// Area-weighted smooth normals. Faces with a corner outside `positions`
/// contribute nothing.
pub fn generate_normals(mesh: &mut Mesh) {
    let mut acc = vec![[0.0f32; 3]; mesh.positions.len()];

    for face in &mesh.faces {
        if face.len() < 3 || face.iter().any(|&i| i as usize >= acc.len()) {
            continue;
        }
        let p = |i: u32| mesh.positions[i as usize];
        let (a, b, c) = (p(face[0]), p(face[1]), p(face[2]));
        let n = cross(sub(b, a), sub(c, a));
        for &i in face {
            let slot = &mut acc[i as usize];
            slot[0] += n[0];
            slot[1] += n[1];
            slot[2] += n[2];
        }
    }

    mesh.normals = acc.into_iter().map(normalize_or_up).collect();
}

pub fn make_left_handed(mesh: &mut Mesh) {
    for p in &mut mesh.positions {
        p[2] = -p[2];
    }
    for n in &mut mesh.normals {
        n[2] = -n[2];
    }
    for face in &mut mesh.faces {
        face.reverse();
    }
}

#[inline]
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize_or_up(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        // Isolated vertex.
        [0.0, 1.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh {
            name: "quad".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            faces: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        }
    }

    #[test]
    fn fan_triangulation_splits_quads() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn generated_normals_follow_winding() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        generate_normals(&mut mesh);
        for n in &mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6, "normal {n:?}");
        }
    }

    #[test]
    fn left_handed_conversion_mirrors_z_and_winding() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        generate_normals(&mut mesh);
        mesh.positions[0][2] = 2.0;
        make_left_handed(&mut mesh);

        assert_eq!(mesh.positions[0][2], -2.0);
        assert!((mesh.normals[0][2] + 1.0).abs() < 1e-6);
        assert_eq!(mesh.faces[0], vec![2, 1, 0]);
    }

    #[test]
    fn out_of_range_corner_does_not_panic() {
        let mut scene = Scene {
            meshes: vec![Mesh {
                name: "broken".into(),
                positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                faces: vec![vec![0, 1, 7], vec![0, 1, 2]],
                ..Default::default()
            }],
            ..Default::default()
        };
        apply(&mut scene, ImportOptions::VIEWER);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.normals.len(), 3);
        // Left-handed conversion flips the +Z face normal.
        assert!((mesh.normals[2][2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn existing_normals_are_kept() {
        let mut mesh = quad();
        mesh.normals = vec![[1.0, 0.0, 0.0]; 4];
        let mut scene = Scene {
            meshes: vec![mesh],
            ..Default::default()
        };
        apply(
            &mut scene,
            ImportOptions {
                left_handed: false,
                ..ImportOptions::VIEWER
            },
        );
        assert_eq!(scene.meshes[0].normals[3], [1.0, 0.0, 0.0]);
        assert_eq!(scene.meshes[0].faces.len(), 2);
    }
}
