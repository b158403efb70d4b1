//! CPU-side model geometry: everything a [`super::Model`] uploads, built
//! without touching the GPU so it can be produced on the loader thread.

use glam::Vec3;
use mesh_io::{AssetImporter, ImportError, ImportOptions, Scene};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The largest axis of every model is scaled to this many world units.
pub const REFERENCE_LENGTH: f32 = 800.0;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

const _: [(); 36] = [(); core::mem::size_of::<Vertex>()];

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, normal, color }
    }
}

/// Per-axis bounds. An empty set has `min > max`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Extents {
    pub const EMPTY: Self = Self {
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
    };

    pub fn include(mut self, p: [f32; 3]) -> Self {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
        self
    }

    pub fn union(mut self, other: Self) -> Self {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
        self
    }

    /// Parallel min/max reduction over all vertex positions.
    pub fn of_vertices(vertices: &[Vertex]) -> Self {
        vertices
            .par_iter()
            .fold(|| Self::EMPTY, |acc, v| acc.include(v.position))
            .reduce(|| Self::EMPTY, Self::union)
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn span(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        Vec3::from(self.max) - Vec3::from(self.min)
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (Vec3::from(self.max) + Vec3::from(self.min)) * 0.5
    }

    /// Uniform scale mapping the largest span onto [`REFERENCE_LENGTH`].
    /// Degenerate bounds scale by 1.
    pub fn uniform_scale(&self) -> f32 {
        let span = self.span().max_element();
        if span > 0.0 && span.is_finite() {
            REFERENCE_LENGTH / span
        } else {
            1.0
        }
    }
}

/// One mesh's run inside the shared vertex buffer. Indices are relative to
/// `base_vertex`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubMesh {
    pub base_vertex: u32,
    pub triangles: Vec<u32>,
    /// Unique edges, two indices per edge.
    pub edges: Vec<u32>,
}

#[derive(Clone, Debug)]
pub struct ModelGeometry {
    /// File the geometry was imported from; `None` for procedural data.
    pub source: Option<PathBuf>,
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub submeshes: Vec<SubMesh>,
    /// Three unshared vertices per triangle carrying the face normal.
    pub flat_vertices: Vec<Vertex>,
    pub extents: Extents,
    pub scale: f32,
}

impl ModelGeometry {
    /// Imports `path` with triangulation, normal generation and left-handed
    /// conversion, then flattens the scene.
    pub fn load(importer: &dyn AssetImporter, path: &Path) -> Result<Self, ImportError> {
        let scene = importer.import(path, ImportOptions::VIEWER)?;
        if scene.meshes.is_empty() {
            return Err(ImportError::EmptyScene {
                path: path.to_path_buf(),
            });
        }
        Ok(Self::from_scene(&scene, Some(path.to_path_buf())))
    }

    /// Walks the node hierarchy depth-first, appending one [`SubMesh`] per
    /// mesh reference.
    pub fn from_scene(scene: &Scene, source: Option<PathBuf>) -> Self {
        let mut vertices = Vec::with_capacity(scene.vertex_count());
        let mut submeshes = Vec::new();

        for mesh in scene.meshes_in_traversal_order() {
            let base_vertex = vertices.len() as u32;
            let normals = mesh.has_normals().then_some(&mesh.normals);

            vertices.extend(mesh.positions.iter().enumerate().map(|(i, &p)| {
                let normal = normals.map_or([0.0, 1.0, 0.0], |n| n[i]);
                let color = mesh
                    .colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .unwrap_or(WHITE);
                Vertex::new(p, normal, color)
            }));

            let vertex_count = mesh.positions.len() as u32;
            let triangles: Vec<u32> = mesh
                .faces
                .iter()
                .filter(|face| face.iter().all(|&i| i < vertex_count))
                .flat_map(|face| {
                    (1..face.len().saturating_sub(1))
                        .flat_map(move |k| [face[0], face[k], face[k + 1]])
                })
                .collect();
            let edges = unique_edges(&triangles);

            submeshes.push(SubMesh {
                base_vertex,
                triangles,
                edges,
            });
        }

        let flat_vertices = flat_stream(&vertices, &submeshes);
        let extents = Extents::of_vertices(&vertices);
        let name = source
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_owned());

        Self {
            source,
            name,
            vertices,
            submeshes,
            flat_vertices,
            scale: extents.uniform_scale(),
            extents,
        }
    }

    /// Explicit line data, one [`SubMesh`] per batch with the batch indices
    /// as its edges. Used for fixed geometry such as the reference grid.
    pub fn from_line_batches(name: &str, batches: Vec<LineBatch>) -> Self {
        let mut vertices = Vec::new();
        let mut submeshes = Vec::with_capacity(batches.len());
        for batch in batches {
            submeshes.push(SubMesh {
                base_vertex: vertices.len() as u32,
                triangles: Vec::new(),
                edges: batch.indices,
            });
            vertices.extend(batch.vertices);
        }

        Self {
            source: None,
            name: name.to_owned(),
            extents: Extents::of_vertices(&vertices),
            vertices,
            submeshes,
            flat_vertices: Vec::new(),
            scale: 1.0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.triangles.len() / 3).sum()
    }
}

/// Vertices plus line-list indices into them.
#[derive(Clone, Debug, Default)]
pub struct LineBatch {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl LineBatch {
    pub fn push_line(&mut self, from: [f32; 3], to: [f32; 3], color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        let up = [0.0, 1.0, 0.0];
        self.vertices.push(Vertex::new(from, up, color));
        self.vertices.push(Vertex::new(to, up, color));
        self.indices.extend([base, base + 1]);
    }
}

/// Every triangle edge exactly once, as `(min, max)` index pairs in first-seen
/// order.
pub fn unique_edges(triangles: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::with_capacity(triangles.len());
    let mut edges = Vec::with_capacity(triangles.len());
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.extend([key.0, key.1]);
            }
        }
    }
    edges
}

/// Expands indexed triangles into unshared vertices with the geometric face
/// normal `(p2 - p1) x (p3 - p1)`.
pub fn flat_stream(vertices: &[Vertex], submeshes: &[SubMesh]) -> Vec<Vertex> {
    submeshes
        .iter()
        .flat_map(|sub| {
            let base = sub.base_vertex as usize;
            sub.triangles.chunks_exact(3).flat_map(move |tri| {
                let corner = |k: usize| vertices[base + tri[k] as usize];
                let (a, b, c) = (corner(0), corner(1), corner(2));
                let (pa, pb, pc) = (
                    Vec3::from(a.position),
                    Vec3::from(b.position),
                    Vec3::from(c.position),
                );
                let normal = (pb - pa).cross(pc - pa).to_array();
                [a, b, c].map(|v| Vertex::new(v.position, normal, v.color))
            })
        })
        .collect()
}
