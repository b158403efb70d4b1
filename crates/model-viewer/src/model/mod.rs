//! GPU-resident models.
//!
//! A [`Model`] is immutable once built: [`geometry`] produces the CPU-side
//! data (on any thread), [`Model::upload`] copies it to device-local buffers
//! and only returns once the copy has been submitted.

pub mod geometry;
pub mod grid;

use self::geometry::{Extents, LineBatch, ModelGeometry};
use crate::controls::{ActiveModelInfo, AxisMask, PrimitiveMode};
use crate::renderer::buffers::{IndexBuffer, UploadBatch, VertexBuffer};
use glam::Mat4;
use mesh_io::{AssetImporter, ExportError, ImportError};
use std::path::{Path, PathBuf};

struct GpuSubMesh {
    base_vertex: i32,
    triangles: Option<IndexBuffer>,
    edges: Option<IndexBuffer>,
}

pub struct Model {
    name: String,
    source: Option<PathBuf>,
    vertices: VertexBuffer,
    flat_vertices: Option<VertexBuffer>,
    submeshes: Vec<GpuSubMesh>,
    extents: Extents,
    scale: f32,
    triangle_count: usize,
}

impl Model {
    /// Imports and uploads `path` on the calling thread.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        importer: &dyn AssetImporter,
        path: &Path,
    ) -> Result<Self, ImportError> {
        let geometry = ModelGeometry::load(importer, path)?;
        Ok(Self::upload(device, queue, &geometry))
    }

    /// Fixed line geometry, drawn through [`Model::draw_grid`].
    pub fn from_line_batches(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        batches: Vec<LineBatch>,
    ) -> Self {
        Self::upload(device, queue, &ModelGeometry::from_line_batches(name, batches))
    }

    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, geometry: &ModelGeometry) -> Self {
        let name = &geometry.name;
        let mut batch = UploadBatch::new(device, &format!("{name} Upload"));

        let vertices = batch.vertices(&format!("{name} Vertices"), &geometry.vertices);
        let flat_vertices = (!geometry.flat_vertices.is_empty())
            .then(|| batch.vertices(&format!("{name} Flat Vertices"), &geometry.flat_vertices));

        let submeshes = geometry
            .submeshes
            .iter()
            .enumerate()
            .map(|(i, sub)| GpuSubMesh {
                base_vertex: sub.base_vertex as i32,
                triangles: (!sub.triangles.is_empty())
                    .then(|| batch.indices(&format!("{name}[{i}] Triangles"), &sub.triangles)),
                edges: (!sub.edges.is_empty())
                    .then(|| batch.indices(&format!("{name}[{i}] Edges"), &sub.edges)),
            })
            .collect();

        batch.submit(queue);

        Self {
            name: geometry.name.clone(),
            source: geometry.source.clone(),
            vertices,
            flat_vertices,
            submeshes,
            extents: geometry.extents,
            scale: geometry.scale,
            triangle_count: geometry.triangle_count(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(glam::Vec3::splat(self.scale))
    }

    pub fn info(&self) -> ActiveModelInfo {
        ActiveModelInfo {
            name: self.name.clone(),
            source: self.source.clone(),
            vertex_count: self.vertices.count() as usize,
            triangle_count: self.triangle_count,
            extents: self.extents,
            scale: self.scale,
        }
    }

    /// Issues the draws for `mode`. The caller has bound the pipeline whose
    /// topology matches [`PrimitiveMode`].
    pub fn draw<'p>(&'p self, pass: &mut wgpu::RenderPass<'p>, mode: PrimitiveMode) {
        match mode {
            PrimitiveMode::Points => {
                self.vertices.bind(pass, 0);
                pass.draw(0..self.vertices.count(), 0..1);
            }
            PrimitiveMode::Flat => {
                if let Some(flat) = &self.flat_vertices {
                    flat.bind(pass, 0);
                    pass.draw(0..flat.count(), 0..1);
                }
            }
            PrimitiveMode::Wireframe => {
                self.vertices.bind(pass, 0);
                for sub in &self.submeshes {
                    draw_indexed(pass, sub.edges.as_ref(), sub.base_vertex);
                }
            }
            PrimitiveMode::Smooth | PrimitiveMode::Triangles => {
                self.vertices.bind(pass, 0);
                for sub in &self.submeshes {
                    draw_indexed(pass, sub.triangles.as_ref(), sub.base_vertex);
                }
            }
        }
    }

    /// Draws the line batches; the first three are the x, y and z axes and
    /// are gated by `mask`, any further batch is always drawn.
    pub fn draw_grid<'p>(&'p self, pass: &mut wgpu::RenderPass<'p>, mask: AxisMask) {
        let axes = mask.as_array();
        self.vertices.bind(pass, 0);
        for (i, sub) in self.submeshes.iter().enumerate() {
            if axes.get(i).copied().unwrap_or(true) {
                draw_indexed(pass, sub.edges.as_ref(), sub.base_vertex);
            }
        }
    }
}

fn draw_indexed<'p>(pass: &mut wgpu::RenderPass<'p>, indices: Option<&'p IndexBuffer>, base_vertex: i32) {
    if let Some(indices) = indices {
        indices.bind(pass);
        pass.draw_indexed(0..indices.count(), base_vertex, 0..1);
    }
}

/// Re-reads a model's source file and writes it to `dest` as OBJ.
/// Models without a source file (procedural geometry) have nothing to export.
pub fn export_source(
    importer: &dyn AssetImporter,
    source: Option<&Path>,
    dest: &Path,
) -> Result<(), ExportError> {
    match source {
        Some(source) => importer.export_obj(source, dest),
        None => {
            log::warn!("Nothing to export to {}: model has no source file", dest.display());
            Ok(())
        }
    }
}
