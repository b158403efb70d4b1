//! Main-pass pipelines, one per primitive topology.

use super::{build_pipeline, pipeline_layout, shader, TargetFormats};
use crate::controls::PrimitiveMode;
use crate::error::Result;

pub struct MainPipelines {
    triangles: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
}

impl MainPipelines {
    pub fn new(
        device: &wgpu::Device,
        constants: &wgpu::BindGroupLayout,
        source: &str,
        targets: TargetFormats,
    ) -> Result<Self> {
        let module = shader::compile(device, "PBR WGSL", source)?;
        let layout = pipeline_layout(device, "PBR Pipeline Layout", constants);
        let build = |label, topology| build_pipeline(device, label, &layout, &module, topology, targets);

        Ok(Self {
            triangles: build("PBR Triangles Pipeline", wgpu::PrimitiveTopology::TriangleList)?,
            lines: build("PBR Lines Pipeline", wgpu::PrimitiveTopology::LineList)?,
            points: build("PBR Points Pipeline", wgpu::PrimitiveTopology::PointList)?,
        })
    }

    pub fn for_mode(&self, mode: PrimitiveMode) -> &wgpu::RenderPipeline {
        match mode {
            PrimitiveMode::Points => &self.points,
            PrimitiveMode::Wireframe => &self.lines,
            PrimitiveMode::Flat | PrimitiveMode::Smooth | PrimitiveMode::Triangles => &self.triangles,
        }
    }
}
