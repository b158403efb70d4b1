//! Line pipeline for the reference grid and axis indicators.

use super::{build_pipeline, pipeline_layout, shader, TargetFormats};
use crate::error::Result;

pub struct GridPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl GridPipeline {
    pub fn new(
        device: &wgpu::Device,
        constants: &wgpu::BindGroupLayout,
        source: &str,
        targets: TargetFormats,
    ) -> Result<Self> {
        let module = shader::compile(device, "Grid WGSL", source)?;
        let layout = pipeline_layout(device, "Grid Pipeline Layout", constants);
        let pipeline = build_pipeline(
            device,
            "Grid Pipeline",
            &layout,
            &module,
            wgpu::PrimitiveTopology::LineList,
            targets,
        )?;
        Ok(Self { pipeline })
    }
}
