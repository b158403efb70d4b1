//! Size-dependent render targets: the multisampled colour target (resolved
//! into the swap-chain image) and the depth buffer.

use super::pipelines::TargetFormats;
use crate::error::{Result, ViewerError};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct Targets {
    // Keep the textures alive for the lifetime of the views.
    _color_tex: Option<wgpu::Texture>,
    _depth_tex: wgpu::Texture,

    /// Offscreen multisampled colour; `None` when rendering single-sampled
    /// straight into the swap-chain image.
    pub color: Option<wgpu::TextureView>,
    pub depth: wgpu::TextureView,

    pub formats: TargetFormats,
    pub size: (u32, u32),
}

impl Targets {
    pub fn new(
        device: &wgpu::Device,
        size: (u32, u32),
        color_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let tex_size = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };

        let create_tex = |label: &str, format| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: tex_size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
        };

        let color_tex = (sample_count > 1).then(|| create_tex("Offscreen MSAA Colour", color_format));
        let depth_tex = create_tex("Scene Depth", DEPTH_FORMAT);

        Self {
            color: color_tex
                .as_ref()
                .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default())),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            formats: TargetFormats {
                color: color_format,
                depth: DEPTH_FORMAT,
                sample_count,
            },
            size: (tex_size.width, tex_size.height),
        }
    }

    /// Recreates every target at the new size.
    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        *self = Self::new(device, size, self.formats.color, self.formats.sample_count);
    }

    /// `(view, resolve_target)` for the colour attachment of the main pass.
    pub fn color_attachment<'a>(
        &'a self,
        swap_view: &'a wgpu::TextureView,
    ) -> (&'a wgpu::TextureView, Option<&'a wgpu::TextureView>) {
        match &self.color {
            Some(msaa) => (msaa, Some(swap_view)),
            None => (swap_view, None),
        }
    }
}

/// Fails if the adapter cannot multisample `format` at `samples`.
pub fn check_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    samples: u32,
) -> Result<()> {
    let flags = adapter.get_texture_format_features(format).flags;
    let depth_flags = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
    if samples == 1
        || (flags.sample_count_supported(samples) && depth_flags.sample_count_supported(samples))
    {
        Ok(())
    } else {
        Err(ViewerError::Multisample { samples, format })
    }
}
