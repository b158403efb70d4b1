//! The frame loop: owns the GPU context, render targets, pipelines, the ring
//! of per-frame resources and the active/pending model slots.
//!
//! Each [`Renderer::draw`] runs
//! 1. debounce (skip while the surface moves, commit a due resize),
//! 2. ring advance (blocks until the slot's last submission has completed),
//! 3. update (queue loads, commit/retire swaps, write pass constants),
//! 4. encode and 5. submit + present, tagging the slot with its fence value.

pub mod buffers;
pub mod context;
pub mod fence;
pub mod frame;
pub mod pipelines;
pub mod swap;
pub mod targets;
pub mod uniforms;

use self::{
    context::GfxContext,
    fence::QueueFence,
    frame::{FrameResources, FrameRing, FRAME_COUNT},
    pipelines::{grid::GridPipeline, pbr::MainPipelines, shader::ShaderSources},
    swap::{ModelSlots, SwapEvent},
    targets::Targets,
    uniforms::{Material, PassConstants},
};
use crate::{
    camera::Camera,
    config::Config,
    controls::{AxisMask, PrimitiveMode, SharedState, ViewerHandle},
    error::Result,
    loader::AssetLoader,
    model::{grid, Model},
};
use glam::Mat4;
use mesh_io::AssetImporter;
use std::sync::Arc;
use std::time::Instant;
use winit::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Paused, or the surface is being moved.
    Skipped,
    Rendered,
}

/// Values sampled from the shared state for one frame.
#[derive(Debug, Clone)]
pub struct FrameInputs {
    pub ring_index: usize,
    pub camera: Camera,
    pub mode: PrimitiveMode,
    pub axis_mask: AxisMask,
    pub light_intensity: f32,
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    fence: QueueFence,
    frames: FrameRing<FrameResources>,
    main: MainPipelines,
    grid_pipeline: GridPipeline,
    grid: Model,
    models: ModelSlots<Model>,
    loader: AssetLoader,
    shared: Arc<SharedState>,
    material: Material,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        config: &Config,
        importer: Arc<dyn AssetImporter>,
    ) -> Result<Self> {
        let gfx = GfxContext::new(window, config.msaa_samples).await?;
        let size = (gfx.config.width, gfx.config.height);
        let targets = Targets::new(&gfx.device, size, gfx.config.format, config.msaa_samples);

        let sources = ShaderSources::load(config.shader_dir.as_deref())?;
        let constants_layout = pipelines::pass_constants_layout(&gfx.device);
        let main = MainPipelines::new(&gfx.device, &constants_layout, &sources.pbr, targets.formats)?;
        let grid_pipeline =
            GridPipeline::new(&gfx.device, &constants_layout, &sources.grid, targets.formats)?;

        let frames = FrameRing::new(FRAME_COUNT, |i| {
            FrameResources::new(&gfx.device, &constants_layout, i)
        });
        let fence = QueueFence::new(gfx.device.clone());

        let grid = Model::from_line_batches(&gfx.device, &gfx.queue, "Reference Grid", grid::reference_grid());

        let mut camera = Camera::default();
        camera.set_viewport(size.0, size.1);
        let shared = Arc::new(SharedState::new(
            camera,
            config.light_intensity,
            config.debounce_window(),
        ));

        let loader = if config.sync_load {
            AssetLoader::inline(importer.clone())
        } else {
            AssetLoader::spawn(importer.clone()).unwrap_or_else(|err| {
                log::warn!("Cannot start loader thread ({err}); importing on the render thread");
                AssetLoader::inline(importer.clone())
            })
        };

        let mut models = ModelSlots::new();
        if let Some(path) = &config.model {
            match Model::load(&gfx.device, &gfx.queue, importer.as_ref(), path) {
                Ok(model) => {
                    log::info!("Loaded {}", model.name());
                    *shared.active.lock() = Some(model.info());
                    models.install(model);
                }
                Err(err) => log::error!("Failed to load {}: {}", path.display(), err),
            }
        }

        Ok(Self {
            gfx,
            targets,
            fence,
            frames,
            main,
            grid_pipeline,
            grid,
            models,
            loader,
            shared,
            material: Material::default(),
        })
    }

    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle::new(self.shared.clone(), self.loader.importer().clone())
    }

    /// Runs one frame. `overlay` records extra passes (the UI) onto the
    /// swap-chain image after the scene.
    pub fn draw(
        &mut self,
        now: Instant,
        overlay: impl FnOnce(&GfxContext, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    ) -> std::result::Result<FrameStatus, wgpu::SurfaceError> {
        let Some(inputs) = self.begin_frame(now) else {
            return Ok(FrameStatus::Skipped);
        };

        let frame = self.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.encode_scene(&swap_view, &inputs);
        overlay(&self.gfx, &mut encoder, &swap_view);
        self.end_frame(encoder, frame);
        Ok(FrameStatus::Rendered)
    }

    /// Debounce, ring advance and update. `None` means the frame is skipped.
    pub fn begin_frame(&mut self, now: Instant) -> Option<FrameInputs> {
        let (resize, snapshot) = {
            let mut view = self.shared.view.lock();
            if view.paused || view.debounce.should_skip(now) {
                return None;
            }
            let resize = view.debounce.take_due(now);
            if let Some((w, h)) = resize {
                view.camera.set_viewport(w, h);
            }
            (
                resize,
                (view.camera.clone(), view.mode, view.axis_mask, view.light_intensity),
            )
        };

        if let Some(size) = resize {
            self.apply_resize(size);
        }

        let ring_index = self.frames.advance(&self.fence);
        let (camera, mode, axis_mask, light_intensity) = snapshot;
        let inputs = FrameInputs {
            ring_index,
            camera,
            mode,
            axis_mask,
            light_intensity,
        };
        self.update(&inputs);
        Some(inputs)
    }

    fn apply_resize(&mut self, (width, height): (u32, u32)) {
        if self.targets.size == (width, height) {
            log::debug!("Resize to {width}x{height} matches current targets");
            return;
        }
        self.frames.flush(&self.fence);
        self.gfx.resize(winit::dpi::PhysicalSize::new(width, height));
        self.targets.resize(&self.gfx.device, (width, height));
        log::info!("Resized render targets to {width}x{height}");
    }

    fn update(&mut self, inputs: &FrameInputs) {
        let k = inputs.ring_index;

        if let Some(path) = self.shared.model_requests.take() {
            self.loader.submit(path);
        }

        match self.models.on_frame(k) {
            Some(SwapEvent::Committed) => {
                let info = self.models.active().map(Model::info);
                if let Some(info) = &info {
                    log::info!("Swap committed: {} is now active", info.name);
                }
                *self.shared.active.lock() = info;
            }
            Some(SwapEvent::Retired) => log::debug!("Previous model released"),
            None => {}
        }

        if self.models.can_stage() {
            if let Some(geometry) = self.loader.take_completed() {
                let model = Model::upload(&self.gfx.device, &self.gfx.queue, &geometry);
                log::info!("Swap staged: {} at frame slot {}", model.name(), k);
                if let Err(model) = self.models.stage(model, k) {
                    log::warn!("Dropping {}: swap slot busy", model.name());
                }
            }
        }

        let model_matrix = self
            .models
            .active()
            .map_or(Mat4::IDENTITY, Model::model_matrix);
        let constants = PassConstants::new(
            model_matrix,
            inputs.camera.view_matrix(),
            inputs.camera.projection_matrix(),
            inputs.camera.eye_position().as_vec3(),
            self.material,
            inputs.light_intensity,
        );
        self.frames.current().write(&self.gfx.queue, &constants);
    }

    /// Records the main pass for the current ring slot.
    pub fn encode_scene(
        &self,
        swap_view: &wgpu::TextureView,
        inputs: &FrameInputs,
    ) -> wgpu::CommandEncoder {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("Frame {} Encoder", inputs.ring_index)),
            });

        let [r, g, b] = grid::CLEAR_COLOR.map(f64::from);
        let (view, resolve_target) = self.targets.color_attachment(swap_view);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.frames.current().bind_group, &[]);

            if let Some(model) = self.models.active() {
                pass.set_pipeline(self.main.for_mode(inputs.mode));
                model.draw(&mut pass, inputs.mode);
            }

            pass.set_pipeline(&self.grid_pipeline.pipeline);
            self.grid.draw_grid(&mut pass, inputs.axis_mask);
        }

        encoder
    }

    /// Submits, presents and tags the current slot with the new fence value.
    pub fn end_frame(&mut self, encoder: wgpu::CommandEncoder, frame: wgpu::SurfaceTexture) {
        self.gfx.queue.submit(std::iter::once(encoder.finish()));
        let value = self.fence.signal(&self.gfx.queue);
        self.frames.mark_submitted(value);
        frame.present();
    }

    /// Blocks until the GPU has finished every submitted frame.
    pub fn flush(&self) {
        self.frames.flush(&self.fence);
    }
}
