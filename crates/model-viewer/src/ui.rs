//! egui glue: menus, light slider and status label. All actions go through
//! [`ViewerHandle`]; nothing here touches renderer state directly.

use crate::controls::{PresetView, PrimitiveMode, ViewerHandle};
use crate::renderer::context::GfxContext;
use crate::renderer::uniforms::MAX_LIGHT_INTENSITY;
use std::path::PathBuf;
use winit::{event::WindowEvent, window::Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Quit,
}

/// Path prompts standing in for native file dialogs. An empty path is
/// treated like a cancelled dialog.
#[derive(Default)]
struct Prompts {
    open_path: String,
    save_path: String,
    show_open: bool,
    show_save: bool,
    message: Option<String>,
}

/// Tessellated UI for one frame.
pub struct PreparedUi {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    pixels_per_point: f32,
}

/// Texture updates not yet uploaded. egui emits each delta once, so deltas
/// from frames that were never painted are merged into the next paint.
#[derive(Default)]
struct TextureBacklog {
    pending: egui::TexturesDelta,
}

impl TextureBacklog {
    fn push(&mut self, delta: egui::TexturesDelta) {
        self.pending.append(delta);
    }

    fn take(&mut self) -> egui::TexturesDelta {
        std::mem::take(&mut self.pending)
    }
}

pub struct UiLayer {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    textures: TextureBacklog,
    prompts: Prompts,
}

impl UiLayer {
    pub fn new(window: &Window, gfx: &GfxContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(ctx.clone(), ctx.viewport_id(), window, None, None);
        let renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);
        Self {
            ctx,
            state,
            renderer,
            textures: TextureBacklog::default(),
            prompts: Prompts::default(),
        }
    }

    /// Returns true when egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn wants_keyboard(&self) -> bool {
        self.ctx.wants_keyboard_input()
    }

    /// Builds this frame's UI and applies its actions to `viewer`.
    pub fn run(&mut self, window: &Window, viewer: &ViewerHandle) -> (Option<UiAction>, PreparedUi) {
        let input = self.state.take_egui_input(window);
        self.ctx.begin_frame(input);
        let action = draw(&self.ctx, &mut self.prompts, viewer);
        let output = self.ctx.end_frame();

        self.state.handle_platform_output(window, output.platform_output);
        let pixels_per_point = self.ctx.pixels_per_point();
        let paint_jobs = self.ctx.tessellate(output.shapes, pixels_per_point);
        self.textures.push(output.textures_delta);

        (
            action,
            PreparedUi {
                paint_jobs,
                pixels_per_point,
            },
        )
    }

    /// Paints `prepared` over the swap-chain image, uploading every texture
    /// change since the last paint.
    pub fn paint(
        &mut self,
        gfx: &GfxContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        prepared: PreparedUi,
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gfx.config.width, gfx.config.height],
            pixels_per_point: prepared.pixels_per_point,
        };

        let textures = self.textures.take();
        for (id, delta) in &textures.set {
            self.renderer.update_texture(&gfx.device, &gfx.queue, *id, delta);
        }
        self.renderer
            .update_buffers(&gfx.device, &gfx.queue, encoder, &prepared.paint_jobs, &screen);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut pass, &prepared.paint_jobs, &screen);
        }

        for id in &textures.free {
            self.renderer.free_texture(id);
        }
    }
}

fn draw(ctx: &egui::Context, prompts: &mut Prompts, viewer: &ViewerHandle) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Switch Model…").clicked() {
                    prompts.show_open = true;
                    ui.close_menu();
                }
                if ui.button("Save Model As…").clicked() {
                    prompts.show_save = true;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    action = Some(UiAction::Quit);
                    ui.close_menu();
                }
            });

            ui.menu_button("Display", |ui| {
                let mut mode = viewer.primitive_mode();
                for candidate in PrimitiveMode::ALL {
                    if ui.radio_value(&mut mode, candidate, candidate.label()).clicked() {
                        viewer.set_primitive_mode(mode);
                        ui.close_menu();
                    }
                }
            });

            ui.menu_button("View", |ui| {
                for preset in PresetView::ALL {
                    if ui.button(preset.label()).clicked() {
                        viewer.set_preset_view(preset);
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(viewer.status_line());
            if viewer.load_pending() {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut intensity = viewer.light_intensity();
                let slider = egui::Slider::new(&mut intensity, 0.0..=MAX_LIGHT_INTENSITY)
                    .integer()
                    .text("Light");
                if ui.add(slider).changed() {
                    viewer.set_light_intensity(intensity);
                }
            });
        });
    });

    open_prompt(ctx, prompts, viewer);
    save_prompt(ctx, prompts, viewer);

    action
}

fn open_prompt(ctx: &egui::Context, prompts: &mut Prompts, viewer: &ViewerHandle) {
    let mut open = prompts.show_open;
    let mut submitted = false;
    egui::Window::new("Switch Model")
        .open(&mut open)
        .collapsible(false)
        .show(ctx, |ui| {
            let extensions: Vec<_> = mesh_io::supported_extensions().collect();
            ui.label(format!("Supported: {}", extensions.join(", ")));
            let response = ui.text_edit_singleline(&mut prompts.open_path);
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Open").clicked() || enter {
                submitted = true;
            }
        });

    if submitted {
        let path = prompts.open_path.trim();
        if !path.is_empty() {
            viewer.request_model_swap(PathBuf::from(path));
        }
        open = false;
    }
    prompts.show_open = open;
}

fn save_prompt(ctx: &egui::Context, prompts: &mut Prompts, viewer: &ViewerHandle) {
    let mut open = prompts.show_save;
    let mut submitted = false;
    egui::Window::new("Save Model As")
        .open(&mut open)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.label("Destination (.obj)");
            let response = ui.text_edit_singleline(&mut prompts.save_path);
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Save").clicked() || enter {
                submitted = true;
            }
            if let Some(message) = &prompts.message {
                ui.colored_label(egui::Color32::LIGHT_RED, message);
            }
        });

    if submitted {
        let path = prompts.save_path.trim();
        if path.is_empty() {
            open = false;
        } else {
            match viewer.request_save_active(&PathBuf::from(path)) {
                Ok(()) => {
                    prompts.message = None;
                    open = false;
                }
                Err(err) => {
                    log::error!("Failed to save model to {path}: {err}");
                    prompts.message = Some(err.to_string());
                }
            }
        }
    }
    prompts.show_save = open;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ctx: &egui::Context, text: &str) -> egui::TexturesDelta {
        ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| ui.label(text));
        })
        .textures_delta
    }

    #[test]
    fn font_atlas_survives_unpainted_frames() {
        let ctx = egui::Context::default();
        let mut backlog = TextureBacklog::default();

        // Two frames built but never painted.
        backlog.push(frame(&ctx, "first"));
        backlog.push(frame(&ctx, "second ÄÖÜ"));

        let textures = backlog.take();
        assert!(textures
            .set
            .iter()
            .any(|(id, delta)| *id == egui::TextureId::default() && delta.is_whole()));

        let again = backlog.take();
        assert!(again.set.is_empty() && again.free.is_empty());
    }
}
