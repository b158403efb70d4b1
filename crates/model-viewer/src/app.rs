use crate::{
    camera::CameraController,
    config::Config,
    controls::{PrimitiveMode, ViewerHandle},
    error::Result,
    renderer::{FrameStatus, Renderer},
    ui::{UiAction, UiLayer},
};
use mesh_io::AssetImporter;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App {
    pub renderer: Renderer,
    pub viewer: ViewerHandle,
    pub camera_controller: CameraController,
    pub ui: UiLayer,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        config: &Config,
        importer: Arc<dyn AssetImporter>,
    ) -> Result<Self> {
        let renderer = Renderer::new(window.clone(), config, importer).await?;
        let viewer = renderer.handle();
        let ui = UiLayer::new(&window, &renderer.gfx);

        Ok(Self {
            renderer,
            viewer,
            camera_controller: CameraController::new(),
            ui,
        })
    }

    /// Handles a window event; returns true when egui consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        // Geometry changes always reach the viewer, even over UI widgets.
        match event {
            WindowEvent::Resized(size) => self.viewer.on_resize(size.width, size.height),
            WindowEvent::Moved(_) => self.viewer.on_surface_moved(),
            _ => {}
        }

        if self.ui.on_window_event(window, event) {
            return true;
        }

        self.camera_controller.handle_event(event, &self.viewer);
        false
    }

    /// Keyboard shortcuts: J/K/L switch primitive mode, G pauses rendering,
    /// Escape quits.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Flow {
        if event.state != ElementState::Pressed || event.repeat || self.ui.wants_keyboard() {
            return Flow::Continue;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return Flow::Exit,
            PhysicalKey::Code(KeyCode::KeyJ) => self.viewer.set_primitive_mode(PrimitiveMode::Triangles),
            PhysicalKey::Code(KeyCode::KeyK) => self.viewer.set_primitive_mode(PrimitiveMode::Wireframe),
            PhysicalKey::Code(KeyCode::KeyL) => self.viewer.set_primitive_mode(PrimitiveMode::Points),
            PhysicalKey::Code(KeyCode::KeyG) => {
                let paused = self.viewer.toggle_pause();
                log::info!("Rendering {}", if paused { "paused" } else { "resumed" });
            }
            _ => {}
        }
        Flow::Continue
    }

    pub fn render(&mut self, window: &Window) -> std::result::Result<Flow, wgpu::SurfaceError> {
        let (action, prepared) = self.ui.run(window, &self.viewer);

        let ui = &mut self.ui;
        let status = self
            .renderer
            .draw(Instant::now(), |gfx, encoder, view| ui.paint(gfx, encoder, view, prepared))?;

        if status == FrameStatus::Skipped {
            log::trace!("Frame skipped");
        }

        Ok(match action {
            Some(UiAction::Quit) => Flow::Exit,
            None => Flow::Continue,
        })
    }
}
