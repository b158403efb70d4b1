//! Entry point for the model viewer.

use anyhow::Result;
use clap::Parser;
use mesh_io::Importer;
use model_viewer::{
    app::{App, Flow},
    config::Config,
};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Model Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .build(&event_loop)?,
    );

    // Any GPU setup failure (device, pipelines, shaders) aborts here.
    let mut app = pollster::block_on(App::new(window.clone(), &config, Arc::new(Importer)))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if app.handle_event(&window, &event) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } => {
                        if app.handle_key(&event) == Flow::Exit {
                            elwt.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => match app.render(&window) {
                        Ok(Flow::Exit) => elwt.exit(),
                        Ok(Flow::Continue) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            app.renderer.gfx.reconfigure();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU out of memory – exiting.");
                            elwt.exit();
                        }
                        Err(e) => log::error!("Render error: {:?}", e),
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                app.renderer.flush();
            }
            _ => {}
        }
    })?;

    Ok(())
}
