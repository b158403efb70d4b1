//! Fatal (startup) errors. Recoverable asset failures use
//! [`mesh_io::ImportError`] / [`mesh_io::ExportError`] and never reach here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create render surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no GPU adapter compatible with the surface")]
    NoAdapter,

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("cannot read shader source {path}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{label}' failed to compile:\n{diagnostic}")]
    ShaderCompile { label: String, diagnostic: String },

    #[error("pipeline '{label}' could not be created:\n{diagnostic}")]
    Pipeline { label: String, diagnostic: String },

    #[error("{samples}x multisampling is not supported for {format:?}")]
    Multisample {
        samples: u32,
        format: wgpu::TextureFormat,
    },
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
