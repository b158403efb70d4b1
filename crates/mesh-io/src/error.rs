use std::path::PathBuf;

/// Failure to turn a file into a [`Scene`](crate::Scene).
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported model format '{extension}' ({path})")]
    Unsupported { path: PathBuf, extension: String },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: mesh '{mesh}' references vertex {index} but has {vertex_count}")]
    IndexOutOfRange {
        path: PathBuf,
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("{path} contains no parsable scene")]
    EmptyScene { path: PathBuf },

    #[cfg(feature = "gltf")]
    #[error("glTF import of {path} failed: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
}

/// Failure to re-export a model.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot re-read export source: {0}")]
    Import(#[from] ImportError),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
