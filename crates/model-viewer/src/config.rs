use crate::renderer::uniforms::DEFAULT_LIGHT_INTENSITY;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

/// `model-viewer` - An interactive viewer for 3D mesh assets.
///
/// Loads a model, renders it with physically based shading over a reference
/// grid, and lets the user orbit, pan and zoom around it, switch primitive
/// modes and swap models at runtime.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Model to load at startup.
    ///
    /// The viewer starts with only the reference grid when this is omitted
    /// or the file cannot be imported.
    #[arg(long, env = "MODEL_VIEWER_MODEL")]
    pub model: Option<PathBuf>,

    /// Initial logical window width.
    #[arg(long, default_value_t = 1400)]
    pub width: u32,

    /// Initial logical window height.
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Directory containing `pbr.wgsl` and `grid.wgsl`.
    ///
    /// When set, shader source text is read from here at startup instead of
    /// using the copies embedded in the binary.
    #[arg(long, env = "MODEL_VIEWER_SHADER_DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Sample count of the offscreen colour and depth targets (1 or 4).
    #[arg(long, default_value_t = 4, value_parser = parse_sample_count)]
    pub msaa_samples: u32,

    /// Initial scale applied to every light colour channel.
    #[arg(long, default_value_t = DEFAULT_LIGHT_INTENSITY)]
    pub light_intensity: f32,

    /// Idle time after the last window move or resize before a resize is
    /// committed, in milliseconds.
    #[arg(long, default_value_t = 150)]
    pub debounce_ms: u64,

    /// Import models on the render thread instead of the loader thread.
    #[arg(long)]
    pub sync_load: bool,
}

fn parse_sample_count(s: &str) -> Result<u32, String> {
    match s.trim() {
        "1" => Ok(1),
        "4" => Ok(4),
        other => Err(format!("expected 1 or 4, got '{other}'")),
    }
}

impl Config {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse_from(["model-viewer"]);
        assert_eq!(config.model, None);
        assert_eq!((config.width, config.height), (1400, 800));
        assert_eq!(config.msaa_samples, 4);
        assert_eq!(config.light_intensity, DEFAULT_LIGHT_INTENSITY);
        assert_eq!(config.debounce_window(), Duration::from_millis(150));
        assert!(!config.sync_load);
    }

    #[test]
    fn rejects_unsupported_sample_counts() {
        assert!(Config::try_parse_from(["model-viewer", "--msaa-samples", "8"]).is_err());
        let config = Config::try_parse_from(["model-viewer", "--msaa-samples", "1"]);
        assert_eq!(config.map(|c| c.msaa_samples).ok(), Some(1));
    }
}
