//! Shader sources and validated creation of GPU objects.

use crate::error::{Result, ViewerError};
use std::borrow::Cow;
use std::path::Path;

pub const PBR_WGSL: &str = include_str!("../../../shaders/pbr.wgsl");
pub const GRID_WGSL: &str = include_str!("../../../shaders/grid.wgsl");

pub const PBR_FILE: &str = "pbr.wgsl";
pub const GRID_FILE: &str = "grid.wgsl";

/// WGSL text for the two programs.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub pbr: Cow<'static, str>,
    pub grid: Cow<'static, str>,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ShaderSources {
    pub fn embedded() -> Self {
        Self {
            pbr: Cow::Borrowed(PBR_WGSL),
            grid: Cow::Borrowed(GRID_WGSL),
        }
    }

    /// Reads `pbr.wgsl` and `grid.wgsl` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .map(Cow::Owned)
                .map_err(|source| ViewerError::ShaderSource { path, source })
        };
        let sources = Self {
            pbr: read(PBR_FILE)?,
            grid: read(GRID_FILE)?,
        };
        log::info!("Using shaders from {}", dir.display());
        Ok(sources)
    }

    pub fn load(dir: Option<&Path>) -> Result<Self> {
        dir.map_or_else(|| Ok(Self::embedded()), Self::from_dir)
    }
}

/// Runs `create` inside a validation error scope and returns the error text
/// wgpu reports, if any.
pub fn validated<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> std::result::Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => Err(err.to_string()),
    }
}

/// Compiles WGSL, surfacing the compiler diagnostic on failure.
pub fn compile(device: &wgpu::Device, label: &str, source: &str) -> Result<wgpu::ShaderModule> {
    validated(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
    .map_err(|diagnostic| ViewerError::ShaderCompile {
        label: label.to_owned(),
        diagnostic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass_constants_block(source: &str) -> &str {
        let start = source.find("struct PassConstants").unwrap();
        let end = start + source[start..].find("};").unwrap();
        &source[start..end]
    }

    #[test]
    fn both_programs_declare_the_same_constants() {
        assert_eq!(pass_constants_block(PBR_WGSL), pass_constants_block(GRID_WGSL));
    }

    #[test]
    fn entry_points_exist() {
        for source in [PBR_WGSL, GRID_WGSL] {
            assert!(source.contains("@vertex") && source.contains("fn vs_main"));
            assert!(source.contains("@fragment") && source.contains("fn fs_main"));
            assert!(source.contains("@group(0) @binding(0)"));
        }
        assert!(PBR_WGSL.contains("fn distribution_ggx"));
        assert!(PBR_WGSL.contains("fn fresnel_schlick"));
    }

    #[test]
    fn missing_shader_dir_names_the_file() {
        let dir = std::env::temp_dir().join("model_viewer_no_such_shader_dir");
        match ShaderSources::from_dir(&dir) {
            Err(ViewerError::ShaderSource { path, .. }) => assert_eq!(path, dir.join(PBR_FILE)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn shaders_load_from_a_directory() {
        let dir = std::env::temp_dir().join(format!("model_viewer_shaders_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PBR_FILE), "// pbr").unwrap();
        std::fs::write(dir.join(GRID_FILE), "// grid").unwrap();

        let sources = ShaderSources::load(Some(&dir)).unwrap();
        assert_eq!(sources.pbr, "// pbr");
        assert_eq!(sources.grid, "// grid");
        let _ = std::fs::remove_dir_all(dir);
    }
}
