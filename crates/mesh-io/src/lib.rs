//! mesh_io: the asset boundary of the model viewer.
//!
//! - Reads 3D model files into a [`Scene`]: a node hierarchy whose nodes
//!   reference polygon meshes (positions, normals, optional colours).
//! - Applies the post-processing the renderer asks for ([`ImportOptions`]):
//!   triangulation, normal generation, left-handed conversion.
//! - Writes any scene back out as Wavefront OBJ, the fixed interchange format.
//!
//! The set of recognised extensions is fixed (see [`Format`]). OBJ and glTF
//! are decoded in-process; other recognised formats are reported as
//! [`ImportError::Unsupported`] by the built-in [`Importer`]. Callers that
//! have a richer backend plug it in through [`AssetImporter`].

pub mod error;
#[cfg(feature = "gltf")]
pub mod gltf_read;
pub mod obj;
pub mod process;
pub mod scene;

pub use error::{ExportError, ImportError};
pub use process::ImportOptions;
pub use scene::{Mesh, Node, Scene};

use std::path::Path;

/// Model formats the viewer offers in its open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Obj,
    Fbx,
    ThreeD,
    Blend,
    Dae,
    Gltf,
    Dxf,
    M3d,
    Ogex,
    Raw,
    X,
    Smd,
    X3d,
}

impl Format {
    pub const ALL: [Format; 13] = [
        Format::Obj,
        Format::Fbx,
        Format::ThreeD,
        Format::Blend,
        Format::Dae,
        Format::Gltf,
        Format::Dxf,
        Format::M3d,
        Format::Ogex,
        Format::Raw,
        Format::X,
        Format::Smd,
        Format::X3d,
    ];

    /// Lower-case file extensions mapping to this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Obj => &["obj"],
            Format::Fbx => &["fbx"],
            Format::ThreeD => &["3d"],
            Format::Blend => &["blend"],
            Format::Dae => &["dae"],
            Format::Gltf => &["gltf", "glb"],
            Format::Dxf => &["dxf"],
            Format::M3d => &["m3d"],
            Format::Ogex => &["ogex"],
            Format::Raw => &["raw"],
            Format::X => &["x"],
            Format::Smd => &["smd"],
            Format::X3d => &["x3d"],
        }
    }

    /// Case-insensitive extension lookup (`"glTF"` → [`Format::Gltf`]).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Every recognised extension, for file filters.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    Format::ALL.into_iter().flat_map(|f| f.extensions().iter().copied())
}

/// The import/export boundary the viewer depends on.
pub trait AssetImporter: Send + Sync {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<Scene, ImportError>;

    /// Re-reads `source` without post-processing and writes it to `dest` as OBJ.
    fn export_obj(&self, source: &Path, dest: &Path) -> Result<(), ExportError> {
        let scene = self.import(source, ImportOptions::RAW)?;
        obj::write_file(dest, &scene)?;
        log::info!(
            "Exported {} -> {} ({} vertices, {} triangles)",
            source.display(),
            dest.display(),
            scene.vertex_count(),
            scene.triangle_count()
        );
        Ok(())
    }
}

/// In-process importer for OBJ and (with the `gltf` feature) glTF/GLB.
#[derive(Debug, Default, Clone, Copy)]
pub struct Importer;

impl AssetImporter for Importer {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<Scene, ImportError> {
        let unsupported = || ImportError::Unsupported {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let mut scene = match Format::from_path(path).ok_or_else(unsupported)? {
            Format::Obj => obj::read_file(path)?,
            #[cfg(feature = "gltf")]
            Format::Gltf => gltf_read::read_file(path)?,
            _ => return Err(unsupported()),
        };

        process::apply(&mut scene, options);
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mesh_io_{}_{}", std::process::id(), name))
    }

    const TETRA: &str = "\
o tetra
v 0 0 0 1 0 0
v 1 0 0 0 1 0
v 0 1 0 0 0 1
v 0 0 1 1 1 1
f 1 3 2
f 1 2 4
f 2 3 4
f 3 1 4
";

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(Format::from_extension("glTF"), Some(Format::Gltf));
        assert_eq!(Format::from_extension("OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path(Path::new("a/b.X3D")), Some(Format::X3d));
        assert_eq!(Format::from_extension("png"), None);
        assert_eq!(supported_extensions().count(), 14);
    }

    #[test]
    fn recognised_but_undecoded_format_is_unsupported() {
        let err = Importer
            .import(Path::new("model.fbx"), ImportOptions::VIEWER)
            .unwrap_err();
        assert!(matches!(err, ImportError::Unsupported { ref extension, .. } if extension == "fbx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Importer
            .import(&temp_path("does_not_exist.obj"), ImportOptions::VIEWER)
            .unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[test]
    fn export_then_import_preserves_counts_and_colours() {
        let src = temp_path("tetra_src.obj");
        let dst = temp_path("tetra_out.obj");
        std::fs::write(&src, TETRA).unwrap();

        let original = Importer.import(&src, ImportOptions::VIEWER).unwrap();
        Importer.export_obj(&src, &dst).unwrap();
        let reread = Importer.import(&dst, ImportOptions::VIEWER).unwrap();

        assert_eq!(reread.vertex_count(), original.vertex_count());
        assert_eq!(reread.triangle_count(), original.triangle_count());
        assert_eq!(
            reread.meshes[0].colors.as_ref().unwrap()[3],
            [1.0, 1.0, 1.0]
        );

        let _ = std::fs::remove_file(src);
        let _ = std::fs::remove_file(dst);
    }

    #[test]
    fn export_of_missing_source_fails_without_writing() {
        let dst = temp_path("never_written.obj");
        let err = Importer
            .export_obj(&temp_path("missing_src.obj"), &dst)
            .unwrap_err();
        assert!(matches!(err, ExportError::Import(_)));
        assert!(!dst.exists());
    }
}
