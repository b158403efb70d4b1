//! Batch converter: re-exports every recognised model under a directory as
//! Wavefront OBJ, using the same export path as the viewer's "Save Model As".

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use mesh_io::{AssetImporter, Format, Importer};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};
use walkdir::WalkDir;

#[derive(Parser, Debug, Clone)]
#[command(name = "mesh2obj", version)]
struct Args {
    #[arg(long, default_value = "models")]
    input_dir: PathBuf,

    #[arg(long, default_value = "models_obj")]
    output_dir: PathBuf,

    /// Replace existing output files instead of skipping them.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Regular files under `root` whose extension is a recognised model format.
fn collect_inputs(root: &Path) -> Vec<PathBuf> {
    let mut inputs: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| Format::from_path(path).is_some())
        .collect();
    inputs.sort();
    inputs
}

/// Mirrors `input`'s position under `input_dir` into `output_dir`, with an
/// `.obj` extension.
fn output_path(input: &Path, input_dir: &Path, output_dir: &Path) -> PathBuf {
    let relative = match input.strip_prefix(input_dir) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => input.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    output_dir.join(relative).with_extension("obj")
}

fn convert_one(importer: &dyn AssetImporter, input: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    importer
        .export_obj(input, output)
        .with_context(|| format!("converting {}", input.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let inputs = collect_inputs(&args.input_dir);
    info!(
        "Converting {} models from {} ...",
        inputs.len(),
        args.input_dir.display()
    );

    let started = Instant::now();
    let converted = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    inputs.par_iter().for_each(|input| {
        let output = output_path(input, &args.input_dir, &args.output_dir);
        if output.exists() && !args.overwrite {
            skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        match convert_one(&Importer, input, &output) {
            Ok(()) => {
                converted.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                warn!("Error processing {}: {:#}", input.display(), err);
            }
        }
    });

    info!(
        "Done in {:.2?}: {} converted, {} skipped, {} failed",
        started.elapsed(),
        converted.into_inner(),
        skipped.into_inner(),
        failed.into_inner()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mirrors_input_tree() {
        let out = output_path(
            Path::new("in/city/block.glb"),
            Path::new("in"),
            Path::new("out"),
        );
        assert_eq!(out, PathBuf::from("out/city/block.obj"));
    }

    #[test]
    fn only_recognised_formats_are_collected() {
        let root = std::env::temp_dir().join(format!("mesh2obj_{}", std::process::id()));
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("a.OBJ"), "").unwrap();
        fs::write(root.join("nested/b.fbx"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let inputs = collect_inputs(&root);
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.OBJ", "b.fbx"]);

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn conversion_writes_obj() {
        let root = std::env::temp_dir().join(format!("mesh2obj_convert_{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        let input = root.join("tri.obj");
        fs::write(&input, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let output = root.join("out/tri.obj");

        convert_one(&Importer, &input, &output).unwrap();
        let scene = Importer
            .import(&output, mesh_io::ImportOptions::RAW)
            .unwrap();
        assert_eq!(scene.triangle_count(), 1);

        let _ = fs::remove_dir_all(root);
    }
}
