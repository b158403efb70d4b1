//! Model import off the render thread.
//!
//! Paths go to a worker over a channel; finished geometry is posted into a
//! [`TaskSlot`] the render loop polls each frame. GPU upload stays on the
//! render thread, so a model is never visible before it is fully uploaded.

use crate::controls::TaskSlot;
use crate::model::geometry::ModelGeometry;
use crossbeam_channel::{unbounded, Sender};
use mesh_io::AssetImporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

pub struct AssetLoader {
    importer: Arc<dyn AssetImporter>,
    completed: Arc<TaskSlot<ModelGeometry>>,
    worker: Option<(Sender<PathBuf>, thread::JoinHandle<()>)>,
}

impl AssetLoader {
    /// Imports on a dedicated worker thread.
    pub fn spawn(importer: Arc<dyn AssetImporter>) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<PathBuf>();
        let completed = Arc::new(TaskSlot::new());

        let handle = {
            let importer = importer.clone();
            let completed = completed.clone();
            thread::Builder::new()
                .name("model-loader".into())
                .spawn(move || {
                    for path in rx {
                        import_into(importer.as_ref(), &path, &completed);
                    }
                    log::debug!("Model loader thread finished");
                })?
        };

        Ok(Self {
            importer,
            completed,
            worker: Some((tx, handle)),
        })
    }

    /// Imports on the calling thread inside [`AssetLoader::submit`].
    pub fn inline(importer: Arc<dyn AssetImporter>) -> Self {
        Self {
            importer,
            completed: Arc::new(TaskSlot::new()),
            worker: None,
        }
    }

    pub fn importer(&self) -> &Arc<dyn AssetImporter> {
        &self.importer
    }

    pub fn submit(&self, path: PathBuf) {
        if let Some((tx, _)) = &self.worker {
            if tx.send(path.clone()).is_ok() {
                return;
            }
            log::warn!("Model loader thread is gone; importing {} inline", path.display());
        }
        import_into(self.importer.as_ref(), &path, &self.completed);
    }

    /// The most recently finished import, if any. Older unclaimed results
    /// have been superseded.
    pub fn take_completed(&self) -> Option<ModelGeometry> {
        self.completed.take()
    }

    pub fn has_completed(&self) -> bool {
        self.completed.is_pending()
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        if let Some((tx, handle)) = self.worker.take() {
            drop(tx);
            if handle.join().is_err() {
                log::error!("Model loader thread panicked");
            }
        }
    }
}

/// Import failures are logged and leave `completed` untouched.
fn import_into(importer: &dyn AssetImporter, path: &Path, completed: &TaskSlot<ModelGeometry>) {
    log::info!("Importing {}", path.display());
    let started = Instant::now();
    match ModelGeometry::load(importer, path) {
        Ok(geometry) => {
            log::info!(
                "Imported {} in {:.2?} ({} vertices, {} triangles)",
                geometry.name,
                started.elapsed(),
                geometry.vertex_count(),
                geometry.triangle_count()
            );
            if let Some(stale) = completed.put(geometry) {
                log::debug!("Discarding unclaimed import of {}", stale.name);
            }
        }
        Err(err) => log::error!("Failed to import {}: {}", path.display(), err),
    }
}
