use anyhow::Result;
use parking_lot::Mutex;
use reelsim_core::{Catalog, CatalogHandle, PipelineConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::loader::CatalogSource;
use crate::snapshot::{SnapshotDescription, SnapshotManager};

/// Owns the current catalog and knows how to rebuild it
pub struct CatalogManager {
    handle: CatalogHandle,
    source: CatalogSource,
    config: PipelineConfig,
    snapshots: Option<SnapshotManager>,
    // Serializes reloads; queries never take it.
    reload_lock: Mutex<()>,
}

impl CatalogManager {
    /// Build the first catalog from `source`.
    pub fn open(source: CatalogSource, config: PipelineConfig) -> Result<Self> {
        let catalog = Self::build(&source, &config)?;
        Ok(Self {
            handle: CatalogHandle::new(catalog),
            source,
            config,
            snapshots: None,
            reload_lock: Mutex::new(()),
        })
    }

    /// Keep timestamped snapshots under `dir`.
    pub fn with_snapshot_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self> {
        self.snapshots = Some(SnapshotManager::new(dir)?);
        Ok(self)
    }

    fn build(source: &CatalogSource, config: &PipelineConfig) -> Result<Catalog> {
        let started = Instant::now();
        let catalog = source.load(config)?;
        info!(
            "Loaded catalog: {} entities, {} terms in {:.2?}",
            catalog.len(),
            catalog.space().vocabulary().len(),
            started.elapsed()
        );
        Ok(catalog)
    }

    pub fn current(&self) -> Arc<Catalog> {
        self.handle.current()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Rebuild from the source and swap the result in. On failure the
    /// current catalog stays in place.
    pub fn reload(&self) -> Result<Arc<Catalog>> {
        let _guard = self.reload_lock.lock();
        let catalog = Self::build(&self.source, &self.config)?;
        self.handle.replace(catalog);
        Ok(self.handle.current())
    }

    /// Snapshot the current entities, if a snapshot directory is configured.
    pub fn snapshot(&self) -> Result<Option<SnapshotDescription>> {
        match &self.snapshots {
            Some(snapshots) => {
                let catalog = self.current();
                let desc = snapshots.create_snapshot(catalog.entities())?;
                info!("Created snapshot {} ({} entities)", desc.name, desc.entities);
                Ok(Some(desc))
            }
            None => Ok(None),
        }
    }
}
