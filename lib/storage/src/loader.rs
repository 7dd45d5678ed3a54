use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reelsim_core::{normalize, Catalog, PipelineConfig};

use crate::snapshot::load_snapshot_from_path;
use crate::tsv::{akas_rows, basics_rows, ratings_rows};

pub const BASICS_FILE: &str = "title.basics.tsv.gz";
pub const RATINGS_FILE: &str = "title.ratings.tsv.gz";
pub const AKAS_FILE: &str = "title.akas.tsv.gz";

/// Locations of the three source tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub basics: PathBuf,
    pub ratings: PathBuf,
    /// Alternate titles are best-effort; a missing file is not an error.
    pub akas: Option<PathBuf>,
}

impl DatasetPaths {
    pub fn from_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            basics: data_dir.join(BASICS_FILE),
            ratings: data_dir.join(RATINGS_FILE),
            akas: Some(data_dir.join(AKAS_FILE)),
        }
    }
}

/// Open a table, decompressing when the file name ends in `.gz`.
pub fn open_table(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let gzipped = path.extension().and_then(|s| s.to_str()) == Some("gz");
    if gzipped {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Stream the source tables through the normalizer.
///
/// Rows are filtered as they are read; the raw tables are never held in
/// memory. A read error in any table fails the load.
pub fn load_catalog(paths: &DatasetPaths, config: &PipelineConfig) -> Result<Catalog> {
    let mut basics = basics_rows(open_table(&paths.basics)?)
        .with_context(|| format!("Failed to read {:?}", paths.basics))?;
    let mut ratings = ratings_rows(open_table(&paths.ratings)?)
        .with_context(|| format!("Failed to read {:?}", paths.ratings))?;
    let mut akas = match &paths.akas {
        Some(path) if path.exists() => Some(
            akas_rows(open_table(path)?).with_context(|| format!("Failed to read {:?}", path))?,
        ),
        Some(path) => {
            warn!("Alternate titles file {:?} not found, continuing without it", path);
            None
        }
        None => None,
    };

    let normalized = normalize(&mut basics, &mut ratings, akas.iter_mut().flatten(), config);

    let read = ratings
        .finish()
        .with_context(|| format!("Failed to read {:?}", paths.ratings))?;
    info!("Read {} rating rows from {:?}", read, paths.ratings);
    if let (Some(rows), Some(path)) = (akas, &paths.akas) {
        let read = rows
            .finish()
            .with_context(|| format!("Failed to read {:?}", path))?;
        info!("Read {} alternate title rows from {:?}", read, path);
    }
    let read = basics
        .finish()
        .with_context(|| format!("Failed to read {:?}", paths.basics))?;
    info!("Read {} primary rows from {:?}", read, paths.basics);

    Ok(Catalog::from_normalized(normalized))
}

/// Where a catalog is (re)built from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Tables(DatasetPaths),
    Snapshot(PathBuf),
}

impl CatalogSource {
    pub fn load(&self, config: &PipelineConfig) -> Result<Catalog> {
        match self {
            CatalogSource::Tables(paths) => load_catalog(paths, config),
            CatalogSource::Snapshot(path) => {
                let entities = load_snapshot_from_path(path, None)?;
                info!("Loaded {} entities from snapshot {:?}", entities.len(), path);
                Ok(Catalog::from_entities(entities, config))
            }
        }
    }
}
