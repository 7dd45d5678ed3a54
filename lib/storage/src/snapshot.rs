// Entity snapshots: gzip-compressed JSON, written atomically
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use reelsim_core::Entity;

pub const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_EXTENSION: &str = "snapshot";

/// What was written, for logs and API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    pub entities: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    created_at: DateTime<Utc>,
    entities: &'a [Entity],
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    entities: Vec<Entity>,
}

fn encode(entities: &[Entity]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&SnapshotOut {
        version: SNAPSHOT_VERSION,
        created_at: Utc::now(),
        entities,
    })?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Write `entities` to `path`, replacing any existing file atomically.
pub fn save_snapshot_to_path(path: &Path, entities: &[Entity]) -> Result<SnapshotDescription> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = encode(entities)?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(&bytes))
        .with_context(|| format!("Failed to write snapshot {:?}", path))?;

    Ok(SnapshotDescription {
        name: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
        creation_time: Some(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        size: bytes.len() as u64,
        entities: entities.len(),
        checksum: Some(format!("{:x}", Sha256::digest(&bytes))),
    })
}

/// Read a snapshot, verifying its SHA-256 when `expected_checksum` is given.
pub fn load_snapshot_from_path(path: &Path, expected_checksum: Option<&str>) -> Result<Vec<Entity>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read snapshot {:?}", path))?;

    if let Some(expected) = expected_checksum {
        let actual = format!("{:x}", Sha256::digest(&bytes));
        if actual != expected {
            return Err(anyhow!(
                "Checksum mismatch: expected {}, got {}",
                expected,
                actual
            ));
        }
    }

    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut json_data = Vec::new();
    decoder.read_to_end(&mut json_data)?;

    let data: SnapshotIn = serde_json::from_slice(&json_data)?;
    if data.version != SNAPSHOT_VERSION {
        return Err(anyhow!("Unsupported snapshot version {}", data.version));
    }
    Ok(data.entities)
}

/// Timestamped snapshots kept in one directory
pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    fn generate_snapshot_name() -> String {
        let now: DateTime<Utc> = Utc::now();
        format!("entities-{}.{}", now.format("%Y-%m-%d-%H-%M-%S-%3f"), SNAPSHOT_EXTENSION)
    }

    pub fn create_snapshot(&self, entities: &[Entity]) -> Result<SnapshotDescription> {
        let path = self.snapshot_dir.join(Self::generate_snapshot_name());
        save_snapshot_to_path(&path, entities)
    }
}
