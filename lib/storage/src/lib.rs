pub mod loader;
pub mod manager;
pub mod snapshot;
pub mod tsv;

pub use loader::{load_catalog, open_table, CatalogSource, DatasetPaths};
pub use manager::CatalogManager;
pub use snapshot::{load_snapshot_from_path, save_snapshot_to_path, SnapshotDescription, SnapshotManager};
pub use tsv::{akas_rows, basics_rows, ratings_rows, read_akas, read_basics, read_ratings, TsvRows, TsvTable};
