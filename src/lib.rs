//! # reelsim
//!
//! A content-similarity engine for tabular title metadata.
//!
//! reelsim merges IMDb-style `title.basics`, `title.ratings` and `title.akas`
//! tables into one canonical set of movies, builds a TF-IDF vector for each
//! title's text, and answers two questions: which titles are most similar to
//! each other, and which titles have a name containing a given substring.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! reelsim --data-dir ./data similar --top-n 10
//! reelsim --data-dir ./data search "space"
//! reelsim --data-dir ./data serve --http-port 6340
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use reelsim::prelude::*;
//!
//! let paths = DatasetPaths::from_dir("./data");
//! let catalog = load_catalog(&paths, &PipelineConfig::default()).unwrap();
//!
//! for pair in catalog.rank_similar_pairs(10) {
//!     println!("{} ~ {}: {:.2}", pair.first, pair.second, pair.score);
//! }
//! for title in catalog.search_by_name("space") {
//!     println!("{}", title);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `reelsim-core` - Normalization, TF-IDF vector space, similarity ranking, name search
//! - `reelsim-storage` - Gzip TSV ingestion, entity snapshots, catalog reloads
//! - `reelsim-api` - JSON REST API

// Re-export core types
pub use reelsim_core::{
    normalize, parse_top_n, rank, search_by_name,
    Catalog, CatalogHandle, CancelToken, Entity, Error, Result,
    PipelineConfig, NormalizeConfig, RatingJoin, TextConfig, TextField,
    RawTables, SimilarityPair, VectorSpace,
};

// Re-export storage
pub use reelsim_storage::{load_catalog, CatalogManager, CatalogSource, DatasetPaths};

// Re-export API
pub use reelsim_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, CatalogHandle, CatalogManager, CatalogSource, DatasetPaths,
        Entity, Error, Result, PipelineConfig, RatingJoin, TextField,
        SimilarityPair, load_catalog,
    };
}
