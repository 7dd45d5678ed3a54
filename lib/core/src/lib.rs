//! # reelsim Core
//!
//! Core library for the reelsim title-similarity engine.
//!
//! This crate provides the pipeline from raw table rows to ranked results:
//!
//! - [`normalize()`] - Merge primary, rating and alternate-title rows into [`Entity`] values
//! - [`VectorSpace`] - TF-IDF vocabulary and one unit-length [`SparseVector`] per entity
//! - [`rank()`] - Top-N most similar distinct pairs, deterministic tie-break
//! - [`search_by_name`] - Case-insensitive substring lookup on names
//! - [`Catalog`] - The immutable artifact of one load cycle
//!
//! ## Example
//!
//! ```rust
//! use reelsim_core::{BasicsRecord, Catalog, PipelineConfig, RawTables};
//!
//! let movie = |id: &str, title: &str| BasicsRecord {
//!     id: Some(id.to_string()),
//!     title_type: Some("movie".to_string()),
//!     primary_title: Some(title.to_string()),
//!     is_adult: Some(false),
//!     ..BasicsRecord::default()
//! };
//! let raw = RawTables {
//!     basics: vec![movie("t1", "Space Quest"), movie("t2", "Space Voyage")],
//!     ..RawTables::default()
//! };
//!
//! let catalog = Catalog::load(raw, &PipelineConfig::default());
//! let pairs = catalog.rank_similar_pairs(10);
//! assert_eq!(pairs[0].first, "t1");
//! assert_eq!(catalog.search_by_name("voyage").len(), 1);
//! ```

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod normalize;
pub mod rank;
pub mod record;
pub mod search;
pub mod text;
pub mod tfidf;
pub mod vector;

pub use catalog::{Catalog, CatalogHandle};
pub use config::{NormalizeConfig, PipelineConfig, RatingJoin, TextConfig, TextField};
pub use entity::Entity;
pub use error::{parse_top_n, Error, Result};
pub use normalize::{normalize, NormalizeReport, Normalized};
pub use rank::{
    most_similar_to, pair_count, rank, rank_with_cancel, similarity, CancelToken, Neighbor,
    SimilarityPair,
};
pub use record::{AkaRecord, BasicsRecord, RatingRecord, RawTables};
pub use search::search_by_name;
pub use tfidf::{VectorSpace, Vocabulary};
pub use vector::SparseVector;
