//! Load-cycle artifact
//!
//! A [`Catalog`] bundles the canonical entities with the vector space built
//! from them. It is immutable once built; a reload builds a new one and
//! swaps it into a [`CatalogHandle`].

use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::normalize::{normalize, NormalizeReport, Normalized};
use crate::rank::{self, CancelToken, Neighbor, SimilarityPair};
use crate::record::RawTables;
use crate::search::search_by_name;
use crate::{Entity, Error, Result, VectorSpace};

#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<Entity>,
    positions: AHashMap<String, usize>,
    space: VectorSpace,
    report: NormalizeReport,
}

impl Catalog {
    /// Normalize raw tables and build the vector space.
    pub fn load(raw: RawTables, config: &PipelineConfig) -> Self {
        Self::from_normalized(normalize(raw.basics, raw.ratings, raw.akas, config))
    }

    /// Build from the output of a streamed [`normalize`] run.
    pub fn from_normalized(normalized: Normalized) -> Self {
        Self::assemble(normalized.entities, normalized.report)
    }

    /// Rebuild from previously normalized entities, e.g. a snapshot.
    ///
    /// Text content is recomposed with `config`, and repeated ids keep only
    /// their first occurrence.
    pub fn from_entities(entities: Vec<Entity>, config: &PipelineConfig) -> Self {
        let mut report = NormalizeReport {
            primary_rows: entities.len(),
            ..NormalizeReport::default()
        };
        let mut seen = ahash::AHashSet::new();
        let mut kept = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if !seen.insert(entity.id.clone()) {
                report.duplicate_ids += 1;
                continue;
            }
            if !entity.has_rating() {
                report.retained_unrated += 1;
            }
            entity.text_content = config.text.compose(&entity);
            kept.push(entity);
        }
        if report.duplicate_ids > 0 {
            warn!("Dropped {} duplicate entity ids", report.duplicate_ids);
        }
        report.retained = kept.len();
        Self::assemble(kept, report)
    }

    fn assemble(entities: Vec<Entity>, report: NormalizeReport) -> Self {
        let space = VectorSpace::build(&entities);
        let positions = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        info!("Catalog ready: {} entities", entities.len());
        Self {
            entities,
            positions,
            space,
            report,
        }
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    #[inline]
    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }

    #[inline]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.position_of(id).map(|i| &self.entities[i])
    }

    pub fn rank_similar_pairs(&self, top_n: usize) -> Vec<SimilarityPair> {
        rank::rank(&self.space, top_n)
    }

    pub fn rank_similar_pairs_with_cancel(
        &self,
        top_n: usize,
        token: &CancelToken,
    ) -> Result<Vec<SimilarityPair>> {
        rank::rank_with_cancel(&self.space, top_n, token)
    }

    pub fn search_by_name(&self, query: &str) -> Vec<&Entity> {
        search_by_name(&self.entities, query)
    }

    /// The `k` entities closest to `id`.
    pub fn similar_to(&self, id: &str, k: usize) -> Result<Vec<Neighbor>> {
        let position = self
            .position_of(id)
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;
        rank::most_similar_to(&self.space, position, k)
    }
}

/// Shared pointer to the current catalog.
///
/// Readers clone the `Arc` and keep using it even if a reload swaps in a
/// newer catalog meanwhile.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn current(&self) -> Arc<Catalog> {
        self.current.read().clone()
    }

    /// Install `catalog` and return the one it replaced.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
