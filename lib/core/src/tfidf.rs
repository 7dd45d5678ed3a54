//! TF-IDF vector space
//!
//! Builds a corpus-wide vocabulary from entity text and turns every entity
//! into a unit-length sparse TF-IDF vector. Vectors are stored in the same
//! order as the entities they came from.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use tracing::info;

use crate::text::tokenize;
use crate::vector::SparseVector;
use crate::Entity;

/// Sorted term list with a term -> index lookup
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: AHashMap<String, u32>,
}

impl Vocabulary {
    fn from_terms(mut terms: Vec<String>) -> Self {
        terms.sort_unstable();
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self { terms, index }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    #[inline]
    pub fn term(&self, index: u32) -> Option<&str> {
        self.terms.get(index as usize).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Smoothed inverse document frequency.
///
/// `ln((1 + n) / (1 + df)) + 1`: the constant keeps a term present in every
/// document at weight 1 instead of 0.
#[inline]
pub fn smoothed_idf(n_docs: usize, df: usize) -> f32 {
    (((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0) as f32
}

/// Vocabulary, IDF weights and one vector per entity.
#[derive(Debug, Clone, Default)]
pub struct VectorSpace {
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    ids: Vec<String>,
    vectors: Vec<SparseVector>,
}

impl VectorSpace {
    pub fn build(entities: &[Entity]) -> Self {
        let docs: Vec<Vec<String>> = entities
            .par_iter()
            .map(|e| tokenize(&e.text_content))
            .collect();

        let mut doc_freq: AHashMap<&str, usize> = AHashMap::new();
        for tokens in &docs {
            let unique: AHashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let vocabulary = Vocabulary::from_terms(doc_freq.keys().map(|t| t.to_string()).collect());
        let n_docs = entities.len();
        let idf: Vec<f32> = vocabulary
            .terms()
            .iter()
            .map(|t| smoothed_idf(n_docs, doc_freq.get(t.as_str()).copied().unwrap_or(0)))
            .collect();

        let vectors: Vec<SparseVector> = docs
            .par_iter()
            .map(|tokens| weigh(&vocabulary, &idf, tokens))
            .collect();

        info!(
            "Built vector space: {} entities, {} terms",
            n_docs,
            vocabulary.len()
        );

        Self {
            vocabulary,
            idf,
            ids: entities.iter().map(|e| e.id.clone()).collect(),
            vectors,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[inline]
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.index_of(term).map(|i| self.idf[i as usize])
    }

    #[inline]
    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    #[inline]
    pub fn vector(&self, position: usize) -> Option<&SparseVector> {
        self.vectors.get(position)
    }

    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[inline]
    pub fn id(&self, position: usize) -> Option<&str> {
        self.ids.get(position).map(String::as_str)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }
}

fn weigh(vocabulary: &Vocabulary, idf: &[f32], tokens: &[String]) -> SparseVector {
    let mut tf: AHashMap<u32, f32> = AHashMap::new();
    for token in tokens {
        if let Some(index) = vocabulary.index_of(token) {
            *tf.entry(index).or_insert(0.0) += 1.0;
        }
    }
    let mut vector = SparseVector::from_pairs(
        tf.into_iter()
            .map(|(index, count)| (index, count * idf[index as usize]))
            .collect(),
    );
    vector.normalize();
    vector
}
