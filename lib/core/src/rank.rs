//! Pairwise similarity ranking
//!
//! Scores every unordered pair of entities in a [`VectorSpace`] and keeps the
//! best `top_n`. Order is score descending, then the smaller id ascending,
//! then the larger id ascending, so equal scores always come out the same way.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use ahash::AHashSet;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, VectorSpace};

/// Two distinct entity ids and their cosine similarity.
///
/// `first < second` always holds; the pair is unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub first: String,
    pub second: String,
    pub score: f32,
}

impl SimilarityPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>, score: f32) -> Self {
        let (a, b) = (a.into(), b.into());
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self { first, second, score }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }
}

/// A single entity scored against a reference entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub position: usize,
    pub score: f32,
}

/// Cooperative cancellation flag for long similarity runs
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Acquire)
    }
}

/// Number of distinct unordered pairs among `n` entities.
#[inline]
pub fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate<'a> {
    score: OrderedFloat<f32>,
    first: &'a str,
    second: &'a str,
}

impl<'a> Candidate<'a> {
    fn new(a: &'a str, b: &'a str, score: f32) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self { score: OrderedFloat(score), first, second }
    }
}

// Greater means ranked earlier.
impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.first.cmp(self.first))
            .then_with(|| other.second.cmp(self.second))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded min-heap holding the best `limit` candidates seen so far.
struct TopN<'a> {
    limit: usize,
    heap: BinaryHeap<Reverse<Candidate<'a>>>,
}

impl<'a> TopN<'a> {
    fn new(limit: usize) -> Self {
        Self { limit, heap: BinaryHeap::new() }
    }

    fn offer(&mut self, candidate: Candidate<'a>) {
        if self.heap.len() < self.limit {
            self.heap.push(Reverse(candidate));
        } else if let Some(Reverse(worst)) = self.heap.peek() {
            if candidate > *worst {
                self.heap.pop();
                self.heap.push(Reverse(candidate));
            }
        }
    }

    fn merge(mut self, other: TopN<'a>) -> Self {
        for Reverse(candidate) in other.heap {
            self.offer(candidate);
        }
        self
    }

    fn into_sorted(self) -> Vec<Candidate<'a>> {
        // Ascending over Reverse is descending over candidates.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| c)
            .collect()
    }
}

/// `true` at the first position of each id; repeats of an id are left out
/// of every pair.
fn first_occurrences(ids: &[String]) -> Vec<bool> {
    let mut seen = AHashSet::with_capacity(ids.len());
    ids.iter().map(|id| seen.insert(id.as_str())).collect()
}

fn select<F>(space: &VectorSpace, top_n: usize, should_stop: F) -> Option<Vec<SimilarityPair>>
where
    F: Fn() -> bool + Sync,
{
    let n = space.len();
    let top_n = top_n.min(pair_count(n));
    if top_n == 0 {
        return Some(Vec::new());
    }

    let ids = space.ids();
    let vectors = space.vectors();
    let first = first_occurrences(ids);

    let top = (0..n)
        .into_par_iter()
        .try_fold(
            || TopN::new(top_n),
            |mut top, i| {
                if should_stop() {
                    return None;
                }
                if !first[i] {
                    return Some(top);
                }
                for j in (i + 1)..n {
                    if !first[j] {
                        continue;
                    }
                    let score = vectors[i].cosine_similarity(&vectors[j]);
                    top.offer(Candidate::new(&ids[i], &ids[j], score));
                }
                Some(top)
            },
        )
        .try_reduce(|| TopN::new(top_n), |a, b| Some(a.merge(b)))?;

    let pairs: Vec<SimilarityPair> = top
        .into_sorted()
        .into_iter()
        .map(|c| SimilarityPair {
            first: c.first.to_string(),
            second: c.second.to_string(),
            score: c.score.into_inner(),
        })
        .collect();

    debug!(
        "Ranked {} of {} candidate pairs across {} entities",
        pairs.len(),
        pair_count(n),
        n
    );
    Some(pairs)
}

/// Top `top_n` most similar distinct pairs.
///
/// `top_n == 0` yields nothing; a `top_n` at or above [`pair_count`] yields
/// every pair, zero scores included.
pub fn rank(space: &VectorSpace, top_n: usize) -> Vec<SimilarityPair> {
    select(space, top_n, || false).unwrap_or_default()
}

/// [`rank`] that stops early once `token` is cancelled.
pub fn rank_with_cancel(
    space: &VectorSpace,
    top_n: usize,
    token: &CancelToken,
) -> Result<Vec<SimilarityPair>> {
    select(space, top_n, || token.is_cancelled()).ok_or(Error::Cancelled)
}

/// Cosine similarity between the entities at two positions.
pub fn similarity(space: &VectorSpace, a: usize, b: usize) -> Result<f32> {
    let len = space.len();
    let va = space.vector(a).ok_or(Error::PositionOutOfRange { index: a, len })?;
    let vb = space.vector(b).ok_or(Error::PositionOutOfRange { index: b, len })?;
    Ok(va.cosine_similarity(vb))
}

/// The `k` entities most similar to the one at `position`, itself excluded.
pub fn most_similar_to(space: &VectorSpace, position: usize, k: usize) -> Result<Vec<Neighbor>> {
    let len = space.len();
    let target = space
        .vector(position)
        .ok_or(Error::PositionOutOfRange { index: position, len })?;
    let target_id = &space.ids()[position];
    let first = first_occurrences(space.ids());

    let mut neighbors: Vec<Neighbor> = space
        .vectors()
        .par_iter()
        .enumerate()
        .filter(|(j, _)| first[*j] && &space.ids()[*j] != target_id)
        .map(|(j, v)| Neighbor {
            id: space.ids()[j].clone(),
            position: j,
            score: target.cosine_similarity(v),
        })
        .collect();

    neighbors.sort_by(|a, b| {
        OrderedFloat(b.score)
            .cmp(&OrderedFloat(a.score))
            .then_with(|| a.id.cmp(&b.id))
    });
    neighbors.truncate(k);
    Ok(neighbors)
}
