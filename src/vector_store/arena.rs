//! Append-only chunk arena with a flat L2 index.

use super::Chunk;
use crate::error::{Result, SleuthError};
use std::ops::Range;

/// Chunks and their embeddings, stored side by side.
///
/// A chunk's only handle is its position, assigned once by `append`. Vectors
/// live in one flat buffer so `vectors.len() == chunks.len() * dimensions`
/// holds after every call.
#[derive(Debug)]
pub(super) struct Arena {
    dimensions: usize,
    vectors: Vec<f32>,
    chunks: Vec<Chunk>,
}

impl Arena {
    pub(super) fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
            chunks: Vec::new(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.chunks.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub(super) fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub(super) fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Reject the batch if any vector has the wrong dimensionality.
    pub(super) fn validate(&self, entries: &[(Chunk, Vec<f32>)]) -> Result<()> {
        match entries.iter().find(|(_, v)| v.len() != self.dimensions) {
            Some((_, v)) => Err(SleuthError::VectorStore(format!(
                "Embedding has {} dimensions, store expects {}",
                v.len(),
                self.dimensions
            ))),
            None => Ok(()),
        }
    }

    /// Append chunks with their vectors. All-or-nothing.
    pub(super) fn append(&mut self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Range<usize>> {
        self.validate(&entries)?;

        let start = self.chunks.len();
        self.vectors.reserve(entries.len() * self.dimensions);
        self.chunks.reserve(entries.len());
        for (chunk, vector) in entries {
            self.vectors.extend_from_slice(&vector);
            self.chunks.push(chunk);
        }

        debug_assert_eq!(self.vectors.len(), self.chunks.len() * self.dimensions);
        Ok(start..self.chunks.len())
    }

    /// Swap in a fresh set of entries. All-or-nothing.
    pub(super) fn replace(&mut self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<()> {
        let mut fresh = Arena::new(self.dimensions);
        fresh.append(entries)?;
        *self = fresh;
        Ok(())
    }

    pub(super) fn clear(&mut self) {
        self.vectors.clear();
        self.chunks.clear();
    }

    /// Exhaustive nearest-neighbour search.
    ///
    /// Returns up to `k` `(position, distance)` pairs in ascending L2 distance,
    /// ties broken by insertion order.
    pub(super) fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(SleuthError::VectorStore(format!(
                "Query has {} dimensions, store expects {}",
                query.len(),
                self.dimensions
            )));
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, row)| (position, l2_distance(query, row)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Euclidean distance between two equal-length vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, "test")
    }

    #[test]
    fn test_l2_distance() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_append_keeps_alignment() {
        let mut arena = Arena::new(2);
        let range = arena
            .append(vec![(chunk("a"), vec![0.0, 0.0]), (chunk("b"), vec![1.0, 0.0])])
            .unwrap();
        assert_eq!(range, 0..2);

        let range = arena.append(vec![(chunk("c"), vec![0.0, 1.0])]).unwrap();
        assert_eq!(range, 2..3);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.vectors.len(), 6);
        assert_eq!(arena.get(2).unwrap().text, "c");
    }

    #[test]
    fn test_wrong_dimension_rejects_whole_batch() {
        let mut arena = Arena::new(2);
        let result = arena.append(vec![(chunk("ok"), vec![0.0, 0.0]), (chunk("bad"), vec![1.0])]);
        assert!(result.is_err());
        assert!(arena.is_empty());
        assert!(arena.vectors.is_empty());
    }

    #[test]
    fn test_nearest_orders_by_distance_then_position() {
        let mut arena = Arena::new(2);
        arena
            .append(vec![
                (chunk("far"), vec![10.0, 0.0]),
                (chunk("near-1"), vec![1.0, 0.0]),
                (chunk("near-2"), vec![0.0, 1.0]),
                (chunk("mid"), vec![3.0, 0.0]),
            ])
            .unwrap();

        let hits = arena.nearest(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_nearest_with_k_larger_than_store() {
        let mut arena = Arena::new(1);
        arena.append(vec![(chunk("only"), vec![0.5])]).unwrap();
        assert_eq!(arena.nearest(&[0.0], 10).unwrap().len(), 1);
        assert!(arena.nearest(&[0.0], 0).unwrap().is_empty());
    }
}
