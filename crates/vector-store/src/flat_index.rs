use crate::error::{Result, VectorStoreError};

/// Brute-force cosine ranking over vectors kept in insertion order.
pub struct FlatIndex<'a> {
    dimension: usize,
    vectors: Vec<&'a [f32]>,
}

impl<'a> FlatIndex<'a> {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Add vector to index; its position is its id
    pub fn add(&mut self, vector: &'a [f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Search for k nearest neighbors using cosine similarity.
    /// Returns (position, score) sorted by score descending; equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, vector)| (pos, cosine_similarity(query, vector)))
            .collect();

        // sort_by is stable; NaN scores rank last
        scores.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
        scores.truncate(k);

        Ok(scores)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_search() {
        let vectors: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.9, 0.1, 0.0], [0.0, 1.0, 0.0]];
        let mut index = FlatIndex::new(3);
        for v in &vectors {
            index.add(v).unwrap();
        }
        assert_eq!(index.len(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 1);
        assert!(results[1].1 > 0.9);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let vectors: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 0.0], [2.0, 0.0], [1.0, 0.0]];
        let mut index = FlatIndex::new(2);
        for v in &vectors {
            index.add(v).unwrap();
        }

        let results = index.search(&[1.0, 0.0], 4).unwrap();
        let order: Vec<usize> = results.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let vectors: [[f32; 2]; 3] = [[f32::NAN, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let mut index = FlatIndex::new(2);
        for v in &vectors {
            index.add(v).unwrap();
        }

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert!(results[2].1.is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let short: [f32; 2] = [1.0, 0.0];
        let ok: [f32; 3] = [1.0, 0.0, 0.0];
        let mut index = FlatIndex::new(3);
        assert!(index.add(&short).is_err());

        index.add(&ok).unwrap();
        assert!(index.search(&short, 1).is_err());
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
