//! Cosine scoring over pre-normalized embedding rows.

/// One dot product per corpus row. Rows and query are expected unit-length,
/// so the dot product is the cosine similarity.
pub fn scores(matrix: &[Vec<f32>], query: &[f32]) -> Vec<f32> {
    matrix
        .iter()
        .map(|row| row.iter().zip(query.iter()).map(|(a, b)| a * b).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vector_scores_one() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = scores(&matrix, &[1.0, 0.0]);
        assert!((result[0] - 1.0).abs() < f32::EPSILON);
        assert!(result[1].abs() < f32::EPSILON);
    }

    #[test]
    fn empty_matrix_scores_empty() {
        assert!(scores(&[], &[1.0, 0.0]).is_empty());
    }

    #[test]
    fn row_order_is_preserved() {
        let matrix = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.6, 0.8]];
        let result = scores(&matrix, &[1.0, 0.0]);
        assert_eq!(result.len(), 3);
        assert!(result[1] > result[2] && result[2] > result[0]);
    }
}
