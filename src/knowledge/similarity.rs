use tracing::debug;

use crate::database::sqlite::models::KnowledgeItem;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for empty vectors, mismatched lengths, or a zero-magnitude
/// operand. That is a deliberate policy (such pairs carry no usable signal
/// and must never rank above a real match), not a numerical accident.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank `items` against `query` by cosine similarity.
///
/// Items without a parseable vector are skipped. Only items strictly above
/// `threshold` are kept, ordered by descending similarity with ties broken
/// by scan order (stable sort), truncated to `limit`.
///
/// This is a full linear scan by design: the store holds dozens to low
/// hundreds of items. The signature is the seam to swap in an index later.
#[inline]
pub fn find_similar(
    items: Vec<KnowledgeItem>,
    query: &[f32],
    limit: usize,
    threshold: f32,
) -> Vec<KnowledgeItem> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, KnowledgeItem)> = items
        .into_iter()
        .filter_map(|item| {
            let vector = item.embedding_vector()?;
            let similarity = cosine_similarity(query, &vector);
            (similarity > threshold).then_some((similarity, item))
        })
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    debug!("Similarity scan kept {} items", scored.len());
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::models::ContentKind;
    use chrono::Utc;

    fn item_with_embedding(id: i64, embedding: Option<&str>) -> KnowledgeItem {
        let now = Utc::now().naive_utc();
        KnowledgeItem {
            id,
            content_type: ContentKind::CvEntry,
            content_id: id,
            title: format!("Item {}", id),
            content: format!("Content {}", id),
            embedding: embedding.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn identical_vectors_are_fully_similar() {
        let v = [0.3f32, -0.5, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scaling_does_not_change_similarity() {
        let v = [1.0f32, 2.0, 3.0];
        let scaled: Vec<f32> = v.iter().map(|x| x * 4.5).collect();
        assert!((cosine_similarity(&v, &scaled) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[]), 0.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn zero_magnitude_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        let v = [1.0f32, -2.0, 0.5];
        let negated: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &negated) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn find_similar_skips_items_without_vectors() {
        let items = vec![
            item_with_embedding(1, None),
            item_with_embedding(2, Some("[1.0, 0.0]")),
        ];

        let results = find_similar(items, &[1.0, 0.0], 5, 0.1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn find_similar_skips_malformed_vectors() {
        let items = vec![
            item_with_embedding(1, Some("not json")),
            item_with_embedding(2, Some("[1.0, 0.0]")),
        ];

        let results = find_similar(items, &[1.0, 0.0], 5, 0.1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn find_similar_respects_limit_and_threshold() {
        let items = vec![
            item_with_embedding(1, Some("[1.0, 0.0]")),
            item_with_embedding(2, Some("[0.9, 0.1]")),
            item_with_embedding(3, Some("[0.0, 1.0]")),
        ];

        let results = find_similar(items, &[1.0, 0.0], 1, 0.2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        // Orthogonal vector scores exactly 0.0; threshold 0.0 must exclude it.
        let items = vec![item_with_embedding(1, Some("[0.0, 1.0]"))];
        let results = find_similar(items, &[1.0, 0.0], 5, 0.0);
        assert!(results.is_empty());
    }

    #[test]
    fn results_sorted_descending_by_similarity() {
        let items = vec![
            item_with_embedding(1, Some("[0.5, 0.5]")),
            item_with_embedding(2, Some("[1.0, 0.0]")),
            item_with_embedding(3, Some("[0.9, 0.1]")),
        ];

        let results = find_similar(items, &[1.0, 0.0], 5, 0.1);
        let ids: Vec<i64> = results.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn ties_keep_scan_order() {
        let items = vec![
            item_with_embedding(1, Some("[2.0, 0.0]")),
            item_with_embedding(2, Some("[1.0, 0.0]")),
        ];

        let results = find_similar(items, &[1.0, 0.0], 5, 0.1);
        let ids: Vec<i64> = results.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let items = vec![item_with_embedding(1, Some("[1.0, 0.0]"))];
        assert!(find_similar(items, &[], 5, 0.1).is_empty());
    }
}
