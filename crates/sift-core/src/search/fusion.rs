//! Hybrid Score Fusion
//!
//! Combines a semantic candidate pool (cosine similarity, higher is better)
//! with a lexical pool (negative inner product, lower is better):
//!
//! 1. min-max normalize the lexical scores and invert them so higher is better
//! 2. full outer join both pools on document id, a missing side scores 0
//! 3. `final = alpha * semantic + (1 - alpha) * lexical`
//!
//! Equal scores are ordered by document id ascending.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Default size of each candidate pool before fusion
pub const DEFAULT_CANDIDATE_POOL: usize = 100;

/// Sort `(id, score)` pairs by score descending, then id ascending
pub fn sort_by_score_desc(scores: &mut [(String, f64)]) {
    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

/// Min-max normalize scores to [0, 1]
///
/// When every score is equal (range 0) each normalized score is 0.
pub fn min_max_normalize(scores: &[(String, f64)]) -> Vec<(String, f64)> {
    if scores.is_empty() {
        return vec![];
    }

    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, s)| {
            (lo.min(*s), hi.max(*s))
        });
    let range = max - min;

    scores
        .iter()
        .map(|(id, s)| {
            let normalized = if range == 0.0 { 0.0 } else { (s - min) / range };
            (id.clone(), normalized)
        })
        .collect()
}

/// Turn raw lexical distances into relevance in [0, 1]: `1 - normalized`
pub fn lexical_relevance(raw: &[(String, f64)]) -> Vec<(String, f64)> {
    min_max_normalize(raw)
        .into_iter()
        .map(|(id, n)| (id, 1.0 - n))
        .collect()
}

/// Weighted sum over the full outer join of both pools
///
/// `lexical` must already be relevance scores (see [`lexical_relevance`]).
pub fn weighted_fusion(
    semantic: &[(String, f64)],
    lexical: &[(String, f64)],
    alpha: f64,
) -> Vec<(String, f64)> {
    let mut joined: HashMap<&str, (f64, f64)> =
        HashMap::with_capacity(semantic.len() + lexical.len());

    for (id, score) in semantic {
        joined.entry(id.as_str()).or_default().0 = *score;
    }
    for (id, score) in lexical {
        joined.entry(id.as_str()).or_default().1 = *score;
    }

    let mut fused: Vec<(String, f64)> = joined
        .into_iter()
        .map(|(id, (s, l))| (id.to_string(), alpha * s + (1.0 - alpha) * l))
        .collect();

    sort_by_score_desc(&mut fused);
    fused
}

/// Full hybrid fusion from raw pools
pub fn hybrid_fusion(
    semantic: &[(String, f64)],
    lexical_raw: &[(String, f64)],
    alpha: f64,
) -> Vec<(String, f64)> {
    weighted_fusion(semantic, &lexical_relevance(lexical_raw), alpha)
}

// ============================================================================
// TESTS
// ============================================================================
