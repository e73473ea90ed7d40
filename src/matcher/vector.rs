//! Vector-similarity ranking with adaptive thresholds
//!
//! Encoding is delegated to a `TextEncoder`; selection over the resulting
//! cosine scores is a pure function so it can be exercised without a model.

use crate::core::config::VectorConfig;
use crate::core::error::{MenuError, Result};
use crate::core::types::char_len;
use crate::keywords::KeywordIndex;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Sentence encoder producing one embedding per input text
pub trait TextEncoder: Send + Sync {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Keep leaves whose name or keywords contain the utterance; an empty
/// result means the filter is discarded
fn keyword_refilter(utterance: &str, candidates: Vec<String>, index: &KeywordIndex) -> Vec<String> {
    let filtered: Vec<String> = candidates
        .iter()
        .filter(|leaf| {
            leaf.to_lowercase().contains(utterance)
                || index
                    .keywords(leaf)
                    .iter()
                    .any(|keyword| keyword.to_lowercase().contains(utterance))
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        candidates
    } else {
        filtered
    }
}

/// Select leaves from cosine scores aligned with `leaves`
pub fn select_by_similarity(
    utterance: &str,
    leaves: &[String],
    scores: &[f32],
    index: &KeywordIndex,
    config: &VectorConfig,
) -> Vec<String> {
    if leaves.is_empty() || leaves.len() != scores.len() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..leaves.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(scores[i])));

    let top = order[0];
    if order.len() == 1 {
        return vec![leaves[top].clone()];
    }

    let max = scores[top];
    let gap = max - scores[order[1]];
    let utterance = utterance.trim().to_lowercase();
    let short = char_len(&utterance) <= config.short_query_max_len;

    let (base, window) = if short {
        (config.short_base_threshold, config.short_window)
    } else {
        (config.long_base_threshold, config.long_window)
    };

    let above = |threshold: f32| -> Vec<String> {
        order
            .iter()
            .filter(|&&i| scores[i] >= threshold)
            .map(|&i| leaves[i].clone())
            .collect()
    };

    let threshold = base.max(max - window);
    let mut result = keyword_refilter(&utterance, above(threshold), index);

    if short {
        if max >= config.short_collapse_min_top && gap >= config.short_collapse_min_gap {
            result = vec![leaves[top].clone()];
        } else if max < config.short_low_confidence {
            result.truncate(config.short_low_confidence_cap);
        }
    } else if gap >= config.long_collapse_min_gap && max >= config.long_collapse_min_top {
        result = vec![leaves[top].clone()];
    }

    let floor = if short {
        config.short_min_results
    } else {
        config.long_min_results
    };

    if result.len() < floor && order.len() > result.len() {
        let relaxed = config.relaxed_floor.max(max - config.relaxed_window);
        result = keyword_refilter(&utterance, above(relaxed), index);
        tracing::debug!(relaxed, results = result.len(), "Relaxed vector threshold");
    }

    result.truncate(config.max_results);
    if result.is_empty() {
        result.push(leaves[top].clone());
    }
    result
}

/// Encode off the async executor and rank the catalog against the utterance
pub async fn vector_match(
    encoder: Arc<dyn TextEncoder>,
    utterance: &str,
    leaves: &[String],
    index: &KeywordIndex,
    config: &VectorConfig,
) -> Result<Vec<String>> {
    if leaves.is_empty() || utterance.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query = utterance.to_string();
    let names = leaves.to_vec();
    let scores = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
        let query_vec = encoder
            .encode(std::slice::from_ref(&query))?
            .into_iter()
            .next()
            .ok_or_else(|| MenuError::Embedding("encoder returned no query vector".into()))?;
        let leaf_vecs = encoder.encode(&names)?;
        if leaf_vecs.len() != names.len() {
            return Err(MenuError::Embedding(format!(
                "encoder returned {} vectors for {} leaves",
                leaf_vecs.len(),
                names.len()
            )));
        }
        Ok(leaf_vecs.iter().map(|v| cosine(&query_vec, v)).collect())
    })
    .await
    .map_err(|e| MenuError::Embedding(format!("inference task failed: {}", e)))??;

    Ok(select_by_similarity(utterance, leaves, &scores, index, config))
}
