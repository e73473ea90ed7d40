//! Lexical keyword scoring
//!
//! Always available and cheap; every other strategy falls back to it.

use crate::core::config::KeywordScoringConfig;
use crate::core::types::char_len;
use crate::keywords::KeywordIndex;
use crate::matcher::MatchCandidate;
use ordered_float::OrderedFloat;

/// Scores one leaf against a lower-cased utterance
struct LeafScore {
    score: u32,
    exact: bool,
}

/// The utterance and the leaf name contain one another
fn name_overlaps(utterance: &str, leaf: &str) -> bool {
    utterance.contains(leaf) || leaf.contains(utterance)
}

fn score_leaf(
    utterance: &str,
    leaf: &str,
    keywords: &[String],
    config: &KeywordScoringConfig,
) -> LeafScore {
    let mut state = LeafScore {
        score: 0,
        exact: false,
    };
    let utterance_len = char_len(utterance) as u32;

    if name_overlaps(utterance, &leaf.to_lowercase()) {
        state.score += config.exact_bonus;
        state.exact = true;
    }

    let fallback = [leaf.to_string()];
    let keywords = if keywords.is_empty() {
        &fallback[..]
    } else {
        keywords
    };

    for keyword in keywords {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        let keyword_len = char_len(&keyword) as u32;

        if keyword.contains(utterance) {
            state.score += utterance_len * config.contained_weight;
            state.exact = true;
        } else if utterance.contains(keyword.as_str()) {
            if keyword_len >= utterance_len {
                state.score += keyword_len * config.long_keyword_weight;
            } else if keyword_len as usize >= config.medium_keyword_min_len {
                state.score += keyword_len * config.medium_keyword_weight;
            } else if !state.exact && keyword_len as usize >= config.short_keyword_min_len {
                state.score += keyword_len * config.short_keyword_weight;
            }
        }
    }

    state
}

/// Every leaf with a positive score, best first (stable for ties)
pub fn rank(
    utterance: &str,
    leaves: &[String],
    index: &KeywordIndex,
    config: &KeywordScoringConfig,
) -> Vec<MatchCandidate> {
    let utterance = utterance.trim().to_lowercase();
    if utterance.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<MatchCandidate> = leaves
        .iter()
        .filter_map(|leaf| {
            let scored = score_leaf(&utterance, leaf, index.keywords(leaf), config);
            (scored.score > 0).then(|| MatchCandidate::new(leaf.clone(), scored.score as f64))
        })
        .collect();

    ranked.sort_by_key(|candidate| std::cmp::Reverse(OrderedFloat(candidate.score)));
    ranked
}

/// Apply the decisive margin to a ranked list
pub fn select(ranked: Vec<MatchCandidate>, config: &KeywordScoringConfig) -> Vec<String> {
    match ranked.as_slice() {
        [] => Vec::new(),
        [only] => vec![only.leaf_name.clone()],
        [top, second, ..] if top.score - second.score >= config.decisive_margin as f64 => {
            vec![top.leaf_name.clone()]
        }
        _ => ranked.into_iter().map(|c| c.leaf_name).collect(),
    }
}

/// Keyword strategy entry point
pub fn keyword_match(
    utterance: &str,
    leaves: &[String],
    index: &KeywordIndex,
    config: &KeywordScoringConfig,
) -> Vec<String> {
    let ranked = rank(utterance, leaves, index, config);
    if let Some(top) = ranked.first() {
        tracing::debug!(
            candidates = ranked.len(),
            top = %top.leaf_name,
            score = top.score,
            "Keyword scoring"
        );
    }
    select(ranked, config)
}
