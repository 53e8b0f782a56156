//! Source merging, overlap and vote weighting.

use std::collections::{BTreeSet, HashMap};

use crate::consensus::ordered_sum;
use crate::domain::{AgentResult, ResearchSource};

/// Diversity bonus per distinct category, capped at [`MAX_DIVERSITY_BONUS`].
const DIVERSITY_BONUS_PER_CATEGORY: f64 = 1.0 / 25.0;
const MAX_DIVERSITY_BONUS: f64 = 0.2;

/// Merge and deduplicate the sources cited by `results`.
///
/// All `(source, agent)` pairs are ranked by relevance x credibility
/// (descending, stable), then folded by URL. The first occurrence of a URL
/// becomes a copy that keeps any citations it already carried and gains the
/// citing agent; later occurrences only append their agent to `cited_by`.
/// Inputs are never mutated.
pub fn merge_sources(results: &[AgentResult]) -> Vec<ResearchSource> {
    let mut cited: Vec<(&ResearchSource, &str)> = results
        .iter()
        .flat_map(|r| r.sources.iter().map(move |s| (s, r.agent_id.as_str())))
        .collect();
    cited.sort_by(|a, b| b.0.quality().total_cmp(&a.0.quality()));

    let mut merged: Vec<ResearchSource> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (source, agent_id) in cited {
        match position.get(source.url.as_str()) {
            Some(&idx) => merged[idx].add_citation(agent_id),
            None => {
                let mut canonical = source.clone();
                canonical.add_citation(agent_id);
                position.insert(source.url.as_str(), merged.len());
                merged.push(canonical);
            }
        }
    }
    merged
}

/// Mean pairwise Jaccard similarity of the agents' URL sets.
///
/// Returns 1.0 for fewer than two agents. Pairs where both agents cite
/// nothing are skipped; if every pair is skipped the overlap is 0.0.
pub fn source_overlap(results: &[AgentResult]) -> f64 {
    if results.len() < 2 {
        return 1.0;
    }

    let url_sets: Vec<BTreeSet<&str>> = results
        .iter()
        .map(|r| r.sources.iter().map(|s| s.url.as_str()).collect())
        .collect();

    let mut overlaps = Vec::new();
    for (i, urls_a) in url_sets.iter().enumerate() {
        for urls_b in &url_sets[i + 1..] {
            let union = urls_a.union(urls_b).count();
            if union == 0 {
                continue;
            }
            let intersection = urls_a.intersection(urls_b).count();
            overlaps.push(intersection as f64 / union as f64);
        }
    }

    if overlaps.is_empty() {
        return 0.0;
    }
    let pairs = overlaps.len() as f64;
    ordered_sum(overlaps) / pairs
}

/// Mean credibility plus a category-diversity bonus, capped at 1.0.
pub fn source_quality(sources: &[ResearchSource]) -> f64 {
    if sources.is_empty() {
        return 0.0;
    }
    let credibility =
        ordered_sum(sources.iter().map(|s| s.credibility_score).collect()) / sources.len() as f64;
    let categories: BTreeSet<_> = sources.iter().map(|s| s.category).collect();
    let diversity_bonus =
        (categories.len() as f64 * DIVERSITY_BONUS_PER_CATEGORY).min(MAX_DIVERSITY_BONUS);
    (credibility + diversity_bonus).min(1.0)
}

/// Voting weight: confidence x source quality x source-count factor.
///
/// The count factor is `sources / min_sources_per_agent` capped at 1.0
/// (1.0 when no minimum is configured). An agent without sources weighs 0.
pub fn vote_weight(result: &AgentResult, min_sources_per_agent: usize) -> f64 {
    let count_factor = if min_sources_per_agent == 0 {
        1.0
    } else {
        (result.sources.len() as f64 / min_sources_per_agent as f64).min(1.0)
    };
    result.confidence * source_quality(&result.sources) * count_factor
}
