// src/collect/filter.rs
//! Exclusion, threshold, ranking and truncation. Membership and order
//! change here; no article is mutated.

use crate::collect::types::{Article, FilterCriteria};
use std::cmp::Ordering;

/// Apply criteria to an already-scored batch: drop articles whose corpus
/// contains an exclude keyword, drop those under the relevance threshold,
/// stable-sort descending by relevance (ties keep arrival order), truncate
/// to the daily cap.
pub fn apply(mut articles: Vec<Article>, criteria: &FilterCriteria) -> Vec<Article> {
    let excludes: Vec<String> = criteria
        .exclude_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let before = articles.len();
    if !excludes.is_empty() {
        articles.retain(|article| {
            let corpus = article.searchable_corpus();
            !excludes.iter().any(|kw| corpus.contains(kw.as_str()))
        });
    }
    let excluded = before - articles.len();

    let before = articles.len();
    articles.retain(|article| article.relevance_score >= criteria.min_relevance_score);
    let under_threshold = before - articles.len();

    // Vec::sort_by is stable; equal scores preserve relative input order.
    articles.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    articles.truncate(criteria.max_articles_per_day);

    tracing::debug!(
        excluded,
        under_threshold,
        selected = articles.len(),
        "filter stage complete"
    );
    articles
}
