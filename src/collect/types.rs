// src/collect/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;

/// Content sources the pipeline knows how to collect from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSource {
    Qiita,
    Zenn,
    HackerNews,
}

impl ArticleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleSource::Qiita => "qiita",
            ArticleSource::Zenn => "zenn",
            ArticleSource::HackerNews => "hackernews",
        }
    }
}

impl fmt::Display for ArticleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collected article flowing through the pipeline.
///
/// `relevance_score` is 0.0 at creation and written exactly once by the
/// scorer; dedup and filtering only keep or drop, never mutate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Article {
    /// Source-qualified identifier, e.g. "qiita:4f1d2a...".
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub source: ArticleSource,
    #[serde(default)]
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    /// Source-native popularity (likes, points). Non-negative when present.
    pub popularity: Option<f32>,
    #[serde(default)]
    pub relevance_score: f32,
}

impl Article {
    /// Lowercase concatenation of title, excerpt and tags; the haystack for
    /// keyword matching in scoring and exclusion.
    pub fn searchable_corpus(&self) -> String {
        let mut corpus = String::with_capacity(
            self.title.len() + self.excerpt.as_deref().map_or(0, str::len) + 32,
        );
        corpus.push_str(&self.title);
        if let Some(excerpt) = &self.excerpt {
            corpus.push(' ');
            corpus.push_str(excerpt);
        }
        for tag in &self.tags {
            corpus.push(' ');
            corpus.push_str(tag);
        }
        corpus.to_lowercase()
    }
}

/// Recorded by the orchestrator when one adapter exhausts its retries or
/// dies unexpectedly. Never fatal to the run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionError {
    pub source: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl CollectionError {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// The sole output of a collection run. Value object; not mutated further.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionResult {
    pub articles: Vec<Article>,
    pub errors: Vec<CollectionError>,
    pub completed_at: DateTime<Utc>,
}

/// Caller-supplied curation criteria.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// Custom relevance keywords, each matched at implicit weight 0.5.
    pub keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    /// Must lie in [0, 1].
    pub min_relevance_score: f32,
    /// Must be at least 1.
    pub max_articles_per_day: usize,
}

/// Bad orchestration input. The only error that aborts a whole run;
/// everything below the adapter boundary settles into `CollectionError`s.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),
    #[error("no source adapters enabled")]
    NoSourcesEnabled,
}

/// One content source. Implementations must skip individual malformed
/// records (log and continue) and fail only when nothing at all can be
/// produced from the payload. Returned articles carry `relevance_score`
/// 0.0 and a populated source tag.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn collect(
        &self,
        search_terms: &[String],
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            id: "qiita:abc".into(),
            title: "Rust async patterns".into(),
            url: "https://example.test/a".into(),
            author: "alice".into(),
            published_at: Utc::now(),
            source: ArticleSource::Qiita,
            tags: vec!["Rust".into(), "Tokio".into()],
            excerpt: Some("Deep dive".into()),
            popularity: Some(42.0),
            relevance_score: 0.0,
        }
    }

    #[test]
    fn corpus_is_lowercased_and_includes_tags() {
        let corpus = article().searchable_corpus();
        assert!(corpus.contains("rust async patterns"));
        assert!(corpus.contains("deep dive"));
        assert!(corpus.contains("tokio"));
    }

    #[test]
    fn source_display_matches_tag() {
        assert_eq!(ArticleSource::HackerNews.to_string(), "hackernews");
        assert_eq!(ArticleSource::Zenn.as_str(), "zenn");
    }
}
