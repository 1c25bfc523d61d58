// src/collect/providers/hacker_news.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

use super::{clean_excerpt, ItemTransformError, SOURCE_CALL_DELAY};
use crate::collect::types::{Article, ArticleSource, SourceAdapter};

pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1";
const HITS_PER_PAGE: u32 = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    created_at_i: Option<i64>,
    points: Option<i64>,
    story_text: Option<String>,
}

/// Collects stories from the Algolia Hacker News search API, one query per
/// search term.
pub struct HackerNewsAdapter {
    mode: Mode,
    /// Source-specific queries; when empty, the caller's search terms are
    /// used.
    queries: Vec<String>,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

impl HackerNewsAdapter {
    pub fn new() -> Self {
        Self::from_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn from_base_url(base_url: String) -> Self {
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
                base_url,
            },
            queries: Vec::new(),
        }
    }

    pub fn from_fixture_str(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
            queries: Vec::new(),
        }
    }

    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    fn to_article(hit: Hit) -> Result<Article, ItemTransformError> {
        let object_id = hit
            .object_id
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("hackernews", "missing objectID"))?;
        let title = hit
            .title
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("hackernews", "missing title"))?;
        // Ask/Show HN stories carry no outbound URL; fall back to the item
        // page so URL identity stays well-defined.
        let url = hit
            .url
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={object_id}"));

        Ok(Article {
            id: format!("hackernews:{object_id}"),
            title,
            url,
            author: hit
                .author
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            published_at: hit
                .created_at_i
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            source: ArticleSource::HackerNews,
            tags: vec![],
            excerpt: hit.story_text.as_deref().and_then(clean_excerpt),
            popularity: hit.points.map(|p| p.max(0) as f32),
            relevance_score: 0.0,
        })
    }

    fn parse_response(json: &str) -> Result<Vec<Article>> {
        let response: SearchResponse =
            serde_json::from_str(json).context("parsing hn search json")?;
        let mut out = Vec::with_capacity(response.hits.len());
        let mut skipped = 0usize;
        for hit in response.hits {
            match Self::to_article(hit) {
                Ok(article) => out.push(article),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(error = %err, "skipping malformed hn hit");
                }
            }
        }
        if out.is_empty() && skipped > 0 {
            bail!("hn payload yielded no usable items ({skipped} malformed)");
        }
        Ok(out)
    }
}

impl Default for HackerNewsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    async fn collect(
        &self,
        search_terms: &[String],
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>> {
        let terms: &[String] = if self.queries.is_empty() {
            search_terms
        } else {
            &self.queries
        };

        let mut articles = match &self.mode {
            Mode::Fixture(json) => Self::parse_response(json)?,
            Mode::Http { client, base_url } => {
                let mut seen_ids = HashSet::new();
                let mut merged = Vec::new();
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(SOURCE_CALL_DELAY).await;
                    }
                    let hits = HITS_PER_PAGE.to_string();
                    let mut request = client.get(format!("{base_url}/search")).query(&[
                        ("query", term.as_str()),
                        ("tags", "story"),
                        ("hitsPerPage", hits.as_str()),
                    ]);
                    if let Some(since) = since {
                        request = request
                            .query(&[("numericFilters", format!("created_at_i>{}", since.timestamp()))]);
                    }
                    let body = request
                        .send()
                        .await
                        .context("hn search get")?
                        .error_for_status()
                        .context("hn search non-2xx")?
                        .text()
                        .await
                        .context("hn search body")?;
                    for article in Self::parse_response(&body)? {
                        if seen_ids.insert(article.id.clone()) {
                            merged.push(article);
                        }
                    }
                }
                merged
            }
        };

        if let Some(since) = since {
            articles.retain(|a| a.published_at > since);
        }
        Ok(articles)
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}
