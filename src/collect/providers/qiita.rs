// src/collect/providers/qiita.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

use super::{clean_excerpt, ItemTransformError, SOURCE_CALL_DELAY};
use crate::collect::types::{Article, ArticleSource, SourceAdapter};

pub const DEFAULT_BASE_URL: &str = "https://qiita.com/api/v2";
const PER_PAGE: u32 = 50;

#[derive(Debug, Deserialize)]
struct RawItem {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    created_at: Option<String>,
    likes_count: Option<u32>,
    body: Option<String>,
    #[serde(default)]
    tags: Vec<RawTag>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: Option<String>,
}

/// Collects articles from the Qiita REST API v2, one tag query per search
/// term.
pub struct QiitaAdapter {
    mode: Mode,
    /// Source-specific tags; when empty, the caller's search terms are
    /// used as tags.
    tags: Vec<String>,
    token: Option<String>,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

impl QiitaAdapter {
    pub fn new() -> Self {
        Self::from_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn from_base_url(base_url: String) -> Self {
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
                base_url,
            },
            tags: Vec::new(),
            token: std::env::var("QIITA_API_TOKEN").ok(),
        }
    }

    pub fn from_fixture_str(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
            tags: Vec::new(),
            token: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    fn to_article(raw: RawItem) -> Result<Article, ItemTransformError> {
        let id = raw
            .id
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("qiita", "missing id"))?;
        let title = raw
            .title
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("qiita", "missing title"))?;
        let url = raw
            .url
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("qiita", "missing url"))?;
        let published_at = raw
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ItemTransformError::new("qiita", "missing or bad created_at"))?;

        Ok(Article {
            id: format!("qiita:{id}"),
            title,
            url,
            author: raw
                .user
                .and_then(|u| u.id)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            published_at,
            source: ArticleSource::Qiita,
            tags: raw.tags.into_iter().map(|t| t.name).collect(),
            excerpt: raw.body.as_deref().and_then(clean_excerpt),
            popularity: raw.likes_count.map(|n| n as f32),
            relevance_score: 0.0,
        })
    }

    fn parse_items(json: &str) -> Result<Vec<Article>> {
        let raw: Vec<RawItem> = serde_json::from_str(json).context("parsing qiita items json")?;
        let mut out = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for item in raw {
            match Self::to_article(item) {
                Ok(article) => out.push(article),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(error = %err, "skipping malformed qiita item");
                }
            }
        }
        if out.is_empty() && skipped > 0 {
            bail!("qiita payload yielded no usable items ({skipped} malformed)");
        }
        Ok(out)
    }
}

impl Default for QiitaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for QiitaAdapter {
    async fn collect(
        &self,
        search_terms: &[String],
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>> {
        let terms: &[String] = if self.tags.is_empty() {
            search_terms
        } else {
            &self.tags
        };

        let mut articles = match &self.mode {
            Mode::Fixture(json) => Self::parse_items(json)?,
            Mode::Http { client, base_url } => {
                let mut seen_ids = HashSet::new();
                let mut merged = Vec::new();
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(SOURCE_CALL_DELAY).await;
                    }
                    let mut query = format!("tag:{term}");
                    if let Some(since) = since {
                        query.push_str(&format!(" created:>{}", since.format("%Y-%m-%d")));
                    }
                    let mut request = client
                        .get(format!("{base_url}/items"))
                        .query(&[("per_page", PER_PAGE.to_string()), ("query", query)]);
                    if let Some(token) = &self.token {
                        request = request.bearer_auth(token);
                    }
                    let body = request
                        .send()
                        .await
                        .context("qiita items get")?
                        .error_for_status()
                        .context("qiita items non-2xx")?
                        .text()
                        .await
                        .context("qiita items body")?;
                    for article in Self::parse_items(&body)? {
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
        "qiita"
    }
}
