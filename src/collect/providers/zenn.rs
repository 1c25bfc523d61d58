// src/collect/providers/zenn.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::HashSet;

use super::{clean_excerpt, ItemTransformError, SOURCE_CALL_DELAY};
use crate::collect::types::{Article, ArticleSource, SourceAdapter};

pub const DEFAULT_BASE_URL: &str = "https://zenn.dev";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "dc:creator", default)]
    creator: Option<String>,
}

fn parse_rfc2822_utc(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc2822(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Collects articles from Zenn topic RSS feeds, one feed per search term.
pub struct ZennAdapter {
    mode: Mode,
    /// Source-specific topics; when empty, the caller's search terms are
    /// used as topics.
    topics: Vec<String>,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

impl ZennAdapter {
    pub fn new() -> Self {
        Self::from_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn from_base_url(base_url: String) -> Self {
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
                base_url,
            },
            topics: Vec::new(),
        }
    }

    pub fn from_fixture_str(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
            topics: Vec::new(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    fn to_article(item: Item, topic: &str) -> Result<Article, ItemTransformError> {
        let title = item
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("zenn", "missing title"))?;
        let link = item
            .link
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ItemTransformError::new("zenn", "missing link"))?;
        let author = item
            .creator
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "zenn".to_string());

        Ok(Article {
            id: format!("zenn:{link}"),
            title,
            url: link,
            author,
            published_at: item
                .pub_date
                .as_deref()
                .map(parse_rfc2822_utc)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            source: ArticleSource::Zenn,
            tags: vec![topic.to_string()],
            excerpt: item.description.as_deref().and_then(clean_excerpt),
            popularity: None,
            relevance_score: 0.0,
        })
    }

    fn parse_feed(xml: &str, topic: &str) -> Result<Vec<Article>> {
        let rss: Rss = from_str(xml).context("parsing zenn rss xml")?;
        let mut out = Vec::with_capacity(rss.channel.items.len());
        let mut skipped = 0usize;
        for item in rss.channel.items {
            match Self::to_article(item, topic) {
                Ok(article) => out.push(article),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(error = %err, "skipping malformed zenn item");
                }
            }
        }
        if out.is_empty() && skipped > 0 {
            bail!("zenn feed yielded no usable items ({skipped} malformed)");
        }
        Ok(out)
    }
}

impl Default for ZennAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ZennAdapter {
    async fn collect(
        &self,
        search_terms: &[String],
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>> {
        let terms: &[String] = if self.topics.is_empty() {
            search_terms
        } else {
            &self.topics
        };

        let mut articles = match &self.mode {
            Mode::Fixture(xml) => {
                let topic = terms.first().map(String::as_str).unwrap_or("tech");
                Self::parse_feed(xml, topic)?
            }
            Mode::Http { client, base_url } => {
                let mut seen_ids = HashSet::new();
                let mut merged = Vec::new();
                for (i, topic) in terms.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(SOURCE_CALL_DELAY).await;
                    }
                    let url = format!("{base_url}/topics/{topic}/feed");
                    let body = client
                        .get(&url)
                        .send()
                        .await
                        .context("zenn feed get")?
                        .error_for_status()
                        .context("zenn feed non-2xx")?
                        .text()
                        .await
                        .context("zenn feed body")?;
                    for article in Self::parse_feed(&body, topic)? {
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
        "zenn"
    }
}
