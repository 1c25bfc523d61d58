// src/notify/mod.rs
//! Digest delivery. Notifier failure is reported but never invalidates an
//! otherwise-successful collection run.

pub mod discord;
pub mod slack;

use crate::collect::retry::{self, RetryConfig};
use crate::collect::types::{Article, CollectionResult};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// The payload handed to notifiers: the final ranked articles plus run
/// context.
#[derive(Debug, Clone)]
pub struct Digest {
    pub articles: Vec<Article>,
    pub source_errors: usize,
    pub generated_at: DateTime<Utc>,
}

impl Digest {
    pub fn from_result(result: &CollectionResult) -> Self {
        Self {
            articles: result.articles.clone(),
            source_errors: result.errors.len(),
            generated_at: result.completed_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Plain-text digest lines shared by the webhook formatters.
pub fn format_lines(digest: &Digest) -> String {
    if digest.articles.is_empty() {
        return "No articles passed curation today.".to_string();
    }
    let mut out = String::new();
    for (i, article) in digest.articles.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({:.2}, {})\n{}\n",
            i + 1,
            article.title,
            article.relevance_score,
            article.source,
            article.url
        ));
    }
    if digest.source_errors > 0 {
        out.push_str(&format!(
            "\n{} source(s) failed this run.",
            digest.source_errors
        ));
    }
    out
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, digest: &Digest) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Per-notifier delivery outcome summary.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(&'static str, String)>,
}

/// Fans one digest out to every registered notifier. Each send runs through
/// the retry executor; failures are collected, logged and returned, never
/// raised.
pub struct NotifierMux {
    notifiers: Vec<Box<dyn Notifier>>,
    retry: RetryConfig,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
            retry: RetryConfig {
                max_retries: 2,
                ..RetryConfig::default()
            },
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn push(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn send_all(&self, digest: &Digest) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for notifier in &self.notifiers {
            let outcome = retry::with_retry(&self.retry, || notifier.send(digest)).await;
            match outcome {
                Ok(()) => {
                    tracing::info!(notifier = notifier.name(), "digest delivered");
                    report.delivered += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        notifier = notifier.name(),
                        error = %err,
                        "digest delivery failed"
                    );
                    report.failed.push((notifier.name(), err.to_string()));
                }
            }
        }
        report
    }
}

impl Default for NotifierMux {
    fn default() -> Self {
        Self::new()
    }
}
