// src/collect/providers/mod.rs
//! Source adapters. Each one translates a source's native wire format into
//! [`Article`](crate::collect::types::Article)s, skipping individual
//! malformed records and failing only when nothing usable can be produced.

pub mod hacker_news;
pub mod qiita;
pub mod zenn;

use once_cell::sync::OnceCell;
use regex::Regex;
use std::time::Duration;

/// Advisory fixed delay between successive calls toward the same source
/// (not adaptive backpressure; a token-bucket limiter per source is the
/// production hardening).
pub(crate) const SOURCE_CALL_DELAY: Duration = Duration::from_millis(250);

pub(crate) const EXCERPT_MAX_CHARS: usize = 500;

/// One malformed raw record inside an adapter. Skipped and logged, never
/// escalated on its own.
//
// NOTE: hand-written `Display`/`Error` instead of `#[derive(thiserror::Error)]`
// because thiserror treats any field named `source` as the error-source field
// (requiring `std::error::Error`), but here `source` is a source *name* string.
// The impls below reproduce exactly what `#[error("malformed {source} record:
// {reason}")]` would generate.
#[derive(Debug)]
pub struct ItemTransformError {
    pub source: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ItemTransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed {} record: {}", self.source, self.reason)
    }
}

impl std::error::Error for ItemTransformError {}

impl ItemTransformError {
    pub(crate) fn new(source: &'static str, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
        }
    }
}

/// Decode HTML entities, strip tags, collapse whitespace, cap length.
pub(crate) fn clean_excerpt(raw: &str) -> Option<String> {
    let mut out = html_escape::decode_html_entities(raw).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(out.trim(), " ").to_string();

    if out.chars().count() > EXCERPT_MAX_CHARS {
        out = out.chars().take(EXCERPT_MAX_CHARS).collect();
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
