// src/collect/dedup.rs
//! Duplicate removal by normalized URL and normalized title, plus a
//! separately callable near-duplicate similarity utility.

use crate::collect::types::Article;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

/// Query parameters stripped during URL normalization.
pub const TRACKING_PARAMS: [&str; 5] = ["utm_source", "utm_medium", "utm_campaign", "ref", "source"];

/// Why `admit` dropped an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UrlDuplicate,
    TitleDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Keep,
    Drop(DropReason),
}

/// Canonical form of a URL for identity comparison: known tracking
/// parameters removed, one trailing path slash stripped (unless the path is
/// exactly `/`), re-serialized. Unparseable input falls back to its trimmed
/// raw form.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    if parsed.path() != "/" {
        if let Some(stripped) = parsed.path().strip_suffix('/') {
            let stripped = stripped.to_string();
            parsed.set_path(&stripped);
        }
    }

    parsed.to_string()
}

fn fold_fullwidth(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Canonical form of a title for identity comparison.
///
/// Lowercase, fullwidth Latin/digits folded to halfwidth, everything
/// outside word characters / whitespace / Hiragana / Katakana / CJK
/// (and the `-./` separators the date and version patterns consume)
/// stripped, whitespace collapsed, then date-like and version-like
/// substrings replaced with the literal placeholders `YYYY-MM-DD` and
/// `vX.X.X`.
pub fn normalize_title(raw: &str) -> String {
    static RE_STRIP: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    static RE_DATE: OnceCell<Regex> = OnceCell::new();
    static RE_VERSION: OnceCell<Regex> = OnceCell::new();

    let folded: String = raw.to_lowercase().chars().map(fold_fullwidth).collect();

    let re_strip = RE_STRIP.get_or_init(|| {
        Regex::new(r"[^\w\s\x{3040}-\x{30FF}\x{4E00}-\x{9FFF}\-./]").unwrap()
    });
    let stripped = re_strip.replace_all(&folded, "");

    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let collapsed = re_ws.replace_all(stripped.trim(), " ").to_string();

    let re_date = RE_DATE
        .get_or_init(|| Regex::new(r"\d{4}[-/年]\d{1,2}[-/月]\d{1,2}日?").unwrap());
    let dated = re_date.replace_all(&collapsed, "YYYY-MM-DD");

    let re_version = RE_VERSION.get_or_init(|| Regex::new(r"v?\d+\.\d+(?:\.\d+)?").unwrap());
    re_version.replace_all(&dated, "vX.X.X").to_string()
}

/// Stateful duplicate filter. Seen-sets are owned by one instance and
/// persist across calls against it; `clear` starts a fresh run. Mutated
/// strictly sequentially — the orchestrator only runs it after all
/// concurrent collection has settled, so no locking is involved.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct Deduplicator {
    seen_urls: HashSet<String>,
    seen_titles: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or drop one article. URL identity is checked before title
    /// identity; both keys are recorded together on keep.
    pub fn admit(&mut self, article: &Article) -> Admission {
        let url = normalize_url(&article.url);
        let title = normalize_title(&article.title);
        if self.seen_urls.contains(&url) {
            return Admission::Drop(DropReason::UrlDuplicate);
        }
        if self.seen_titles.contains(&title) {
            return Admission::Drop(DropReason::TitleDuplicate);
        }
        self.seen_urls.insert(url);
        self.seen_titles.insert(title);
        Admission::Keep
    }

    /// Run `admit` over a batch in arrival order.
    /// Returns (kept, url_duplicates, title_duplicates).
    pub fn admit_all(&mut self, articles: Vec<Article>) -> (Vec<Article>, usize, usize) {
        let mut kept = Vec::with_capacity(articles.len());
        let mut url_dups = 0usize;
        let mut title_dups = 0usize;
        for article in articles {
            match self.admit(&article) {
                Admission::Keep => kept.push(article),
                Admission::Drop(DropReason::UrlDuplicate) => {
                    tracing::debug!(id = %article.id, "dropped url duplicate");
                    url_dups += 1;
                }
                Admission::Drop(DropReason::TitleDuplicate) => {
                    tracing::debug!(id = %article.id, "dropped title duplicate");
                    title_dups += 1;
                }
            }
        }
        (kept, url_dups, title_dups)
    }

    pub fn clear(&mut self) {
        self.seen_urls.clear();
        self.seen_titles.clear();
    }

    pub fn seen_count(&self) -> usize {
        self.seen_urls.len()
    }

    /// Serialize the seen-sets so a caller may persist dedup identity
    /// across invocations.
    pub fn to_snapshot(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_snapshot(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Normalized edit-distance similarity of two titles in [0, 1]:
/// `1 - levenshtein(a, b) / max(len)` over normalized forms.
pub fn title_similarity(a: &str, b: &str) -> f32 {
    let na = normalize_title(a);
    let nb = normalize_title(b);
    let max_len = na.chars().count().max(nb.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(&na, &nb) as f32 / max_len as f32
}

/// Pairwise near-duplicate audit over a slice. Exposed for optional
/// auditing only; the admit path enforces exact normalized equality and
/// deliberately does not consult this.
#[derive(Debug, Clone, Copy)]
pub struct NearDuplicateAuditor {
    pub threshold: f32,
}

impl Default for NearDuplicateAuditor {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

impl NearDuplicateAuditor {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn are_near_duplicates(&self, a: &str, b: &str) -> bool {
        title_similarity(a, b) >= self.threshold
    }

    /// Index pairs (i, j) with i < j whose titles meet the threshold,
    /// with their similarity.
    pub fn audit(&self, articles: &[Article]) -> Vec<(usize, usize, f32)> {
        let mut pairs = Vec::new();
        for i in 0..articles.len() {
            for j in (i + 1)..articles.len() {
                let sim = title_similarity(&articles[i].title, &articles[j].title);
                if sim >= self.threshold {
                    pairs.push((i, j, sim));
                }
            }
        }
        pairs
    }
}
