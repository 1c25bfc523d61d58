// src/collect/score.rs
//! Weighted keyword relevance scoring.
//!
//! The formula's exact shape (bonus factors, the divisor-3 normalization,
//! the clamp) is a contract consumed by filtering thresholds tuned against
//! it. Do not improve it.

use crate::collect::types::Article;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Weight applied to every caller-supplied custom keyword.
pub const CUSTOM_KEYWORD_WEIGHT: f32 = 0.5;

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Fixed (keyword, weight) table, loaded from JSON or TOML with a built-in
/// seed as fallback. Keys are stored lowercase; weights clamped to [0, 1].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordWeights {
    #[serde(default)]
    pub weights: HashMap<String, f32>,
}

impl KeywordWeights {
    /// Built-in table of AI/tech topics.
    pub fn default_seed() -> Self {
        let pairs: [(&str, f32); 18] = [
            ("chatgpt", 1.0),
            ("openai", 0.9),
            ("claude", 0.9),
            ("anthropic", 0.8),
            ("gemini", 0.8),
            ("llm", 0.9),
            ("生成ai", 1.0),
            ("生成 ai", 0.9),
            ("machine learning", 0.7),
            ("機械学習", 0.7),
            ("deep learning", 0.7),
            ("rag", 0.7),
            ("fine-tuning", 0.6),
            ("prompt", 0.6),
            ("agent", 0.6),
            ("transformer", 0.5),
            ("diffusion", 0.5),
            ("copilot", 0.5),
        ];
        Self {
            weights: pairs
                .into_iter()
                .map(|(k, w)| (k.to_string(), w))
                .collect(),
        }
        .normalized()
    }

    /// Load from a JSON or TOML file; falls back to `default_seed` when the
    /// file is missing or malformed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default_seed();
        };
        let parsed = match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str::<Self>(&content).ok(),
            _ => serde_json::from_str::<Self>(&content).ok(),
        };
        parsed.map(Self::normalized).unwrap_or_else(Self::default_seed)
    }

    fn normalized(self) -> Self {
        Self {
            weights: self
                .weights
                .into_iter()
                .filter(|(k, _)| !k.trim().is_empty())
                .map(|(k, w)| (k.trim().to_lowercase(), clamp01(w)))
                .collect(),
        }
    }
}

/// Pure scorer over one article. Writes nothing; `apply` performs the
/// single permitted write of `relevance_score`.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    table: KeywordWeights,
}

impl RelevanceScorer {
    pub fn new(table: KeywordWeights) -> Self {
        Self { table }
    }

    pub fn with_default_seed() -> Self {
        Self::new(KeywordWeights::default_seed())
    }

    /// Relevance of `article` in [0, 1].
    ///
    /// raw: table weight per table keyword found in the corpus, plus 0.5
    /// per custom keyword found; title bonus: 30% of weight per table
    /// keyword found in the title; tag bonus: 20% of weight per table
    /// keyword found inside each tag; popularity bonus: 0.2 / 0.1 / 0.05
    /// above 100 / 50 / 20. Sum divided by 3.0, clamped to [0, 1] — the
    /// clamp is the only hard guarantee of the bound.
    pub fn score(&self, article: &Article, custom_keywords: &[String]) -> f32 {
        let corpus = article.searchable_corpus();
        let title = article.title.to_lowercase();

        let mut raw = 0.0f32;
        for (keyword, weight) in &self.table.weights {
            if corpus.contains(keyword.as_str()) {
                raw += weight;
            }
        }
        for keyword in custom_keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && corpus.contains(&keyword) {
                raw += CUSTOM_KEYWORD_WEIGHT;
            }
        }

        let mut title_bonus = 0.0f32;
        for (keyword, weight) in &self.table.weights {
            if title.contains(keyword.as_str()) {
                title_bonus += weight * 0.3;
            }
        }

        let mut tag_bonus = 0.0f32;
        for tag in &article.tags {
            let tag = tag.to_lowercase();
            for (keyword, weight) in &self.table.weights {
                if tag.contains(keyword.as_str()) {
                    tag_bonus += weight * 0.2;
                }
            }
        }

        let popularity_bonus = match article.popularity {
            Some(p) if p > 100.0 => 0.2,
            Some(p) if p > 50.0 => 0.1,
            Some(p) if p > 20.0 => 0.05,
            _ => 0.0,
        };

        ((raw + title_bonus + tag_bonus + popularity_bonus) / 3.0).min(1.0)
    }

    /// Score a batch in place — the write-once mutation of
    /// `relevance_score` in the article lifecycle.
    pub fn apply(&self, articles: &mut [Article], custom_keywords: &[String]) {
        for article in articles.iter_mut() {
            article.relevance_score = self.score(article, custom_keywords);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::types::ArticleSource;
    use chrono::Utc;

    fn table(pairs: &[(&str, f32)]) -> KeywordWeights {
        KeywordWeights {
            weights: pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
        }
    }

    fn article(title: &str, tags: &[&str], excerpt: Option<&str>, popularity: Option<f32>) -> Article {
        Article {
            id: "t:1".into(),
            title: title.into(),
            url: "https://example.test/1".into(),
            author: "a".into(),
            published_at: Utc::now(),
            source: ArticleSource::Zenn,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            excerpt: excerpt.map(Into::into),
            popularity,
            relevance_score: 0.0,
        }
    }

    #[test]
    fn raw_match_in_excerpt_counts_once() {
        let scorer = RelevanceScorer::new(table(&[("llm", 0.9)]));
        let a = article("Weekly digest", &[], Some("all about LLM routing"), None);
        // Only the raw match applies: 0.9 / 3.0.
        let s = scorer.score(&a, &[]);
        assert!((s - 0.3).abs() < 1e-6, "got {s}");
    }

    #[test]
    fn title_and_tag_bonuses_stack() {
        let scorer = RelevanceScorer::new(table(&[("llm", 1.0)]));
        let a = article("LLM patterns", &["llm"], None, None);
        // raw 1.0 + title 0.3 + tag 0.2 = 1.5; / 3.0 = 0.5.
        let s = scorer.score(&a, &[]);
        assert!((s - 0.5).abs() < 1e-6, "got {s}");
    }

    #[test]
    fn custom_keywords_weigh_half() {
        let scorer = RelevanceScorer::new(table(&[]));
        let a = article("Ferris loves WASM", &[], None, None);
        let s = scorer.score(&a, &["wasm".to_string()]);
        assert!((s - 0.5 / 3.0).abs() < 1e-6, "got {s}");
    }

    #[test]
    fn popularity_thresholds_are_strict() {
        let scorer = RelevanceScorer::new(table(&[]));
        let at = |p: f32| scorer.score(&article("x", &[], None, Some(p)), &[]);
        assert!((at(100.0) - 0.1 / 3.0).abs() < 1e-6);
        assert!((at(101.0) - 0.2 / 3.0).abs() < 1e-6);
        assert!((at(21.0) - 0.05 / 3.0).abs() < 1e-6);
        assert!((at(20.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn score_is_clamped_to_one() {
        let pairs: Vec<(String, f32)> = (0..10).map(|i| (format!("kw{i}"), 1.0)).collect();
        let refs: Vec<(&str, f32)> = pairs.iter().map(|(k, w)| (k.as_str(), *w)).collect();
        let scorer = RelevanceScorer::new(table(&refs));
        let title = pairs
            .iter()
            .map(|(k, _)| k.clone())
            .collect::<Vec<_>>()
            .join(" ");
        let a = article(&title, &[], None, Some(500.0));
        assert_eq!(scorer.score(&a, &[]), 1.0);
    }

    #[test]
    fn half_raw_score_misses_high_threshold() {
        // A raw sum of 0.5 with no bonuses normalizes to ~0.167.
        let scorer = RelevanceScorer::new(table(&[("niche", 0.5)]));
        let a = article("a niche topic", &[], None, None);
        let s = scorer.score(&a, &[]);
        assert!((s - 0.5 / 3.0).abs() < 1e-6);
        assert!(s < 0.9);
    }

    #[test]
    fn apply_writes_scores_in_place() {
        let scorer = RelevanceScorer::new(table(&[("rust", 0.8)]));
        let mut batch = vec![article("Rust tips", &[], None, None), article("Go tips", &[], None, None)];
        scorer.apply(&mut batch, &[]);
        assert!(batch[0].relevance_score > 0.0);
        assert_eq!(batch[1].relevance_score, 0.0);
    }

    #[test]
    fn seed_loads_and_normalizes() {
        let seed = KeywordWeights::default_seed();
        assert!(seed.weights.contains_key("chatgpt"));
        assert!(seed.weights.values().all(|w| (0.0..=1.0).contains(w)));
    }
}
