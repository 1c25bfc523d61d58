// src/config.rs
//! Typed application configuration, deserialized from TOML and validated
//! once at load. Unset optional fields stay explicit `Option`s; there is
//! no dynamic merging.

use crate::collect::retry::RetryConfig;
use crate::collect::types::FilterCriteria;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/curator.toml";
pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct CuratorConfig {
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub collect: CollectSection,
    #[serde(default)]
    pub keywords: KeywordsSection,
    #[serde(default)]
    pub sources: SourcesSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_min_relevance")]
    pub min_relevance_score: f32,
    #[serde(default = "default_max_articles")]
    pub max_articles_per_day: usize,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

fn default_min_relevance() -> f32 {
    0.3
}

fn default_max_articles() -> usize {
    10
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            min_relevance_score: default_min_relevance(),
            max_articles_per_day: default_max_articles(),
            exclude_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Collection watermark: only articles newer than now minus this many
    /// hours are requested. `None` disables the watermark.
    #[serde(default = "default_window_hours")]
    pub window_hours: Option<i64>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_window_hours() -> Option<i64> {
    Some(24)
}

impl Default for CollectSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            window_hours: default_window_hours(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordsSection {
    /// Custom relevance keywords, matched at weight 0.5.
    #[serde(default)]
    pub custom: Vec<String>,
    /// Optional JSON/TOML file overriding the built-in keyword weight
    /// table.
    #[serde(default)]
    pub weights_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesSection {
    #[serde(default)]
    pub qiita: SourceSection,
    #[serde(default)]
    pub zenn: SourceSection,
    #[serde(default)]
    pub hackernews: SourceSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSection {
    #[serde(default)]
    pub enabled: bool,
    /// Source-specific search terms (Qiita tags, Zenn topics, HN queries).
    #[serde(default)]
    pub search_terms: Vec<String>,
}

impl SourcesSection {
    pub fn any_enabled(&self) -> bool {
        self.qiita.enabled || self.zenn.enabled || self.hackernews.enabled
    }
}

impl CuratorConfig {
    /// Load from `$CURATOR_CONFIG_PATH`, falling back to
    /// `config/curator.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate in one step; an invalid config never escapes.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).context("parsing curator config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let min = self.filter.min_relevance_score;
        if !min.is_finite() || !(0.0..=1.0).contains(&min) {
            bail!("filter.min_relevance_score must lie in [0, 1], got {min}");
        }
        if self.filter.max_articles_per_day == 0 {
            bail!("filter.max_articles_per_day must be at least 1");
        }
        if self.retry.backoff_multiplier < 1.0 || !self.retry.backoff_multiplier.is_finite() {
            bail!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                self.retry.backoff_multiplier
            );
        }
        if self.collect.timeout_ms == 0 {
            bail!("collect.timeout_ms must be positive");
        }
        if let Some(hours) = self.collect.window_hours {
            if hours <= 0 {
                bail!("collect.window_hours must be positive when set");
            }
        }
        if !self.sources.any_enabled() {
            bail!("at least one source must be enabled");
        }
        Ok(())
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            keywords: self.keywords.custom.clone(),
            exclude_keywords: self.filter.exclude_keywords.clone(),
            min_relevance_score: self.filter.min_relevance_score,
            max_articles_per_day: self.filter.max_articles_per_day,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.collect.timeout_ms)
    }

    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.collect
            .window_hours
            .map(|hours| Utc::now() - ChronoDuration::hours(hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
[filter]
min_relevance_score = 0.4
max_articles_per_day = 5
exclude_keywords = ["crypto", "spam"]

[retry]
max_retries = 2
base_delay_ms = 500
backoff_multiplier = 1.5

[collect]
timeout_ms = 8000
window_hours = 48

[keywords]
custom = ["rust", "wasm"]

[sources.qiita]
enabled = true
search_terms = ["ChatGPT"]

[sources.hackernews]
enabled = true
"#;

    #[test]
    fn full_config_parses_and_converts() {
        let config = CuratorConfig::from_toml_str(FULL_TOML).unwrap();
        assert_eq!(config.filter.max_articles_per_day, 5);
        assert!(config.sources.qiita.enabled);
        assert!(!config.sources.zenn.enabled);

        let criteria = config.criteria();
        assert_eq!(criteria.keywords, vec!["rust", "wasm"]);
        assert_eq!(criteria.exclude_keywords.len(), 2);

        let retry = config.retry_config();
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.call_timeout(), Duration::from_millis(8_000));
        assert!(config.since().is_some());
    }

    #[test]
    fn defaults_fill_unset_sections() {
        let config =
            CuratorConfig::from_toml_str("[sources.zenn]\nenabled = true\n").unwrap();
        assert_eq!(config.filter.min_relevance_score, 0.3);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.collect.window_hours, Some(24));
        assert!(config.keywords.weights_file.is_none());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let toml = "[filter]\nmin_relevance_score = 1.5\n[sources.zenn]\nenabled = true\n";
        assert!(CuratorConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn zero_cap_is_rejected() {
        let toml = "[filter]\nmax_articles_per_day = 0\n[sources.zenn]\nenabled = true\n";
        assert!(CuratorConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn all_sources_disabled_is_rejected() {
        assert!(CuratorConfig::from_toml_str("").is_err());
    }
}
