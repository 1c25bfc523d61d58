// src/collect/mod.rs
//! Collection orchestration: parallel fan-out over source adapters with
//! per-call timeout + conditional retry, all-settled aggregation, then
//! dedup → score → filter over the merged batch.

pub mod dedup;
pub mod filter;
pub mod providers;
pub mod retry;
pub mod score;
pub mod types;

use crate::collect::dedup::Deduplicator;
use crate::collect::retry::RetryConfig;
use crate::collect::score::RelevanceScorer;
use crate::collect::types::{
    CollectionError, CollectionResult, FatalError, FilterCriteria, SourceAdapter,
};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// One-time metrics registration (so series show up wherever a recorder is
/// installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_articles_collected_total",
            "Articles merged from successful source adapters."
        );
        describe_counter!(
            "curator_dedup_dropped_total",
            "Articles dropped as URL or title duplicates."
        );
        describe_counter!(
            "curator_source_errors_total",
            "Source adapters that failed after retries."
        );
        describe_counter!(
            "curator_articles_selected_total",
            "Articles surviving filtering and ranking."
        );
        describe_gauge!(
            "curator_last_run_ts",
            "Unix ts when a collection run last completed."
        );
    });
}

fn validate_criteria(criteria: &FilterCriteria) -> Result<(), FatalError> {
    if !criteria.min_relevance_score.is_finite()
        || !(0.0..=1.0).contains(&criteria.min_relevance_score)
    {
        return Err(FatalError::InvalidCriteria(format!(
            "min_relevance_score must lie in [0, 1], got {}",
            criteria.min_relevance_score
        )));
    }
    if criteria.max_articles_per_day == 0 {
        return Err(FatalError::InvalidCriteria(
            "max_articles_per_day must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Runs the whole pipeline: Collecting → Merging → Deduplicating →
/// Scoring → Filtering. Always reaches a terminal result on non-fatal
/// paths; a single slow adapter delays completion but never blocks the
/// already-settled ones from being merged.
#[derive(Debug, Clone)]
pub struct CollectionOrchestrator {
    retry: RetryConfig,
    call_timeout: Duration,
    scorer: RelevanceScorer,
}

impl CollectionOrchestrator {
    pub fn new(retry: RetryConfig, call_timeout: Duration, scorer: RelevanceScorer) -> Self {
        Self {
            retry,
            call_timeout,
            scorer,
        }
    }

    /// One collection pass with a fresh deduplicator.
    pub async fn run(
        &self,
        criteria: &FilterCriteria,
        adapters: &[Arc<dyn SourceAdapter>],
        since: Option<DateTime<Utc>>,
    ) -> Result<CollectionResult, FatalError> {
        let mut deduplicator = Deduplicator::new();
        self.run_with_deduplicator(criteria, adapters, since, &mut deduplicator)
            .await
    }

    /// One collection pass against a caller-owned deduplicator, so dedup
    /// identity can persist across invocations. The seen-sets are touched
    /// only after all concurrent collection has settled.
    pub async fn run_with_deduplicator(
        &self,
        criteria: &FilterCriteria,
        adapters: &[Arc<dyn SourceAdapter>],
        since: Option<DateTime<Utc>>,
        deduplicator: &mut Deduplicator,
    ) -> Result<CollectionResult, FatalError> {
        ensure_metrics_described();
        validate_criteria(criteria)?;
        if adapters.is_empty() {
            return Err(FatalError::NoSourcesEnabled);
        }

        // Collecting: one task per adapter; each call wrapped in the
        // conditional retry executor with a per-call deadline. A task's
        // exhaustion settles as an error and never aborts the others.
        tracing::debug!(sources = adapters.len(), "collecting");
        let mut tasks: JoinSet<(&'static str, Result<Vec<_>, retry::RetryExhausted>)> =
            JoinSet::new();
        for adapter in adapters {
            let adapter = Arc::clone(adapter);
            let terms: Vec<String> = criteria.keywords.clone();
            let retry_cfg = self.retry;
            let limit = self.call_timeout;
            tasks.spawn(async move {
                let outcome = retry::with_retry_if(
                    &retry_cfg,
                    || retry::with_timeout(limit, adapter.collect(&terms, since)),
                    retry::is_retryable,
                )
                .await;
                (adapter.name(), outcome)
            });
        }

        // Merging: gather every outcome regardless of individual failures.
        // Order across sources reflects completion order.
        let mut merged = Vec::new();
        let mut errors: Vec<CollectionError> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(mut items))) => {
                    tracing::info!(source = name, count = items.len(), "source collected");
                    merged.append(&mut items);
                }
                Ok((name, Err(err))) => {
                    tracing::warn!(source = name, error = %err, "source failed after retries");
                    counter!("curator_source_errors_total").increment(1);
                    errors.push(CollectionError::new(name, err.to_string()));
                }
                Err(join_err) => {
                    tracing::warn!(error = %join_err, "collection task aborted");
                    counter!("curator_source_errors_total").increment(1);
                    errors.push(CollectionError::new("collector", join_err.to_string()));
                }
            }
        }
        counter!("curator_articles_collected_total").increment(merged.len() as u64);

        // Deduplicating
        let (mut kept, url_dups, title_dups) = deduplicator.admit_all(merged);
        counter!("curator_dedup_dropped_total").increment((url_dups + title_dups) as u64);
        tracing::info!(kept = kept.len(), url_dups, title_dups, "dedup complete");

        // Scoring
        self.scorer.apply(&mut kept, &criteria.keywords);

        // Filtering
        let selected = filter::apply(kept, criteria);
        counter!("curator_articles_selected_total").increment(selected.len() as u64);

        let completed_at = Utc::now();
        gauge!("curator_last_run_ts").set(completed_at.timestamp() as f64);
        tracing::info!(
            selected = selected.len(),
            errors = errors.len(),
            "collection run complete"
        );
        Ok(CollectionResult {
            articles: selected,
            errors,
            completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            keywords: vec![],
            exclude_keywords: vec![],
            min_relevance_score: 0.0,
            max_articles_per_day: 10,
        }
    }

    #[tokio::test]
    async fn zero_adapters_is_fatal() {
        let orchestrator = CollectionOrchestrator::new(
            RetryConfig::default(),
            Duration::from_secs(1),
            RelevanceScorer::with_default_seed(),
        );
        let err = orchestrator.run(&criteria(), &[], None).await.unwrap_err();
        assert!(matches!(err, FatalError::NoSourcesEnabled));
    }

    #[tokio::test]
    async fn malformed_criteria_is_fatal() {
        let orchestrator = CollectionOrchestrator::new(
            RetryConfig::default(),
            Duration::from_secs(1),
            RelevanceScorer::with_default_seed(),
        );
        let mut bad = criteria();
        bad.min_relevance_score = 1.5;
        let err = orchestrator.run(&bad, &[], None).await.unwrap_err();
        assert!(matches!(err, FatalError::InvalidCriteria(_)));

        let mut bad = criteria();
        bad.max_articles_per_day = 0;
        let err = orchestrator.run(&bad, &[], None).await.unwrap_err();
        assert!(matches!(err, FatalError::InvalidCriteria(_)));
    }
}
