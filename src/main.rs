//! Curator binary entrypoint: load config, run one collection pass, send
//! the digest, log a summary.

use ai_news_curator::collect::providers::{
    hacker_news::HackerNewsAdapter, qiita::QiitaAdapter, zenn::ZennAdapter,
};
use ai_news_curator::notify::{discord::DiscordNotifier, slack::SlackNotifier, Digest};
use ai_news_curator::{
    CollectionOrchestrator, CuratorConfig, KeywordWeights, NotifierMux, RelevanceScorer,
    SourceAdapter,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_adapters(config: &CuratorConfig) -> Vec<Arc<dyn SourceAdapter>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    let sources = &config.sources;
    if sources.qiita.enabled {
        adapters.push(Arc::new(
            QiitaAdapter::new().with_tags(sources.qiita.search_terms.clone()),
        ));
    }
    if sources.zenn.enabled {
        adapters.push(Arc::new(
            ZennAdapter::new().with_topics(sources.zenn.search_terms.clone()),
        ));
    }
    if sources.hackernews.enabled {
        adapters.push(Arc::new(
            HackerNewsAdapter::new().with_queries(sources.hackernews.search_terms.clone()),
        ));
    }
    adapters
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = CuratorConfig::load()?;
    let scorer = match &config.keywords.weights_file {
        Some(path) => RelevanceScorer::new(KeywordWeights::load_from_file(path)),
        None => RelevanceScorer::with_default_seed(),
    };
    let orchestrator =
        CollectionOrchestrator::new(config.retry_config(), config.call_timeout(), scorer);
    let adapters = build_adapters(&config);

    let result = orchestrator
        .run(&config.criteria(), &adapters, config.since())
        .await?;
    for error in &result.errors {
        tracing::warn!(source = %error.source, message = %error.message, "source error");
    }

    let mut notifiers = NotifierMux::new();
    notifiers.push(Box::new(SlackNotifier::from_env()));
    notifiers.push(Box::new(DiscordNotifier::from_env()));
    let report = notifiers.send_all(&Digest::from_result(&result)).await;

    tracing::info!(
        articles = result.articles.len(),
        source_errors = result.errors.len(),
        delivered = report.delivered,
        delivery_failures = report.failed.len(),
        "curation run finished"
    );
    Ok(())
}
