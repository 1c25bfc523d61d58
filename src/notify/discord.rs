use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Digest, Notifier};

// Discord rejects payloads with more than 10 embeds.
const MAX_EMBEDS: usize = 10;

pub struct DiscordNotifier {
    webhook_url: Option<String>,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("DISCORD_WEBHOOK_URL").ok(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url: Some(webhook_url),
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    url: String,
    description: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: String,
    embeds: Vec<DiscordEmbed>,
}

fn build_payload(digest: &Digest) -> DiscordWebhookPayload {
    let content = if digest.articles.is_empty() {
        "No articles passed curation today.".to_string()
    } else {
        format!(
            "**{} curated article(s)** — {}",
            digest.articles.len(),
            digest.generated_at.format("%Y-%m-%d")
        )
    };
    let embeds = digest
        .articles
        .iter()
        .take(MAX_EMBEDS)
        .map(|article| DiscordEmbed {
            title: article.title.clone(),
            url: article.url.clone(),
            description: format!(
                "{} · score {:.2} · by {}",
                article.source, article.relevance_score, article.author
            ),
        })
        .collect();
    DiscordWebhookPayload { content, embeds }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, digest: &Digest) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("Discord disabled (no DISCORD_WEBHOOK_URL)");
            return Ok(());
        };

        let payload = build_payload(digest);
        self.client
            .post(url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .context("discord post")?
            .error_for_status()
            .context("discord non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::types::{Article, ArticleSource};
    use chrono::Utc;

    fn article(i: usize) -> Article {
        Article {
            id: format!("hn:{i}"),
            title: format!("Story {i}"),
            url: format!("https://example.test/{i}"),
            author: "carol".into(),
            published_at: Utc::now(),
            source: ArticleSource::HackerNews,
            tags: vec![],
            excerpt: None,
            popularity: Some(120.0),
            relevance_score: 0.9,
        }
    }

    #[test]
    fn embeds_are_capped_at_discord_limit() {
        let digest = Digest {
            articles: (0..15).map(article).collect(),
            source_errors: 0,
            generated_at: Utc::now(),
        };
        let payload = build_payload(&digest);
        assert_eq!(payload.embeds.len(), MAX_EMBEDS);
        assert!(payload.content.contains("15 curated article(s)"));
    }
}
