use anyhow::{Context, Result};
use reqwest::Client;

use super::{format_lines, Digest, Notifier};

pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: Client,
}

impl SlackNotifier {
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
            client: Client::new(),
        }
    }

    /// Optional builder for tests/tools
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: Some(url),
            client: Client::new(),
        }
    }
}

/// Block Kit payload: a header plus one section per article, with the
/// plain-text digest as notification fallback.
fn build_payload(digest: &Digest) -> serde_json::Value {
    let mut blocks = vec![serde_json::json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": format!("Curated articles — {}", digest.generated_at.format("%Y-%m-%d")),
        }
    })];
    for article in &digest.articles {
        blocks.push(serde_json::json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "<{}|{}>\n_{}_ · score {:.2} · by {}",
                    article.url, article.title, article.source, article.relevance_score, article.author
                ),
            }
        }));
    }
    serde_json::json!({ "text": format_lines(digest), "blocks": blocks })
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, digest: &Digest) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("Slack disabled (no SLACK_WEBHOOK_URL)");
            return Ok(());
        };

        let body = build_payload(digest);
        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
