// tests/providers_zenn.rs
use ai_news_curator::collect::providers::zenn::ZennAdapter;
use ai_news_curator::{ArticleSource, SourceAdapter};
use chrono::{TimeZone, Utc};
use std::fs;

fn fixture() -> String {
    fs::read_to_string("tests/fixtures/zenn_feed.xml").expect("missing tests/fixtures/zenn_feed.xml")
}

#[tokio::test]
async fn fixture_parses_and_skips_the_malformed_item() {
    let adapter = ZennAdapter::from_fixture_str(&fixture());
    let articles = adapter
        .collect(&["ai".to_string()], None)
        .await
        .expect("zenn parse ok");

    // Three items in the feed; the one without a title is skipped.
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|a| a.source == ArticleSource::Zenn));
    assert!(articles.iter().all(|a| a.relevance_score == 0.0));
    assert!(articles.iter().all(|a| a.tags == vec!["ai".to_string()]));

    let first = &articles[0];
    assert_eq!(first.id, "zenn:https://zenn.dev/alice/articles/rust-rag");
    assert_eq!(first.author, "alice");
    // RFC 2822 pubDate lands in UTC: 09:30 +09:00 is 00:30 UTC.
    assert_eq!(
        first.published_at,
        Utc.with_ymd_and_hms(2025, 1, 20, 0, 30, 0).unwrap()
    );
    // Description markup and entities are scrubbed.
    let excerpt = first.excerpt.as_deref().unwrap();
    assert!(!excerpt.contains('<'));
    assert!(excerpt.contains("RAG"));
}

#[tokio::test]
async fn since_watermark_filters_older_items() {
    let adapter = ZennAdapter::from_fixture_str(&fixture());
    let since = Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap();
    let articles = adapter
        .collect(&["ai".to_string()], Some(since))
        .await
        .unwrap();
    assert_eq!(articles.len(), 1);
    assert!(articles[0].title.contains("ChatGPT API"));
}

#[tokio::test]
async fn feed_with_only_malformed_items_is_an_adapter_failure() {
    let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><pubDate>Mon, 20 Jan 2025 09:30:00 +0900</pubDate></item>
</channel></rss>"#;
    let adapter = ZennAdapter::from_fixture_str(xml);
    assert!(adapter.collect(&["ai".to_string()], None).await.is_err());
}

#[tokio::test]
async fn empty_feed_is_not_an_error() {
    let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
    let adapter = ZennAdapter::from_fixture_str(xml);
    let articles = adapter.collect(&["ai".to_string()], None).await.unwrap();
    assert!(articles.is_empty());
}
