// tests/dedup_normalize.rs
use ai_news_curator::collect::dedup::{
    normalize_title, normalize_url, title_similarity, Admission, DropReason,
};
use ai_news_curator::{Article, ArticleSource, Deduplicator, NearDuplicateAuditor};
use chrono::Utc;

fn article(id: &str, title: &str, url: &str) -> Article {
    Article {
        id: id.into(),
        title: title.into(),
        url: url.into(),
        author: "a".into(),
        published_at: Utc::now(),
        source: ArticleSource::Zenn,
        tags: vec![],
        excerpt: None,
        popularity: None,
        relevance_score: 0.0,
    }
}

#[test]
fn url_normalization_matches_contract() {
    assert_eq!(
        normalize_url("https://a.com/x/?utm_source=y&ref=z"),
        "https://a.com/x"
    );
    assert_eq!(
        normalize_url("https://a.com/x?utm_campaign=c&source=rss&id=7"),
        "https://a.com/x?id=7"
    );
    assert_eq!(normalize_url("https://a.com"), "https://a.com/");
}

#[test]
fn japanese_title_with_date_and_version_normalizes_to_placeholders() {
    let normalized = normalize_title("2024年1月15日 v1.2.3 リリース");
    assert!(normalized.contains("YYYY-MM-DD"), "got {normalized:?}");
    assert!(normalized.contains("vX.X.X"), "got {normalized:?}");
}

#[test]
fn equivalent_titles_collide_after_normalization() {
    let variants = [
        "ＣｈａｔＧＰＴ Tips 2024-01-15",
        "chatgpt  tips 2024/1/15",
        "ChatGPT Tips 2023年12月31日",
    ];
    let normalized: Vec<String> = variants.iter().map(|t| normalize_title(t)).collect();
    assert!(normalized.windows(2).all(|w| w[0] == w[1]), "{normalized:?}");
}

#[test]
fn feeding_a_pair_that_normalizes_identically_keeps_the_first() {
    let mut dedup = Deduplicator::new();
    let first = article("1", "LLM evals v2.0", "https://a.com/p?utm_source=x");
    let shadow = article("2", "llm evals v9.1", "https://a.com/p");
    let (kept, url_dups, title_dups) = dedup.admit_all(vec![first, shadow]);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, "1");
    assert_eq!(url_dups + title_dups, 1);
}

#[test]
fn url_duplicate_is_checked_before_title_duplicate() {
    let mut dedup = Deduplicator::new();
    assert_eq!(
        dedup.admit(&article("1", "Title A", "https://a.com/p")),
        Admission::Keep
    );
    // Same URL and a seen title: reported as the URL duplicate.
    assert_eq!(
        dedup.admit(&article("2", "Title A", "https://a.com/p/")),
        Admission::Drop(DropReason::UrlDuplicate)
    );
    // Fresh URL, seen title.
    assert_eq!(
        dedup.admit(&article("3", "Title A", "https://b.com/q")),
        Admission::Drop(DropReason::TitleDuplicate)
    );
}

#[test]
fn state_persists_across_calls_until_cleared() {
    let mut dedup = Deduplicator::new();
    let a = article("1", "One weird Rust trick", "https://a.com/1");
    let (kept, _, _) = dedup.admit_all(vec![a.clone()]);
    assert_eq!(kept.len(), 1);
    // A later batch against the same instance still remembers it.
    let (kept, url_dups, _) = dedup.admit_all(vec![a.clone()]);
    assert!(kept.is_empty());
    assert_eq!(url_dups, 1);

    dedup.clear();
    let (kept, _, _) = dedup.admit_all(vec![a]);
    assert_eq!(kept.len(), 1);
}

#[test]
fn near_duplicate_utility_is_not_applied_by_admit() {
    // Similar but not identical after normalization: admit keeps both; the
    // auditor flags the pair.
    let a = article("1", "Understanding LLM quantization", "https://a.com/1");
    let b = article("2", "Understanding LLM quantizations", "https://b.com/2");

    let mut dedup = Deduplicator::new();
    let (kept, _, _) = dedup.admit_all(vec![a.clone(), b.clone()]);
    assert_eq!(kept.len(), 2);

    let auditor = NearDuplicateAuditor::default();
    let pairs = auditor.audit(&kept);
    assert_eq!(pairs.len(), 1);
    let (i, j, sim) = pairs[0];
    assert_eq!((i, j), (0, 1));
    assert!(sim >= 0.8);
    assert!(title_similarity(&a.title, &b.title) >= 0.8);
}
