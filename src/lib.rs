// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod collect;
pub mod config;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::collect::dedup::{Deduplicator, NearDuplicateAuditor};
pub use crate::collect::retry::{RetryConfig, RetryExhausted, TimeoutError};
pub use crate::collect::score::{KeywordWeights, RelevanceScorer};
pub use crate::collect::types::{
    Article, ArticleSource, CollectionError, CollectionResult, FatalError, FilterCriteria,
    SourceAdapter,
};
pub use crate::collect::CollectionOrchestrator;
pub use crate::config::CuratorConfig;
pub use crate::notify::{Digest, Notifier, NotifierMux};
