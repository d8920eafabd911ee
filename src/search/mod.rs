/// Error query construction
pub mod query;

/// Search backend client
pub mod client;

pub use client::{ElasticsearchBackend, SearchBackend, SearchClient};
pub use query::{Exclusion, QueryBuilder, SearchQuery, DEFAULT_LOOKBACK};
