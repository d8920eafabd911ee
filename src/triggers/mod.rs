/// Keyword rule matching for log messages
pub mod keyword_matcher;

pub use keyword_matcher::KeywordMatcher;
