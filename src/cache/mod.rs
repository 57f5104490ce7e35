pub mod mention_cache;

pub use mention_cache::MentionCache;
