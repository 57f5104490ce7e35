pub mod cache;
pub mod config;
pub mod error;
pub mod ner;
pub mod relation;
pub mod report;
pub mod source;

pub use config::Config;
pub use error::{PanlinkError, Result};
pub use ner::{build_recognizer, Recognizer};
pub use relation::{ExtractionSettings, RelationExtractor, RelationRecord};
