//! Feed ingestion: permissive RSS parsing and HTTP fetching.
//!
//! - [`text`] - CDATA normalization and tag extraction over raw markup
//! - [`parser`] - The line-scanning state machine producing [`ParsedFeed`]
//! - [`fetcher`] - Bounded, timeout-guarded HTTP retrieval
//!
//! The parser is total by design: malformed input degrades to partial or
//! empty results and never raises an error. Strictness, where it matters,
//! lives in the storage layer (items without a link are not persisted).

mod fetcher;
mod parser;
pub mod text;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, Channel, Item, ParsedFeed};
