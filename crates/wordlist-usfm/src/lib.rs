//! wordlist-usfm
//!
//! Word lists over USFM book text: a marker-aware tokenizer, the snippet
//! extractor, and the indexer with its single-slot cache.
pub mod index;
pub mod snippet;
pub mod tokenize;

pub use index::{WordIndexCache, WordIndexer};
pub use snippet::{extract_snippet, extract_snippet_with_radius, snippet_at};
pub use tokenize::{Token, TokenKind, Tokenizer};
