use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use wordlist_core::config::IndexerSettings;
use wordlist_core::types::{Scope, ScriptureLocation, WordEntry, WordIndex};
use wordlist_core::Result;

use crate::snippet::snippet_at;
use crate::tokenize::Tokenizer;

static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\c\s[0-9]+\s").expect("valid chapter marker"));
static VERSE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\v\s[0-9]+\s").expect("valid verse marker"));

/// Sections after each marker, numbered from 1. Whatever precedes the first
/// marker (book headers, chapter headings) is not part of any section.
fn sections<'a>(marker: &'a Regex, text: &'a str) -> impl Iterator<Item = (u32, &'a str)> + 'a {
    marker.split(text).skip(1).zip(1u32..).map(|(section, number)| (number, section))
}

/// Builds word lists from the USFM text of one book.
pub struct WordIndexer {
    tokenizer: Tokenizer,
    snippet_radius: usize,
}

impl WordIndexer {
    pub fn new(settings: &IndexerSettings) -> Result<Self> {
        let tokenizer = Tokenizer::new(settings)?;
        Ok(Self { tokenizer, snippet_radius: settings.snippet_radius })
    }

    /// Scan `text` and collect every word in `scope` around `location`.
    ///
    /// Chapters and verses are numbered by their position in the text, not by
    /// the digits after the marker. `location.book` is copied into every
    /// recorded location; `chapter` / `verse` only select what is scanned.
    /// Each snippet highlights the word token that produced its location.
    pub fn build(&self, text: &str, location: &ScriptureLocation, scope: Scope) -> Result<WordIndex> {
        let started = Instant::now();
        let mut entries: Vec<WordEntry> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (chapter, chapter_text) in sections(&CHAPTER_MARKER, text) {
            if scope != Scope::Book && chapter != location.chapter {
                continue;
            }
            for (verse, verse_text) in sections(&VERSE_MARKER, chapter_text) {
                if scope == Scope::Verse && verse != location.verse {
                    continue;
                }
                let here = ScriptureLocation::new(location.book.clone(), chapter, verse);
                for token in self.tokenizer.words(verse_text) {
                    let key = token.text.to_lowercase();
                    let idx = match positions.get(&key) {
                        Some(&idx) => idx,
                        None => {
                            entries.push(WordEntry::new(key.clone()));
                            positions.insert(key, entries.len() - 1);
                            entries.len() - 1
                        }
                    };
                    let snippet = snippet_at(verse_text, token.start, token.end(), self.snippet_radius);
                    entries[idx].push(here.clone(), snippet);
                }
            }
        }

        let index = WordIndex::new(entries);
        tracing::debug!(
            book = %location.book,
            %scope,
            words = index.len(),
            occurrences = index.total_occurrences(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built word index"
        );
        Ok(index)
    }

    /// [`build`](Self::build), reusing `cache` when the inputs equal the previous call's.
    pub fn build_cached(
        &self,
        cache: &mut WordIndexCache,
        text: &str,
        location: &ScriptureLocation,
        scope: Scope,
    ) -> Result<Arc<WordIndex>> {
        if let Some(index) = cache.lookup(text, location, scope) {
            tracing::debug!(book = %location.book, %scope, "word index cache hit");
            return Ok(index);
        }
        let index = Arc::new(self.build(text, location, scope)?);
        cache.store(text, location, scope, Arc::clone(&index));
        Ok(index)
    }
}

struct CachedIndex {
    text: String,
    location: ScriptureLocation,
    scope: Scope,
    index: Arc<WordIndex>,
}

/// Remembers the most recent `(text, location, scope)` and its index.
///
/// Owned by whoever calls the indexer; a new triple simply replaces the old one.
#[derive(Default)]
pub struct WordIndexCache {
    slot: Option<CachedIndex>,
}

impl WordIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, text: &str, location: &ScriptureLocation, scope: Scope) -> Option<Arc<WordIndex>> {
        self.slot
            .as_ref()
            .filter(|c| c.scope == scope && c.location == *location && c.text == text)
            .map(|c| Arc::clone(&c.index))
    }

    pub fn store(&mut self, text: &str, location: &ScriptureLocation, scope: Scope, index: Arc<WordIndex>) {
        self.slot = Some(CachedIndex { text: text.to_string(), location: location.clone(), scope, index });
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
