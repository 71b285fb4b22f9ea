//! Domain types shared by the indexer, the provider and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A single verse position inside one book.
///
/// Equality is structural, so two occurrences in the same verse compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptureLocation {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl ScriptureLocation {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self { book: book.into(), chapter, verse }
    }
}

impl fmt::Display for ScriptureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

/// How much of a book is scanned when building a word list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Book,
    Chapter,
    Verse,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::Book => "Book",
            Scope::Chapter => "Chapter",
            Scope::Verse => "Verse",
        };
        f.write_str(s)
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "book" => Ok(Scope::Book),
            "chapter" => Ok(Scope::Chapter),
            "verse" => Ok(Scope::Verse),
            other => Err(Error::InvalidConfig(format!("unknown scope '{}'", other))),
        }
    }
}

/// One distinct (lowercased) word and every place it occurs.
///
/// `locations` and `snippets` are parallel: the snippet at index `i` shows
/// the occurrence recorded at `locations[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub locations: Vec<ScriptureLocation>,
    pub snippets: Vec<String>,
}

impl WordEntry {
    pub fn new(word: String) -> Self {
        Self { word, locations: Vec::new(), snippets: Vec::new() }
    }

    pub fn push(&mut self, location: ScriptureLocation, snippet: String) {
        self.locations.push(location);
        self.snippets.push(snippet);
    }

    /// Number of recorded occurrences.
    pub fn count(&self) -> usize {
        self.locations.len()
    }

    pub fn occurrences(&self) -> impl Iterator<Item = (&ScriptureLocation, &str)> {
        self.locations.iter().zip(self.snippets.iter().map(String::as_str))
    }
}

/// Word entries in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordIndex {
    entries: Vec<WordEntry>,
}

impl WordIndex {
    pub fn new(entries: Vec<WordEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup of a single word.
    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        let key = word.to_lowercase();
        self.entries.iter().find(|e| e.word == key)
    }

    /// Total number of word occurrences across all entries.
    pub fn total_occurrences(&self) -> usize {
        self.entries.iter().map(WordEntry::count).sum()
    }
}

impl<'a> IntoIterator for &'a WordIndex {
    type Item = &'a WordEntry;
    type IntoIter = std::slice::Iter<'a, WordEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The query key a caller uses to ask for a word list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListSelector {
    pub project_id: String,
    pub scope: Scope,
    pub location: ScriptureLocation,
}

impl WordListSelector {
    pub fn new(project_id: impl Into<String>, scope: Scope, location: ScriptureLocation) -> Self {
        Self { project_id: project_id.into(), scope, location }
    }

    /// Whether moving to `(project_id, scope, location)` requires a new word list.
    ///
    /// Only the part of the location that the scope looks at matters: a book
    /// list ignores chapter and verse moves, a chapter list ignores verse moves.
    pub fn needs_refresh(&self, project_id: &str, scope: Scope, location: &ScriptureLocation) -> bool {
        if self.project_id != project_id || self.scope != scope {
            return true;
        }
        let old = &self.location;
        match scope {
            Scope::Book => old.book != location.book,
            Scope::Chapter => old.book != location.book || old.chapter != location.chapter,
            Scope::Verse => old != location,
        }
    }
}
