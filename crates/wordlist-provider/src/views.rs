//! Shapes a word list for display: filtering, the count table, the word cloud
//! and the per-word occurrence list.

use serde::Serialize;

use wordlist_core::canon::format_reference;
use wordlist_core::types::{WordEntry, WordIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordTableRow {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Word,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudWord {
    pub text: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceRow {
    pub reference: String,
    pub text: String,
}

/// Entries whose word contains `filter`, ignoring case. An empty filter keeps everything.
pub fn filter_entries<'a>(index: &'a WordIndex, filter: &str) -> Vec<&'a WordEntry> {
    if filter.is_empty() {
        return index.iter().collect();
    }
    let needle = filter.to_lowercase();
    index.iter().filter(|e| e.word.to_lowercase().contains(&needle)).collect()
}

pub fn word_table(entries: &[&WordEntry]) -> Vec<WordTableRow> {
    entries.iter().map(|e| WordTableRow { word: e.word.clone(), count: e.count() }).collect()
}

/// Stable sort; equal keys keep first-occurrence order.
pub fn sort_table(rows: &mut [WordTableRow], key: SortKey, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = match key {
            SortKey::Word => a.word.cmp(&b.word),
            SortKey::Count => a.count.cmp(&b.count),
        };
        if descending { ord.reverse() } else { ord }
    });
}

/// `"Words (12)"` when nothing is filtered out, otherwise `"Words (3 of 12)"`.
pub fn word_count_title(shown: usize, full: usize) -> String {
    if shown == full {
        format!("Words ({})", full)
    } else {
        format!("Words ({} of {})", shown, full)
    }
}

/// The `limit` most frequent words, most frequent first.
pub fn word_cloud(entries: &[&WordEntry], limit: usize) -> Vec<CloudWord> {
    let mut sorted: Vec<&WordEntry> = entries.to_vec();
    sorted.sort_by(|a, b| b.count().cmp(&a.count()));
    sorted.into_iter().take(limit).map(|e| CloudWord { text: e.word.clone(), value: e.count() }).collect()
}

/// One row per occurrence: `"Genesis 1:3"` and its snippet.
pub fn occurrence_rows(entry: &WordEntry) -> Vec<OccurrenceRow> {
    entry
        .occurrences()
        .map(|(location, snippet)| OccurrenceRow { reference: format_reference(location), text: snippet.to_string() })
        .collect()
}
