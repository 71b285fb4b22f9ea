//! Context snippets around one occurrence of a word in a verse.

use regex::RegexBuilder;

use wordlist_core::config::DEFAULT_SNIPPET_RADIUS;
use wordlist_core::{Error, Result};

use crate::tokenize::is_word_char;

/// Snippet around the `occurrence`-th (1-based) whole-word, case-insensitive
/// match of `word`, using the default radius of 40 characters.
pub fn extract_snippet(verse_text: &str, word: &str, occurrence: usize) -> Result<String> {
    extract_snippet_with_radius(verse_text, word, occurrence, DEFAULT_SNIPPET_RADIUS)
}

/// Like [`extract_snippet`] with an explicit radius.
///
/// The window is widened outward to the nearest whitespace (or the text edge)
/// so it never cuts a word, and the matched occurrence is upper-cased. Returns
/// an empty string when there are fewer than `occurrence` matches.
pub fn extract_snippet_with_radius(verse_text: &str, word: &str, occurrence: usize, radius: usize) -> Result<String> {
    if verse_text.is_empty() {
        return Err(Error::EmptyVerseText);
    }
    let Some(skip) = occurrence.checked_sub(1) else {
        return Ok(String::new());
    };
    match find_whole_word(verse_text, word, skip)? {
        Some((start, end)) => Ok(snippet_at(verse_text, start, end, radius)),
        None => Ok(String::new()),
    }
}

/// Byte range of the `skip + 1`-th whole-word match.
fn find_whole_word(text: &str, word: &str, skip: usize) -> Result<Option<(usize, usize)>> {
    if word.is_empty() {
        return Ok(None);
    }
    let pattern = RegexBuilder::new(&regex::escape(word))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Operation(format!("snippet pattern for '{}': {}", word, e)))?;

    let mut pos = 0;
    let mut seen = 0;
    while let Some(m) = pattern.find_at(text, pos) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        let whole = !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);
        if whole {
            if seen == skip {
                return Ok(Some((m.start(), m.end())));
            }
            seen += 1;
            pos = m.end();
        } else {
            // retry one character further so overlapping candidates are not lost
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        if pos > text.len() {
            break;
        }
    }
    Ok(None)
}

/// Snippet around the byte range `start..end` of `text`, which must lie on
/// char boundaries. The range is upper-cased and the window extends `radius`
/// characters each side, then outward to whitespace or the text edge.
pub fn snippet_at(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start].char_indices().rev().take(radius).last().map_or(start, |(i, _)| i);
    let from = text[..from]
        .char_indices()
        .rev()
        .take_while(|(_, c)| !c.is_whitespace())
        .last()
        .map_or(from, |(i, _)| i);
    let to = text[end..].char_indices().take(radius).last().map_or(end, |(i, c)| end + i + c.len_utf8());
    let to = text[to..].find(char::is_whitespace).map_or(text.len(), |i| to + i);

    let mut snippet = String::with_capacity(to - from + 8);
    snippet.push_str(&text[from..start]);
    snippet.push_str(&text[start..end].to_uppercase());
    snippet.push_str(&text[end..to]);
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_occurrence_is_emphasised() {
        let s = extract_snippet("the cat sat on the mat", "the", 2).expect("snippet");
        assert_eq!(s, "the cat sat on THE mat");
    }

    #[test]
    fn empty_verse_is_an_error() {
        assert!(matches!(extract_snippet("", "word", 1), Err(Error::EmptyVerseText)));
    }

    #[test]
    fn missing_occurrence_is_empty() {
        assert_eq!(extract_snippet("one two", "two", 2).expect("snippet"), "");
        assert_eq!(extract_snippet("one two", "three", 1).expect("snippet"), "");
        assert_eq!(extract_snippet("one two", "two", 0).expect("snippet"), "");
    }

    #[test]
    fn match_is_case_insensitive_and_whole_word() {
        let s = extract_snippet("Thereafter The end", "the", 1).expect("snippet");
        assert_eq!(s, "Thereafter THE end");
    }

    #[test]
    fn partial_overlap_does_not_hide_later_match() {
        let s = extract_snippet("aaa aa", "aa", 1).expect("snippet");
        assert_eq!(s, "aaa AA");
    }

    #[test]
    fn regex_metacharacters_in_word_are_literal() {
        let s = extract_snippet("a.b axb", "a.b", 1).expect("snippet");
        assert_eq!(s, "A.B axb");
    }

    #[test]
    fn window_widens_to_whitespace() {
        let text = "abcdefghij klmnopqrst target uvwxyzabcd efghijklmn";
        let s = extract_snippet_with_radius(text, "target", 1, 3).expect("snippet");
        assert_eq!(s, "klmnopqrst TARGET uvwxyzabcd");
    }

    #[test]
    fn last_word_of_text_is_not_cut() {
        let text = "target abcdefghij";
        let s = extract_snippet_with_radius(text, "target", 1, 3).expect("snippet");
        assert_eq!(s, "TARGET abcdefghij");
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let s = extract_snippet_with_radius("ἐν ἀρχῇ ἦν ὁ λόγος", "ἦν", 1, 2).expect("snippet");
        assert_eq!(s, "ἀρχῇ ἮΝ ὁ");
    }

    #[test]
    fn snippet_at_highlights_the_given_range() {
        let text = r"He said \it do it\it* now";
        let start = text.find("it\\it*").expect("word");
        assert_eq!(snippet_at(text, start, start + 2, 40), r"He said \it do IT\it* now");
        assert_eq!(snippet_at("one two three", 4, 7, 0), "TWO");
    }
}
