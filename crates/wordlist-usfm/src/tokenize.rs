//! Marker-aware word tokenizer for USFM verse text.
//!
//! A word is a run of letters, numbers, unassigned or private-use characters,
//! optionally joined by punctuation / spacing combining marks that sit between
//! two word characters ("don't", "co-worker"). Leading and trailing punctuation
//! never attaches to a word.
//!
//! Every marker (`\p`, `\+wj*`, `\v`, milestones such as `\qt-s`) is
//! skipped. Spans named in the drop list (footnotes, cross references, ...)
//! are skipped together with their content; any other span only loses its
//! markers, so `\wj Jesus said\wj*` still yields "Jesus" and "said".

use once_cell::sync::Lazy;
use regex::{Match, Regex};

use wordlist_core::config::{IndexerSettings, UnclosedSpanPolicy};
use wordlist_core::{Error, Result};

const WORD_CHAR: &str = r"[\p{L}\p{N}\p{Cn}\p{Co}]";
const WORD_MEDIAL: &str = r"[\p{P}\p{Mc}--\\]";
const MARKER: &str = r"\\\+*[a-z]+[0-9]*(?:-[se])?\*?";
const ATTRIBUTES: &str = r"\|[^\\]*";

static WORD_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", WORD_CHAR)).expect("valid word character class"));

/// Whether `c` can be part of a word.
pub fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    WORD_CHAR_RE.is_match(c.encode_utf8(&mut buf))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    /// A lone marker, opening or closing.
    Marker,
    /// A drop-content span including its markers.
    DroppedSpan,
    /// `|key="value"` attribute text of a character span.
    Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset into the scanned text.
    pub start: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

pub struct Tokenizer {
    pattern: Regex,
    unclosed: UnclosedSpanPolicy,
}

impl Tokenizer {
    pub fn new(settings: &IndexerSettings) -> Result<Self> {
        settings.validate()?;
        let mut names: Vec<&str> = settings.drop_spans.iter().map(String::as_str).collect();
        // longest first so `fe` wins over `f`
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names.dedup();

        let mut alternatives = Vec::new();
        if !names.is_empty() {
            let escaped: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
            alternatives.push(format!(r"(?P<open>\\(?P<name>\+*(?:{}))\b)", escaped.join("|")));
        }
        alternatives.push(format!("(?P<marker>{})", MARKER));
        if settings.skip_attributes {
            alternatives.push(format!("(?P<attr>{})", ATTRIBUTES));
        }
        alternatives.push(format!("(?P<word>{c}+(?:{m}+{c}+)*)", c = WORD_CHAR, m = WORD_MEDIAL));

        let pattern = Regex::new(&alternatives.join("|"))
            .map_err(|e| Error::InvalidConfig(format!("tokenizer pattern: {}", e)))?;
        Ok(Self { pattern, unclosed: settings.unclosed_spans })
    }

    pub fn tokens<'t>(&'t self, text: &'t str) -> Tokens<'t> {
        Tokens { tokenizer: self, text, pos: 0 }
    }

    pub fn words<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Token<'t>> + 't {
        self.tokens(text).filter(|t| t.kind == TokenKind::Word)
    }
}

pub struct Tokens<'t> {
    tokenizer: &'t Tokenizer,
    text: &'t str,
    pos: usize,
}

impl<'t> Tokens<'t> {
    fn token(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'t> {
        let text = self.text;
        self.pos = end;
        Token { kind, text: &text[start..end], start }
    }

    fn drop_span(&mut self, open: Match<'t>, name: &str) -> Token<'t> {
        let rest = &self.text[open.end()..];
        // a stray closer such as `\f*` is just a marker
        if rest.starts_with('*') {
            return self.token(TokenKind::Marker, open.start(), open.end() + 1);
        }
        let closer = format!("\\{}*", name);
        if let Some(offset) = rest.find(&closer) {
            return self.token(TokenKind::DroppedSpan, open.start(), open.end() + offset + closer.len());
        }
        tracing::warn!(marker = name, offset = open.start(), policy = ?self.tokenizer.unclosed, "unclosed span");
        match self.tokenizer.unclosed {
            UnclosedSpanPolicy::KeepContent => self.token(TokenKind::Marker, open.start(), open.end()),
            UnclosedSpanPolicy::DropToEnd => self.token(TokenKind::DroppedSpan, open.start(), self.text.len()),
        }
    }
}

impl<'t> Iterator for Tokens<'t> {
    type Item = Token<'t>;

    fn next(&mut self) -> Option<Token<'t>> {
        if self.pos >= self.text.len() {
            return None;
        }
        let caps = self.tokenizer.pattern.captures_at(self.text, self.pos)?;
        if let (Some(open), Some(name)) = (caps.name("open"), caps.name("name")) {
            return Some(self.drop_span(open, name.as_str()));
        }
        let (kind, m) = if let Some(m) = caps.name("marker") {
            (TokenKind::Marker, m)
        } else if let Some(m) = caps.name("attr") {
            (TokenKind::Attributes, m)
        } else {
            (TokenKind::Word, caps.name("word")?)
        };
        Some(self.token(kind, m.start(), m.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        let tokenizer = Tokenizer::new(&IndexerSettings::default()).expect("tokenizer");
        tokenizer.words(text).map(|t| t.text.to_string()).collect()
    }

    #[test]
    fn punctuation_only_joins_inside_words() {
        assert_eq!(words("\"Don't,\" she said. co-worker's end."), vec!["Don't", "she", "said", "co-worker's", "end"]);
    }

    #[test]
    fn markers_are_skipped() {
        assert_eq!(words(r"\p In the \nd Lord\nd* \+wj* we"), vec!["In", "the", "Lord", "we"]);
    }

    #[test]
    fn milestones_are_markers() {
        assert_eq!(words(r#"\qt-s |who="Pilate"\*Hail, King\qt-e\* he said"#), vec!["Hail", "King", "he", "said"]);
    }

    #[test]
    fn keep_content_span_text_is_tokenized() {
        assert_eq!(words(r"\wj Follow me\wj* he said"), vec!["Follow", "me", "he", "said"]);
    }

    #[test]
    fn footnote_and_cross_reference_are_dropped() {
        let text = r"light\f + \fr 1:3 \ft Or brightness\f* was good \x - \xo 1:3 \xt Jn 1:5\x* indeed";
        assert_eq!(words(text), vec!["light", "was", "good", "indeed"]);
    }

    #[test]
    fn nested_plus_spans_need_matching_closer() {
        assert_eq!(words(r"a \+f nested\+f* b"), vec!["a", "b"]);
    }

    #[test]
    fn fe_is_not_mistaken_for_f() {
        assert_eq!(words(r"one \fe endnote\fe* two"), vec!["one", "two"]);
    }

    #[test]
    fn attributes_are_skipped() {
        assert_eq!(words(r#"\w gracious|lemma="grace"\w* Lord"#), vec!["gracious", "Lord"]);
    }

    #[test]
    fn attributes_kept_when_disabled() {
        let settings = IndexerSettings { skip_attributes: false, ..IndexerSettings::default() };
        let tokenizer = Tokenizer::new(&settings).expect("tokenizer");
        let got: Vec<&str> = tokenizer.words(r#"\w gracious|lemma="grace"\w*"#).map(|t| t.text).collect();
        assert_eq!(got, vec!["gracious", "lemma", "grace"]);
    }

    #[test]
    fn unclosed_span_keeps_content_by_default() {
        assert_eq!(words(r"before \f + note text"), vec!["before", "note", "text"]);
    }

    #[test]
    fn unclosed_span_can_drop_to_end() {
        let settings = IndexerSettings { unclosed_spans: UnclosedSpanPolicy::DropToEnd, ..IndexerSettings::default() };
        let tokenizer = Tokenizer::new(&settings).expect("tokenizer");
        let got: Vec<&str> = tokenizer.words(r"before \f + note text").map(|t| t.text).collect();
        assert_eq!(got, vec!["before"]);
    }

    #[test]
    fn stray_closer_is_a_marker() {
        let tokenizer = Tokenizer::new(&IndexerSettings::default()).expect("tokenizer");
        let kinds: Vec<TokenKind> = tokenizer.tokens(r"x\f* y").map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Word, TokenKind::Marker, TokenKind::Word]);
    }

    #[test]
    fn drop_list_is_configurable() {
        let settings = IndexerSettings { drop_spans: vec!["wj".to_string()], ..IndexerSettings::default() };
        let tokenizer = Tokenizer::new(&settings).expect("tokenizer");
        let got: Vec<&str> = tokenizer.words(r"\wj hidden\wj* shown \f + note\f*").map(|t| t.text).collect();
        assert_eq!(got, vec!["shown", "note"]);
    }

    #[test]
    fn non_latin_scripts() {
        assert_eq!(words("Ἐν ἀρχῇ ἦν ὁ λόγος"), vec!["Ἐν", "ἀρχῇ", "ἦν", "ὁ", "λόγος"]);
    }

    #[test]
    fn word_char_classes() {
        assert!(is_word_char('a'));
        assert!(is_word_char('7'));
        assert!(is_word_char('\u{E000}'));
        assert!(!is_word_char(' '));
        assert!(!is_word_char('\\'));
        assert!(!is_word_char(','));
    }
}
