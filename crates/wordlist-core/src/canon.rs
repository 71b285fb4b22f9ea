//! USFM book identifiers and their English names.

use crate::types::ScriptureLocation;

const BOOKS: &[(&str, &str)] = &[
    ("GEN", "Genesis"),
    ("EXO", "Exodus"),
    ("LEV", "Leviticus"),
    ("NUM", "Numbers"),
    ("DEU", "Deuteronomy"),
    ("JOS", "Joshua"),
    ("JDG", "Judges"),
    ("RUT", "Ruth"),
    ("1SA", "1 Samuel"),
    ("2SA", "2 Samuel"),
    ("1KI", "1 Kings"),
    ("2KI", "2 Kings"),
    ("1CH", "1 Chronicles"),
    ("2CH", "2 Chronicles"),
    ("EZR", "Ezra"),
    ("NEH", "Nehemiah"),
    ("EST", "Esther"),
    ("JOB", "Job"),
    ("PSA", "Psalms"),
    ("PRO", "Proverbs"),
    ("ECC", "Ecclesiastes"),
    ("SNG", "Song of Songs"),
    ("ISA", "Isaiah"),
    ("JER", "Jeremiah"),
    ("LAM", "Lamentations"),
    ("EZK", "Ezekiel"),
    ("DAN", "Daniel"),
    ("HOS", "Hosea"),
    ("JOL", "Joel"),
    ("AMO", "Amos"),
    ("OBA", "Obadiah"),
    ("JON", "Jonah"),
    ("MIC", "Micah"),
    ("NAM", "Nahum"),
    ("HAB", "Habakkuk"),
    ("ZEP", "Zephaniah"),
    ("HAG", "Haggai"),
    ("ZEC", "Zechariah"),
    ("MAL", "Malachi"),
    ("MAT", "Matthew"),
    ("MRK", "Mark"),
    ("LUK", "Luke"),
    ("JHN", "John"),
    ("ACT", "Acts"),
    ("ROM", "Romans"),
    ("1CO", "1 Corinthians"),
    ("2CO", "2 Corinthians"),
    ("GAL", "Galatians"),
    ("EPH", "Ephesians"),
    ("PHP", "Philippians"),
    ("COL", "Colossians"),
    ("1TH", "1 Thessalonians"),
    ("2TH", "2 Thessalonians"),
    ("1TI", "1 Timothy"),
    ("2TI", "2 Timothy"),
    ("TIT", "Titus"),
    ("PHM", "Philemon"),
    ("HEB", "Hebrews"),
    ("JAS", "James"),
    ("1PE", "1 Peter"),
    ("2PE", "2 Peter"),
    ("1JN", "1 John"),
    ("2JN", "2 John"),
    ("3JN", "3 John"),
    ("JUD", "Jude"),
    ("REV", "Revelation"),
    ("TOB", "Tobit"),
    ("JDT", "Judith"),
    ("ESG", "Esther (Greek)"),
    ("WIS", "Wisdom of Solomon"),
    ("SIR", "Sirach"),
    ("BAR", "Baruch"),
    ("1MA", "1 Maccabees"),
    ("2MA", "2 Maccabees"),
];

pub fn is_known_book(id: &str) -> bool {
    english_name(id).is_some()
}

pub fn english_name(id: &str) -> Option<&'static str> {
    let id = id.to_ascii_uppercase();
    BOOKS.iter().find(|(b, _)| *b == id).map(|(_, name)| *name)
}

/// Position of the book in canonical order, 1-based.
pub fn book_number(id: &str) -> Option<usize> {
    let id = id.to_ascii_uppercase();
    BOOKS.iter().position(|(b, _)| *b == id).map(|i| i + 1)
}

/// `"Genesis 1:3"`; unknown books keep their raw id.
pub fn format_reference(location: &ScriptureLocation) -> String {
    let book = english_name(&location.book).unwrap_or(location.book.as_str());
    format!("{} {}:{}", book, location.chapter, location.verse)
}
