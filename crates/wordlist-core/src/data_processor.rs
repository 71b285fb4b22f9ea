use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::canon;

static ID_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\id\s+([A-Za-z0-9]{3})").expect("valid \\id pattern")
});

/// One USFM book read from disk.
#[derive(Debug, Clone)]
pub struct BookText {
    pub book_id: String,
    pub path: PathBuf,
    pub text: String,
}

/// File extensions read as USFM, compared case-insensitively.
pub const USFM_EXTENSIONS: [&str; 2] = ["usfm", "sfm"];

#[derive(Debug, Default)]
pub struct UsfmLoader;

impl UsfmLoader {
    pub fn new() -> Self { Self }

    /// Load every USFM book under `data_dir`, ordered canonically.
    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<BookText>> {
        let files = self.list_usfm_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no USFM files found");
            return Ok(vec![]);
        }
        let mut books = Vec::new();
        for file_path in &files {
            if let Some(book) = self.load_file(file_path)? {
                books.push(book);
            }
        }
        books.sort_by_key(|b| (canon::book_number(&b.book_id).unwrap_or(usize::MAX), b.book_id.clone()));
        tracing::info!(files = files.len(), books = books.len(), "loaded USFM directory");
        Ok(books)
    }

    /// Read one file. Files without a `\id` line are skipped with a warning.
    pub fn load_file(&self, file_path: &Path) -> Result<Option<BookText>> {
        let text = self.read_file_content(file_path)?;
        match extract_book_id(&text) {
            Some(book_id) => {
                if !canon::is_known_book(&book_id) {
                    tracing::warn!(book = %book_id, path = %file_path.display(), "unrecognised book id");
                }
                Ok(Some(BookText { book_id, path: file_path.to_path_buf(), text }))
            }
            None => {
                tracing::warn!(path = %file_path.display(), "no \\id marker, skipping");
                Ok(None)
            }
        }
    }

    pub fn list_usfm_files(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return vec![root.to_path_buf()];
        }
        let mut usfm_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| USFM_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)));
            if matches { usfm_files.push(path.to_path_buf()); }
        }
        usfm_files.sort(); usfm_files
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }
}

/// Book id from the `\id` line, upper-cased.
pub fn extract_book_id(text: &str) -> Option<String> {
    ID_MARKER.captures(text).map(|c| c[1].to_ascii_uppercase())
}
