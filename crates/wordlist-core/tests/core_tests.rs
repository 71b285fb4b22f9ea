use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use figment::providers::{Format, Toml};
use figment::Figment;

use wordlist_core::canon;
use wordlist_core::config::{Config, IndexerSettings, UnclosedSpanPolicy, DEFAULT_DROP_SPANS};
use wordlist_core::data_processor::{extract_book_id, UsfmLoader};
use wordlist_core::source::{ListenerSet, MemoryTextSource};
use wordlist_core::traits::ProjectTextSource;
use wordlist_core::types::{Scope, ScriptureLocation, WordListSelector};

#[test]
fn load_directory_reads_books_in_canon_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.usfm"), "\\id REV\n\\c 1 \\v 1 Amen").unwrap();
    fs::create_dir(dir.join("ot")).unwrap();
    let mut f = fs::File::create(dir.join("ot").join("z.SFM")).unwrap();
    writeln!(f, "\\id gen Genesis\n\\c 1\n\\v 1 In the beginning").unwrap();
    fs::write(dir.join("notes.txt"), "\\id EXO").unwrap();

    let books = UsfmLoader::new().load_directory(dir).expect("load");

    let ids: Vec<&str> = books.iter().map(|b| b.book_id.as_str()).collect();
    assert_eq!(ids, vec!["GEN", "REV"], "only usfm/sfm files, canonical order");
    assert!(books[0].text.contains("In the beginning"));
}

#[test]
fn files_without_id_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("x.usfm");
    fs::write(&path, "\\c 1 \\v 1 orphan").unwrap();
    assert!(UsfmLoader::new().load_file(&path).expect("load").is_none());
    assert!(UsfmLoader::new().load_directory(tmp.path()).expect("load").is_empty());
}

#[test]
fn single_file_path_is_listed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("JHN.usfm");
    fs::write(&path, "\\id JHN").unwrap();
    assert_eq!(UsfmLoader::new().list_usfm_files(&path), vec![path]);
}

#[test]
fn book_id_comes_from_id_line() {
    assert_eq!(extract_book_id("\\id 1co - test\n\\c 1"), Some("1CO".to_string()));
    assert_eq!(extract_book_id("\\c 1"), None);
}

#[test]
fn memory_source_notifies_matching_subscribers() {
    let source = MemoryTextSource::new();
    source.insert_book("p", "gen", "one".to_string()).unwrap();
    assert_eq!(source.fetch_book_text("p", "GEN").unwrap(), Some("one".to_string()));
    assert_eq!(source.fetch_book_text("q", "GEN").unwrap(), None);

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let sub = source
        .subscribe("p", "GEN", Box::new(move || { counter.fetch_add(1, Ordering::SeqCst); }))
        .unwrap();

    source.set_book_text("p", "EXO", "other".to_string()).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    source.set_book_text("p", "GEN", "two".to_string()).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    sub.unsubscribe();
    source.set_book_text("p", "GEN", "three".to_string()).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(source.subscriber_count().unwrap(), 0);
    assert_eq!(source.books("p").unwrap(), vec!["EXO".to_string(), "GEN".to_string()]);
}

#[test]
fn dropping_subscription_unsubscribes() {
    let source = MemoryTextSource::new();
    {
        let _sub = source.subscribe("p", "GEN", Box::new(|| {})).unwrap();
        assert_eq!(source.subscriber_count().unwrap(), 1);
    }
    assert_eq!(source.subscriber_count().unwrap(), 0);
}

struct PanickyKey;

impl PartialEq for PanickyKey {
    fn eq(&self, _: &Self) -> bool {
        panic!("comparison failed")
    }
}

#[test]
fn poisoned_listener_set_reports_errors() {
    let listeners = ListenerSet::new();
    let _sub = listeners.add(PanickyKey, Box::new(|| {})).unwrap();
    assert_eq!(listeners.len().unwrap(), 1);

    let shared = listeners.clone();
    assert!(panic::catch_unwind(AssertUnwindSafe(|| shared.notify(&PanickyKey))).is_err());

    assert!(listeners.len().is_err());
    assert!(listeners.is_empty().is_err());
    assert!(listeners.add(PanickyKey, Box::new(|| {})).is_err());
}

#[test]
fn scope_parses_case_insensitively() {
    assert_eq!("chapter".parse::<Scope>().unwrap(), Scope::Chapter);
    assert_eq!("VERSE".parse::<Scope>().unwrap(), Scope::Verse);
    assert!("page".parse::<Scope>().is_err());
    assert_eq!(Scope::default().to_string(), "Book");
}

#[test]
fn selector_refresh_depends_on_scope() {
    let sel = WordListSelector::new("p", Scope::Chapter, ScriptureLocation::new("GEN", 1, 1));
    assert!(!sel.needs_refresh("p", Scope::Chapter, &ScriptureLocation::new("GEN", 1, 5)));
    assert!(sel.needs_refresh("p", Scope::Chapter, &ScriptureLocation::new("GEN", 2, 1)));
    assert!(sel.needs_refresh("p", Scope::Verse, &ScriptureLocation::new("GEN", 1, 1)));
    assert!(sel.needs_refresh("q", Scope::Chapter, &ScriptureLocation::new("GEN", 1, 1)));

    let book = WordListSelector::new("p", Scope::Book, ScriptureLocation::new("GEN", 1, 1));
    assert!(!book.needs_refresh("p", Scope::Book, &ScriptureLocation::new("GEN", 50, 26)));
    assert!(book.needs_refresh("p", Scope::Book, &ScriptureLocation::new("EXO", 1, 1)));
}

#[test]
fn canon_names_and_references() {
    assert_eq!(canon::english_name("jhn"), Some("John"));
    assert_eq!(canon::book_number("GEN"), Some(1));
    assert_eq!(canon::book_number("REV"), Some(66));
    assert_eq!(canon::format_reference(&ScriptureLocation::new("PSA", 23, 1)), "Psalms 23:1");
    assert_eq!(canon::format_reference(&ScriptureLocation::new("XYZ", 1, 2)), "XYZ 1:2");
}

#[test]
fn config_defaults_apply_without_files() {
    let config = Config::from_provider(Figment::new()).expect("config");
    let settings = config.indexer_settings().expect("settings");
    assert_eq!(settings, IndexerSettings::default());
    assert_eq!(settings.snippet_radius, 40);
    assert_eq!(settings.drop_spans.len(), DEFAULT_DROP_SPANS.len());
}

#[test]
fn config_overrides_merge_over_defaults() {
    let toml = r#"
        [indexer]
        snippet_radius = 12
        unclosed_spans = "drop_to_end"

        [data]
        usfm_dir = "~/usfm"
    "#;
    let config = Config::from_provider(Figment::from(Toml::string(toml))).expect("config");
    let settings = config.indexer_settings().expect("settings");
    assert_eq!(settings.snippet_radius, 12);
    assert_eq!(settings.unclosed_spans, UnclosedSpanPolicy::DropToEnd);
    assert!(settings.skip_attributes);
    let dir: String = config.get("data.usfm_dir").expect("dir");
    assert_eq!(dir, "~/usfm");
}

#[test]
fn invalid_drop_span_is_rejected() {
    let toml = r#"
        [indexer]
        drop_spans = ["f", "\\x"]
    "#;
    assert!(Config::from_provider(Figment::from(Toml::string(toml))).is_err());
}
