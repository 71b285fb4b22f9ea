use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordlist_core::canon;
use wordlist_core::config::{expand_path, Config};
use wordlist_core::data_processor::UsfmLoader;
use wordlist_core::source::MemoryTextSource;
use wordlist_core::types::{Scope, ScriptureLocation, WordListSelector};
use wordlist_provider::views::{
    filter_entries, occurrence_rows, sort_table, word_cloud, word_count_title, word_table, SortKey,
};
use wordlist_provider::WordListProvider;

const USAGE: &str = "Usage: wordlist <index|occurrences|cloud> [path] [word] \
[--project ID] [--book ID] [--scope book|chapter|verse] [--chapter N] [--verse N] \
[--filter TEXT] [--sort word|count] [--limit N] [--json]";

#[derive(Debug, Default)]
struct Args {
    command: String,
    positional: Vec<String>,
    project: Option<String>,
    book: Option<String>,
    scope: Scope,
    chapter: u32,
    verse: u32,
    filter: String,
    sort: Option<SortKey>,
    limit: Option<usize>,
    json: bool,
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> anyhow::Result<&'a str> {
    args.get(i + 1).map(String::as_str).ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else { bail!(USAGE) };
    let mut parsed = Args { command, chapter: 1, verse: 1, ..Args::default() };
    let mut i = 1; while i < args.len() {
        match args[i].as_str() {
            "--project" => { parsed.project = Some(flag_value(&args, i, "--project")?.to_string()); i += 1; }
            "--book" => { parsed.book = Some(flag_value(&args, i, "--book")?.to_ascii_uppercase()); i += 1; }
            "--scope" => { parsed.scope = flag_value(&args, i, "--scope")?.parse()?; i += 1; }
            "--chapter" => { parsed.chapter = flag_value(&args, i, "--chapter")?.parse().context("--chapter requires a number")?; i += 1; }
            "--verse" => { parsed.verse = flag_value(&args, i, "--verse")?.parse().context("--verse requires a number")?; i += 1; }
            "--filter" => { parsed.filter = flag_value(&args, i, "--filter")?.to_string(); i += 1; }
            "--sort" => {
                parsed.sort = Some(match flag_value(&args, i, "--sort")? {
                    "word" => SortKey::Word,
                    "count" => SortKey::Count,
                    other => bail!("unknown sort key '{}'", other),
                });
                i += 1;
            }
            "--limit" => { parsed.limit = Some(flag_value(&args, i, "--limit")?.parse().context("--limit requires a number")?); i += 1; }
            "--json" => parsed.json = true,
            other if other.starts_with("--") => bail!("unknown flag '{}'\n{}", other, USAGE),
            other => parsed.positional.push(other.to_string()),
        }
        i += 1;
    }
    Ok(parsed)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn project_id_for(path: &Path) -> String {
    let dir = if path.is_file() { path.parent() } else { Some(path) };
    dir.and_then(|d| d.file_name()).map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "default".to_string())
}

/// Load every book under `path` into a fresh in-memory source.
fn load_project(path: &Path, project_id: &str) -> anyhow::Result<(Arc<MemoryTextSource>, Vec<String>)> {
    let loader = UsfmLoader::new();
    let files = loader.list_usfm_files(path);
    if files.is_empty() { bail!("no USFM files under {}", path.display()); }

    let source = Arc::new(MemoryTextSource::new());
    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()));
    let mut books = Vec::new();
    for file in &files {
        progress.set_message(file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default());
        if let Some(book) = loader.load_file(file)? {
            source.insert_book(project_id, &book.book_id, book.text)?;
            books.push(book.book_id);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    books.sort_by_key(|b| canon::book_number(b).unwrap_or(usize::MAX));
    tracing::info!(project = project_id, books = books.len(), "project loaded");
    Ok((source, books))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.indexer_settings()?;
    let args = parse_args()?;

    let mut positional = args.positional.iter();
    let path = positional.next().map(PathBuf::from).unwrap_or_else(|| {
        let dir: String = config.get("data.usfm_dir").unwrap_or_else(|_| "./usfm".to_string()); expand_path(dir)
    });
    let project_id = args.project.clone().unwrap_or_else(|| project_id_for(&path));
    let (source, books) = load_project(&path, &project_id)?;
    let book = match &args.book {
        Some(b) => b.clone(),
        None => books.first().cloned().ok_or_else(|| anyhow!("no books with an \\id line under {}", path.display()))?,
    };

    let provider = WordListProvider::new(Arc::clone(&source), &settings)?;
    let selector = WordListSelector::new(project_id.clone(), args.scope, ScriptureLocation::new(book.clone(), args.chapter, args.verse));
    let list = provider
        .get_word_list(&selector)?
        .ok_or_else(|| anyhow!("project '{}' has no text for {}", project_id, book))?;
    let entries = filter_entries(&list, &args.filter);

    match args.command.as_str() {
        "index" => {
            let mut rows = word_table(&entries);
            if let Some(key) = args.sort { sort_table(&mut rows, key, key == SortKey::Count); }
            if let Some(limit) = args.limit { rows.truncate(limit); }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{} for {} ({})", word_count_title(entries.len(), list.len()), book, args.scope);
                for row in &rows { println!("{:>6}  {}", row.count, row.word); }
            }
        }
        "occurrences" => {
            let word = positional.next().ok_or_else(|| anyhow!("occurrences needs a word\n{}", USAGE))?;
            let entry = list.get(word).ok_or_else(|| anyhow!("'{}' does not occur in {} ({})", word, book, args.scope))?;
            let rows = occurrence_rows(entry);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{} ({} occurrences)", entry.word, rows.len());
                for row in &rows { println!("{:<24} {}", row.reference, row.text.trim()); }
            }
        }
        "cloud" => {
            let cloud = word_cloud(&entries, args.limit.unwrap_or(settings.cloud_limit));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&cloud)?);
            } else {
                for word in &cloud { println!("{:>6}  {}", word.value, word.text); }
            }
        }
        other => bail!("Unknown command: {}\n{}", other, USAGE),
    }
    Ok(())
}
