//! In-memory `ProjectTextSource` used by the CLI and by tests, and the
//! listener bookkeeping shared with the provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{Error, Result};
use crate::traits::{ChangeListener, ProjectTextSource, Subscription};

type SharedListener = Arc<dyn Fn() + Send + Sync>;

struct Registry<K> {
    next_id: u64,
    by_id: HashMap<u64, (K, SharedListener)>,
}

/// Listeners keyed by what they watch. Cloning shares the same set.
pub struct ListenerSet<K> {
    inner: Arc<Mutex<Registry<K>>>,
}

impl<K> Clone for ListenerSet<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K> Default for ListenerSet<K> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(Registry { next_id: 0, by_id: HashMap::new() })) }
    }
}

fn poisoned(what: &str) -> Error {
    Error::Operation(format!("{} lock poisoned", what))
}

impl<K> ListenerSet<K>
where
    K: PartialEq + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: K, listener: ChangeListener) -> Result<Subscription> {
        let id = {
            let mut registry = self.inner.lock().map_err(|_| poisoned("listeners"))?;
            let id = registry.next_id;
            registry.next_id += 1;
            registry.by_id.insert(id, (key, Arc::from(listener)));
            id
        };
        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            if let Ok(mut registry) = inner.lock() {
                registry.by_id.remove(&id);
            }
        }))
    }

    /// Call every listener registered under `key`; returns how many ran.
    ///
    /// Listeners run after the lock is released, so they may subscribe or
    /// unsubscribe themselves.
    pub fn notify(&self, key: &K) -> Result<usize> {
        let matching: Vec<SharedListener> = {
            let registry = self.inner.lock().map_err(|_| poisoned("listeners"))?;
            registry.by_id.values().filter(|(k, _)| k == key).map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in &matching {
            listener();
        }
        Ok(matching.len())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.lock().map_err(|_| poisoned("listeners"))?.by_id.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

type BookKey = (String, String);

/// Book texts keyed by `(project, book)`. Book ids are compared upper-cased.
#[derive(Default)]
pub struct MemoryTextSource {
    books: RwLock<HashMap<BookKey, String>>,
    listeners: ListenerSet<BookKey>,
}

fn key(project_id: &str, book: &str) -> BookKey {
    (project_id.to_string(), book.to_ascii_uppercase())
}

impl MemoryTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store text without notifying subscribers. Used while loading.
    pub fn insert_book(&self, project_id: &str, book: &str, text: String) -> Result<()> {
        let mut books = self.books.write().map_err(|_| poisoned("books"))?;
        books.insert(key(project_id, book), text);
        Ok(())
    }

    /// Replace a book's text and notify everyone subscribed to it.
    pub fn set_book_text(&self, project_id: &str, book: &str, text: String) -> Result<()> {
        self.insert_book(project_id, book, text)?;
        let notified = self.listeners.notify(&key(project_id, book))?;
        tracing::debug!(project = project_id, book, listeners = notified, "book text changed");
        Ok(())
    }

    pub fn books(&self, project_id: &str) -> Result<Vec<String>> {
        let books = self.books.read().map_err(|_| poisoned("books"))?;
        let mut ids: Vec<String> = books.keys().filter(|(p, _)| p == project_id).map(|(_, b)| b.clone()).collect();
        ids.sort();
        Ok(ids)
    }

    pub fn subscriber_count(&self) -> Result<usize> {
        self.listeners.len()
    }
}

impl ProjectTextSource for MemoryTextSource {
    fn fetch_book_text(&self, project_id: &str, book: &str) -> anyhow::Result<Option<String>> {
        let books = self.books.read().map_err(|_| poisoned("books"))?;
        Ok(books.get(&key(project_id, book)).cloned())
    }

    fn subscribe(&self, project_id: &str, book: &str, on_change: ChangeListener) -> anyhow::Result<Subscription> {
        Ok(self.listeners.add(key(project_id, book), on_change)?)
    }
}
