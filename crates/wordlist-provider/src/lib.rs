//! wordlist-provider
//!
//! Answers word-list queries for a selector by combining a `ProjectTextSource`
//! with the USFM indexer, and re-announces text changes to its own listeners.
//! `views` shapes a word list for table, cloud and occurrence displays.

pub mod views;

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};

use wordlist_core::config::IndexerSettings;
use wordlist_core::source::ListenerSet;
use wordlist_core::traits::{ChangeListener, ProjectTextSource, Subscription};
use wordlist_core::types::{WordIndex, WordListSelector};
use wordlist_core::Error;
use wordlist_usfm::{WordIndexCache, WordIndexer};

#[derive(Default)]
struct ProviderState {
    cache: WordIndexCache,
    text_subscription: Option<Subscription>,
    current: Option<Arc<WordIndex>>,
}

pub struct WordListProvider<S> where S: ProjectTextSource {
    source: Arc<S>,
    indexer: WordIndexer,
    state: Mutex<ProviderState>,
    updates: ListenerSet<()>,
}

impl<S> WordListProvider<S> where S: ProjectTextSource {
    pub fn new(source: Arc<S>, settings: &IndexerSettings) -> wordlist_core::Result<Self> {
        Ok(Self {
            source,
            indexer: WordIndexer::new(settings)?,
            state: Mutex::new(ProviderState::default()),
            updates: ListenerSet::new(),
        })
    }

    fn lock(&self) -> wordlist_core::Result<MutexGuard<'_, ProviderState>> {
        self.state.lock().map_err(|_| Error::Operation("word list state lock poisoned".to_string()))
    }

    /// Word list for `selector`, or `None` when the project has no text for the book.
    ///
    /// Every call moves the change subscription to the selected book; an edit
    /// to that book fires the listeners registered with [`subscribe_updates`](Self::subscribe_updates).
    /// The source is only called while the state lock is released, so it may
    /// fire `on_change` from inside `subscribe` and listeners may query again.
    pub fn get_word_list(&self, selector: &WordListSelector) -> Result<Option<Arc<WordIndex>>> {
        let previous = self.lock()?.text_subscription.take();
        drop(previous);

        let book = selector.location.book.as_str();
        let text = self.source.fetch_book_text(&selector.project_id, book)?;
        let updates = self.updates.clone();
        let subscription = self.source.subscribe(
            &selector.project_id,
            book,
            Box::new(move || {
                if let Err(e) = updates.notify(&()) {
                    tracing::warn!(error = %e, "failed to notify word list listeners");
                }
            }),
        )?;

        let mut state = self.lock()?;
        let replaced = state.text_subscription.replace(subscription);
        let result = match text {
            Some(text) => {
                let ProviderState { cache, current, .. } = &mut *state;
                let index = self.indexer.build_cached(cache, &text, &selector.location, selector.scope)?;
                *current = Some(Arc::clone(&index));
                Some(index)
            }
            None => {
                tracing::debug!(project = %selector.project_id, book, "no text for book");
                state.current = None;
                None
            }
        };
        drop(state);
        drop(replaced);
        Ok(result)
    }

    /// The list returned by the most recent successful query.
    pub fn current(&self) -> Option<Arc<WordIndex>> {
        self.lock().ok().and_then(|s| s.current.clone())
    }

    /// Word lists are derived from the text and cannot be written.
    pub fn set_word_list(&self, _selector: &WordListSelector, _index: WordIndex) -> wordlist_core::Result<()> {
        Err(Error::ReadOnly("word list is generated and cannot be set".to_string()))
    }

    /// Register a listener fired whenever the text behind the current word list changes.
    pub fn subscribe_updates(&self, listener: ChangeListener) -> wordlist_core::Result<Subscription> {
        self.updates.add((), listener)
    }

    /// Drop the text subscription and the cached index.
    pub fn dispose(&self) -> wordlist_core::Result<()> {
        let subscription = {
            let mut state = self.lock()?;
            state.cache.clear();
            state.current = None;
            state.text_subscription.take()
        };
        drop(subscription);
        Ok(())
    }
}
