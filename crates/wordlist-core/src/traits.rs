use std::fmt;

/// Callback fired when the text behind a subscription changes.
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// Where book text comes from. The host application (or the CLI's in-memory
/// store) owns the data; the word list only reads and listens.
pub trait ProjectTextSource: Send + Sync {
    /// Marked-up text of `book` in `project_id`, or `None` when the project has no such book.
    fn fetch_book_text(&self, project_id: &str, book: &str) -> anyhow::Result<Option<String>>;

    /// Register `on_change` for edits to `book`. The listener stays active until
    /// the returned subscription is dropped or unsubscribed. Implementations
    /// may call `on_change` before returning.
    fn subscribe(&self, project_id: &str, book: &str, on_change: ChangeListener) -> anyhow::Result<Subscription>;
}

/// Handle for a registered listener. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}
