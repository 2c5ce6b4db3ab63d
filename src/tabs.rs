use std::sync::{Mutex, PoisonError};

use url::Url;

/// Opens URLs in a new tab of the current browser window.
///
/// The parser only ever needs this one capability of the browser, so the
/// window/tab machinery stays behind this trait.
pub trait TabOpener: Send + Sync {
    fn tabopen(&self, url: &Url);
}

/// A [`TabOpener`] that records every URL it is asked to open.
#[derive(Debug, Default)]
pub struct TabLog {
    opened: Mutex<Vec<Url>>,
}

impl TabLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All URLs opened so far, oldest first.
    #[must_use]
    pub fn opened(&self) -> Vec<Url> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Url> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<Url> {
        std::mem::take(&mut *self.opened.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl TabOpener for TabLog {
    fn tabopen(&self, url: &Url) {
        tracing::debug!(%url, "tabopen");
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
    }
}
