use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

/// Where the window/tab title is written.
///
/// `set_title` can run while `DetailSession` is publishing a new state, so an
/// implementation must not read or change session state.
pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

/// Hands out `TitleGuard`s that point the title at a movie and put the
/// default back when dropped.
#[derive(Clone)]
pub struct DocumentTitle {
    sink: Arc<dyn TitleSink>,
    default_title: String,
}

impl DocumentTitle {
    pub fn new(sink: Arc<dyn TitleSink>, default_title: impl Into<String>) -> Self {
        Self {
            sink,
            default_title: default_title.into(),
        }
    }

    pub fn acquire(&self, movie_title: &str) -> TitleGuard {
        self.sink.set_title(&format!("Movie | {}", movie_title));
        TitleGuard {
            sink: Arc::clone(&self.sink),
            default_title: self.default_title.clone(),
        }
    }
}

/// Title override held while a movie detail is on screen.
#[must_use = "the title reverts as soon as the guard is dropped"]
pub struct TitleGuard {
    sink: Arc<dyn TitleSink>,
    default_title: String,
}

impl Drop for TitleGuard {
    fn drop(&mut self) {
        self.sink.set_title(&self.default_title);
    }
}

pub struct NoopTitle;

impl TitleSink for NoopTitle {
    fn set_title(&self, _title: &str) {}
}

/// Keeps every title it was given, in order.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingTitle {
    history: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingTitle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.history().last().cloned()
    }
}

#[cfg(test)]
impl TitleSink for RecordingTitle {
    fn set_title(&self, title: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.push(title.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_reverts_once_on_drop() {
        let sink = Arc::new(RecordingTitle::new());
        let title = DocumentTitle::new(sink.clone(), "Popcorn");

        let guard = title.acquire("Batman");
        assert_eq!(sink.current().as_deref(), Some("Movie | Batman"));
        drop(guard);

        assert_eq!(sink.history(), vec!["Movie | Batman".to_string(), "Popcorn".to_string()]);
    }
}
