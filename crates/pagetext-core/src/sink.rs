use tokio::sync::watch;

/// Receives the text of each successful extraction.
///
/// `set_result` replaces the held value in full; there is no append.
pub trait ResultSink: Send + Sync {
    fn set_result(&self, text: String);
}

/// In-memory display buffer. Starts empty.
///
/// Backed by a [`watch`] channel so a display can await replacements via
/// [`TextBuffer::subscribe`].
#[derive(Debug)]
pub struct TextBuffer {
    tx: watch::Sender<String>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(String::new());
        Self { tx }
    }

    /// Current result text.
    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl ResultSink for TextBuffer {
    fn set_result(&self, text: String) {
        // send_replace stores the value even with no receivers alive.
        self.tx.send_replace(text);
    }
}
