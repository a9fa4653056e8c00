use std::sync::Arc;

use pagetext_core::{TextBuffer, Uploader};

/// Shared application state accessible from all handlers.
///
/// The server hosts a single form: one uploader and one result buffer.
pub struct AppState {
    pub uploader: Uploader,
    pub buffer: Arc<TextBuffer>,
}

impl AppState {
    pub fn new(extractor: pagetext_core::Extractor) -> Self {
        let buffer = Arc::new(TextBuffer::new());
        Self {
            uploader: Uploader::new(extractor, buffer.clone()),
            buffer,
        }
    }
}
