//! Mock engines for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::engine::{
    BoxFuture, DocumentPage, DocumentReader, EngineError, ImageRecognizer, PagedDocument,
    Recognized, TextFragment,
};

/// A configurable response for [`MockRecognizer`].
#[derive(Clone, Debug)]
pub enum MockRecognition {
    Text(String),
    Error(String),
}

/// A hand-rolled mock implementing [`ImageRecognizer`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, repeating the last if exhausted).
/// - Optional per-call latency.
/// - Call counting and recording of the language hints received.
pub struct MockRecognizer {
    responses: Mutex<Vec<MockRecognition>>,
    fallback: MockRecognition,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    languages: Mutex<Vec<String>>,
}

impl MockRecognizer {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockRecognition) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockRecognition>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reversed so pop() yields them front to back.
        responses.reverse();
        let fallback = responses[0].clone();
        Self {
            responses: Mutex::new(responses),
            fallback,
            delay: None,
            call_count: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `recognize()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Language hints received so far, in call order.
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockRecognition {
        let mut seq = self.responses.lock().unwrap();
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl ImageRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    fn recognize<'a>(
        &'a self,
        _data: &'a [u8],
        language: &'a str,
    ) -> BoxFuture<'a, Result<Recognized, EngineError>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockRecognition::Text(text) => Ok(Recognized { text }),
                MockRecognition::Error(msg) => Err(EngineError::Recognition(msg)),
            }
        })
    }
}

/// A page served by [`MockReader`].
#[derive(Clone, Debug)]
pub enum MockPage {
    Fragments(Vec<String>),
    /// Fetching the page itself fails.
    FetchError(String),
    /// The page loads but its text content cannot be read.
    ContentError(String),
}

impl MockPage {
    pub fn text(fragments: &[&str]) -> Self {
        MockPage::Fragments(fragments.iter().map(|s| s.to_string()).collect())
    }
}

/// A hand-rolled mock implementing [`DocumentReader`].
///
/// Every `open()` yields a document with the configured pages. Page fetches
/// are logged so tests can assert on ordering.
pub struct MockReader {
    pages: Vec<MockPage>,
    open_error: Option<String>,
    delay: Option<Duration>,
    open_count: AtomicUsize,
    fetch_log: std::sync::Arc<Mutex<Vec<usize>>>,
}

impl MockReader {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            open_error: None,
            delay: None,
            open_count: AtomicUsize::new(0),
            fetch_log: Default::default(),
        }
    }

    /// A reader whose `open()` always fails with `msg`.
    pub fn failing_open(msg: impl Into<String>) -> Self {
        Self {
            open_error: Some(msg.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Set simulated latency for `open()` and for each page fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Page numbers fetched across all opened documents, in fetch order.
    pub fn fetched_pages(&self) -> Vec<usize> {
        self.fetch_log.lock().unwrap().clone()
    }
}

impl DocumentReader for MockReader {
    fn name(&self) -> &str {
        "mock-pdf"
    }

    fn open<'a>(
        &'a self,
        _data: &'a [u8],
    ) -> BoxFuture<'a, Result<Box<dyn PagedDocument>, EngineError>> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if let Some(msg) = &self.open_error {
                return Err(EngineError::Open(msg.clone()));
            }
            let document: Box<dyn PagedDocument> = Box::new(MockDocument {
                pages: self.pages.clone(),
                delay: self.delay,
                fetch_log: self.fetch_log.clone(),
            });
            Ok(document)
        })
    }
}

struct MockDocument {
    pages: Vec<MockPage>,
    delay: Option<Duration>,
    fetch_log: std::sync::Arc<Mutex<Vec<usize>>>,
}

impl PagedDocument for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page<'a>(
        &'a self,
        number: usize,
    ) -> BoxFuture<'a, Result<Box<dyn DocumentPage + 'a>, EngineError>> {
        Box::pin(async move {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.fetch_log.lock().unwrap().push(number);
            let page = number
                .checked_sub(1)
                .and_then(|i| self.pages.get(i))
                .ok_or_else(|| EngineError::Page(format!("no page {number}")))?;
            match page {
                MockPage::FetchError(msg) => Err(EngineError::Page(msg.clone())),
                other => {
                    let page: Box<dyn DocumentPage + 'a> = Box::new(MockLoadedPage(other));
                    Ok(page)
                }
            }
        })
    }
}

struct MockLoadedPage<'a>(&'a MockPage);

impl DocumentPage for MockLoadedPage<'_> {
    fn text_fragments<'b>(&'b self) -> BoxFuture<'b, Result<Vec<TextFragment>, EngineError>> {
        let result = match self.0 {
            MockPage::Fragments(items) => Ok(items
                .iter()
                .map(|text| TextFragment { text: text.clone() })
                .collect()),
            MockPage::ContentError(msg) | MockPage::FetchError(msg) => {
                Err(EngineError::Page(msg.clone()))
            }
        };
        Box::pin(async move { result })
    }
}
