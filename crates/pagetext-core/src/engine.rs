//! Extraction engine traits.
//!
//! Both engines are external collaborators: an image-to-text recognizer and a
//! paged-document text reader. Implementations live in their own crates
//! (`pagetext-ocr-tesseract`, `pagetext-pdf-mupdf`); tests use [`crate::mock`].

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed, sendable future returned by engine methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("open error: {0}")]
    Open(String),
    #[error("page error: {0}")]
    Page(String),
    #[error("recognition error: {0}")]
    Recognition(String),
}

/// Output of a single recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    pub text: String,
}

/// One text item on a document page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// An OCR engine turning image bytes into text.
pub trait ImageRecognizer: Send + Sync {
    /// Short engine name used in logs (e.g. "tesseract").
    fn name(&self) -> &str;

    /// Recognize the text in `data` using the given language hint.
    fn recognize<'a>(
        &'a self,
        data: &'a [u8],
        language: &'a str,
    ) -> BoxFuture<'a, Result<Recognized, EngineError>>;
}

/// A paged-document engine that can open a byte source.
pub trait DocumentReader: Send + Sync {
    fn name(&self) -> &str;

    fn open<'a>(
        &'a self,
        data: &'a [u8],
    ) -> BoxFuture<'a, Result<Box<dyn PagedDocument>, EngineError>>;
}

/// An opened paged document. Page numbers are 1-based.
pub trait PagedDocument: Send + Sync {
    fn page_count(&self) -> usize;

    fn page<'a>(
        &'a self,
        number: usize,
    ) -> BoxFuture<'a, Result<Box<dyn DocumentPage + 'a>, EngineError>>;
}

pub trait DocumentPage: Send + Sync {
    /// Text items of this page in reading order.
    fn text_fragments<'a>(&'a self) -> BoxFuture<'a, Result<Vec<TextFragment>, EngineError>>;
}
