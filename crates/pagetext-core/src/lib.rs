use thiserror::Error;

pub mod config_file;
pub mod engine;
pub mod extractor;
pub mod media;
pub mod mock;
pub mod sink;
pub mod uploader;

// Re-export for convenience
pub use engine::{
    BoxFuture, DocumentPage, DocumentReader, EngineError, ImageRecognizer, PagedDocument,
    Recognized, TextFragment,
};
pub use extractor::{DEFAULT_LANGUAGE, Extractor};
pub use media::{PDF_MEDIA_TYPE, Route};
pub use sink::{ResultSink, TextBuffer};
pub use uploader::Uploader;

/// A user-selected file, as handed over by a surface (web form, CLI).
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// Declared media type, e.g. `image/png` or `application/pdf`.
    pub media_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// Rejection of a submission before any engine is involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A file is required")]
    FileRequired,
}

/// Failure of one of the two extraction paths.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("image recognition failed: {0}")]
    Recognition(#[source] EngineError),
    #[error("failed to open document: {0}")]
    DocumentOpen(#[source] EngineError),
    #[error("failed to fetch page {page}: {source}")]
    PageFetch { page: usize, source: EngineError },
    #[error("failed to read text of page {page}: {source}")]
    TextContent { page: usize, source: EngineError },
}

/// What the dispatcher produced for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    /// The media type matched neither the image nor the PDF path; no engine ran.
    Unsupported { media_type: String },
}

/// How a submission settled.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The result buffer now holds this submission's text.
    Extracted { generation: u64, chars: usize },
    Unsupported { media_type: String },
    /// An engine failed; the result buffer was left as it was.
    Failed(ExtractError),
    /// A newer submission was accepted before this one finished.
    Superseded { generation: u64 },
}

impl SubmitOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, SubmitOutcome::Extracted { .. })
    }
}
