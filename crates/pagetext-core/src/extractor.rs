use std::sync::Arc;

use crate::engine::{DocumentReader, ImageRecognizer};
use crate::media::{self, Route};
use crate::{ExtractError, Extraction, UploadedFile};

/// Language hint passed to the image recognizer unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Routes an uploaded file to the matching engine and assembles its text.
#[derive(Clone)]
pub struct Extractor {
    recognizer: Arc<dyn ImageRecognizer>,
    reader: Arc<dyn DocumentReader>,
    language: String,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("recognizer", &self.recognizer.name())
            .field("reader", &self.reader.name())
            .field("language", &self.language)
            .finish()
    }
}

impl Extractor {
    pub fn new(recognizer: Arc<dyn ImageRecognizer>, reader: Arc<dyn DocumentReader>) -> Self {
        Self {
            recognizer,
            reader,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Override the OCR language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Extract the text of `file`.
    ///
    /// - `image/*` → one recognizer call with the language hint.
    /// - `application/pdf` → pages 1..=N read in order, each page's fragments
    ///   joined by a single space, pages concatenated with no separator.
    /// - anything else → [`Extraction::Unsupported`], no engine call.
    ///
    /// Engine failures on either path are returned as [`ExtractError`].
    pub async fn extract(&self, file: &UploadedFile) -> Result<Extraction, ExtractError> {
        match media::route(&file.media_type) {
            Route::Image => self.extract_image(file).await.map(Extraction::Text),
            Route::Pdf => self.extract_pdf(file).await.map(Extraction::Text),
            Route::Unsupported => {
                tracing::debug!(
                    file = %file.filename,
                    media_type = %file.media_type,
                    "unsupported media type, no extraction"
                );
                Ok(Extraction::Unsupported {
                    media_type: file.media_type.clone(),
                })
            }
        }
    }

    async fn extract_image(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        tracing::debug!(
            file = %file.filename,
            engine = self.recognizer.name(),
            language = %self.language,
            "recognizing image"
        );
        let recognized = self
            .recognizer
            .recognize(&file.data, &self.language)
            .await
            .map_err(ExtractError::Recognition)?;
        Ok(recognized.text)
    }

    async fn extract_pdf(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        let document = self
            .reader
            .open(&file.data)
            .await
            .map_err(ExtractError::DocumentOpen)?;

        let page_count = document.page_count();
        tracing::debug!(
            file = %file.filename,
            engine = self.reader.name(),
            pages = page_count,
            "opened document"
        );

        // One page at a time, in increasing order; fragments are concatenated
        // positionally.
        let mut text = String::new();
        for number in 1..=page_count {
            let page = document
                .page(number)
                .await
                .map_err(|source| ExtractError::PageFetch {
                    page: number,
                    source,
                })?;
            let fragments = page
                .text_fragments()
                .await
                .map_err(|source| ExtractError::TextContent {
                    page: number,
                    source,
                })?;

            let joined = fragments
                .iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            tracing::trace!(page = number, fragments = fragments.len(), "page text appended");
            text.push_str(&joined);
        }

        Ok(text)
    }
}
