//! Submission handling: validation, latest-wins scheduling and result writes.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::extractor::Extractor;
use crate::sink::ResultSink;
use crate::{Extraction, ExtractError, SubmitOutcome, UploadedFile, ValidationError};

#[derive(Debug, Default)]
struct State {
    /// Generation of the newest accepted submission. 0 = none yet.
    generation: u64,
    /// Cancel token of the submission still running, if any.
    in_flight: Option<CancellationToken>,
    last_error: Option<String>,
}

/// Marks one accepted submission as running. Dropping it (including when the
/// `submit` future itself is dropped) clears the in-flight slot, unless a
/// newer submission already owns it.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    generation: u64,
    cancel: CancellationToken,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation == self.generation {
            state.in_flight = None;
        }
    }
}

/// Explicit state container for one upload form.
///
/// At most one submission is live at a time: accepting a new one cancels the
/// previous one, and only the newest generation may write to the sink.
pub struct Uploader {
    extractor: Extractor,
    sink: Arc<dyn ResultSink>,
    state: Mutex<State>,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("extractor", &self.extractor)
            .field("state", &self.state)
            .finish()
    }
}

impl Uploader {
    pub fn new(extractor: Extractor, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            extractor,
            sink,
            state: Mutex::new(State::default()),
        }
    }

    /// Generation of the newest accepted submission (0 before the first).
    pub fn generation(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).generation
    }

    /// Whether a submission is currently running.
    pub fn in_flight(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .in_flight
            .is_some()
    }

    /// Message describing why the newest submission produced no text, if it
    /// failed or was unsupported.
    pub fn last_error(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_error
            .clone()
    }

    /// Submit the selected file, if any.
    ///
    /// Only a missing file is an `Err`; no engine is called and nothing in the
    /// state changes. Every other way a submission can end is reported as a
    /// [`SubmitOutcome`], and the sink is written only for
    /// [`SubmitOutcome::Extracted`].
    pub async fn submit(
        &self,
        file: Option<UploadedFile>,
    ) -> Result<SubmitOutcome, ValidationError> {
        let Some(file) = file else {
            tracing::warn!("submission rejected: no file selected");
            return Err(ValidationError::FileRequired);
        };

        let in_flight = self.begin();
        let generation = in_flight.generation;
        tracing::info!(
            generation,
            file = %file.filename,
            media_type = %file.media_type,
            bytes = file.data.len(),
            "extraction started"
        );

        let result = tokio::select! {
            biased;
            _ = in_flight.cancel.cancelled() => None,
            result = self.extractor.extract(&file) => Some(result),
        };

        match result {
            Some(result) => Ok(self.settle(generation, result)),
            None => {
                tracing::debug!(generation, "extraction cancelled by a newer submission");
                Ok(SubmitOutcome::Superseded { generation })
            }
        }
    }

    /// Accept a new submission: bump the generation and cancel the old one.
    fn begin(&self) -> InFlight<'_> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        state.generation += 1;
        state.last_error = None;
        let cancel = CancellationToken::new();
        state.in_flight = Some(cancel.clone());
        InFlight {
            state: &self.state,
            generation: state.generation,
            cancel,
        }
    }

    /// Apply a finished extraction. The generation check and the sink write
    /// happen under the same lock.
    fn settle(
        &self,
        generation: u64,
        result: Result<Extraction, ExtractError>,
    ) -> SubmitOutcome {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding stale extraction result"
            );
            return SubmitOutcome::Superseded { generation };
        }
        state.in_flight = None;

        match result {
            Ok(Extraction::Text(text)) => {
                let chars = text.chars().count();
                self.sink.set_result(text);
                tracing::info!(generation, chars, "extraction complete");
                SubmitOutcome::Extracted { generation, chars }
            }
            Ok(Extraction::Unsupported { media_type }) => {
                tracing::warn!(generation, media_type = %media_type, "unsupported media type");
                state.last_error = Some(format!("Unsupported file type: {media_type}"));
                SubmitOutcome::Unsupported { media_type }
            }
            Err(err) => {
                tracing::error!(generation, error = %err, "extraction failed");
                state.last_error = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextBuffer;
    use crate::mock::{MockReader, MockRecognition, MockRecognizer};

    fn uploader() -> (Uploader, Arc<TextBuffer>) {
        let extractor = Extractor::new(
            Arc::new(MockRecognizer::new(MockRecognition::Text("x".into()))),
            Arc::new(MockReader::new(vec![])),
        );
        let buffer = Arc::new(TextBuffer::new());
        (Uploader::new(extractor, buffer.clone()), buffer)
    }

    #[test]
    fn stale_generation_never_writes() {
        let (uploader, buffer) = uploader();
        let first = uploader.begin();
        let second = uploader.begin();
        assert!(first.cancel.is_cancelled());

        let outcome = uploader.settle(first.generation, Ok(Extraction::Text("stale".into())));
        assert!(matches!(outcome, SubmitOutcome::Superseded { generation: 1 }));
        assert_eq!(buffer.current(), "");
        assert!(uploader.in_flight());

        let outcome = uploader.settle(second.generation, Ok(Extraction::Text("fresh".into())));
        assert!(matches!(outcome, SubmitOutcome::Extracted { generation: 2, chars: 5 }));
        assert_eq!(buffer.current(), "fresh");
    }

    #[test]
    fn stale_failure_does_not_set_error() {
        let (uploader, _buffer) = uploader();
        let first = uploader.begin();
        let _second = uploader.begin();

        let err = ExtractError::Recognition(crate::EngineError::Recognition("late".into()));
        let outcome = uploader.settle(first.generation, Err(err));
        assert!(matches!(outcome, SubmitOutcome::Superseded { generation: 1 }));
        assert!(uploader.last_error().is_none());
    }

    #[test]
    fn dropping_old_marker_keeps_newer_in_flight() {
        let (uploader, _buffer) = uploader();
        let first = uploader.begin();
        let second = uploader.begin();

        drop(first);
        assert!(uploader.in_flight());
        drop(second);
        assert!(!uploader.in_flight());
    }
}
