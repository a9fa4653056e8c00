use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use std::sync::Arc;

use pagetext_core::SubmitOutcome;

use crate::state::AppState;
use crate::template;
use crate::upload;

/// Handle a form submission and re-render the form with the outcome.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let file = match upload::parse_multipart(multipart).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "malformed upload");
            return page(&state, StatusCode::BAD_REQUEST, Some(e));
        }
    };

    match state.uploader.submit(file).await {
        Err(validation) => page(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(validation.to_string()),
        ),
        Ok(SubmitOutcome::Extracted { .. }) => page(&state, StatusCode::OK, None),
        // A newer submission owns the form now; show whatever state it left.
        Ok(SubmitOutcome::Superseded { .. }) => {
            page(&state, StatusCode::OK, state.uploader.last_error())
        }
        Ok(SubmitOutcome::Unsupported { .. }) => page(
            &state,
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            state.uploader.last_error(),
        ),
        Ok(SubmitOutcome::Failed(_)) => page(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            state.uploader.last_error(),
        ),
    }
}

fn page(state: &AppState, status: StatusCode, error: Option<String>) -> (StatusCode, Html<String>) {
    (
        status,
        template::render_index(&state.buffer.current(), error.as_deref()),
    )
}
