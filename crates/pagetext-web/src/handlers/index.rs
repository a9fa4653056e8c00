use axum::extract::State;
use axum::response::Html;
use std::sync::Arc;

use crate::state::AppState;
use crate::template;

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let error = state.uploader.last_error();
    template::render_index(&state.buffer.current(), error.as_deref())
}
