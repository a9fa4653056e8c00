use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagetext_core::Extractor;
use pagetext_core::config_file;
use pagetext_ocr_tesseract::TesseractCli;
use pagetext_pdf_mupdf::MupdfReader;

mod handlers;
mod state;
mod template;
mod upload;

use state::AppState;

fn app(state: Arc<AppState>, body_limit: usize) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(handlers::index::index))
        .route("/extract", axum::routing::post(handlers::extract::extract))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagetext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Resolve configuration: env vars > config file > defaults
    let config = config_file::load_config();
    let language = std::env::var("PAGETEXT_LANG").unwrap_or_else(|_| config.language());
    let tesseract_path = std::env::var("PAGETEXT_TESSERACT")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| config.tesseract_path());
    let bind = std::env::var("PAGETEXT_BIND").unwrap_or_else(|_| config.bind());
    let addr: SocketAddr = bind.parse()?;

    let recognizer = TesseractCli::new(tesseract_path);
    match recognizer.version().await {
        Ok(version) => tracing::info!(%version, "tesseract available"),
        Err(e) => tracing::warn!(
            error = %e,
            "tesseract is not usable; image uploads will fail until it is installed"
        ),
    }

    let extractor =
        Extractor::new(Arc::new(recognizer), Arc::new(MupdfReader::new())).with_language(language);
    let state = Arc::new(AppState::new(extractor));
    let router = app(state, config.max_upload_bytes());

    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
