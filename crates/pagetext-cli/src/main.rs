use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use pagetext_core::config_file::{self, ConfigFile};
use pagetext_core::{Extractor, SubmitOutcome, TextBuffer, UploadedFile, Uploader, media};
use pagetext_ocr_tesseract::TesseractCli;
use pagetext_pdf_mupdf::MupdfReader;

mod output;

use output::ColorMode;

/// pagetext - extract the text of an image (OCR) or a PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of an image or PDF file
    Extract {
        /// Path to the image or PDF
        file_path: PathBuf,

        /// Declared media type (default: sniffed from content, then extension)
        #[arg(long)]
        media_type: Option<String>,

        /// OCR language hint passed to tesseract
        #[arg(long)]
        lang: Option<String>,

        /// Path to the tesseract binary
        #[arg(long)]
        tesseract: Option<PathBuf>,

        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show whether the extraction engines are usable
    Engines {
        /// Path to the tesseract binary
        #[arg(long)]
        tesseract: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagetext=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_file::load_config();

    match cli.command {
        Command::Extract {
            file_path,
            media_type,
            lang,
            tesseract,
            output,
            no_color,
        } => {
            let extracted = extract(
                &config, file_path, media_type, lang, tesseract, output, no_color,
            )
            .await?;
            Ok(if extracted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Engines {
            tesseract,
            no_color,
        } => engines(&config, tesseract, no_color).await.map(|()| ExitCode::SUCCESS),
    }
}

/// CLI flag > env var > config file > default.
fn resolve_tesseract(config: &ConfigFile, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("PAGETEXT_TESSERACT").ok().map(PathBuf::from))
        .unwrap_or_else(|| config.tesseract_path())
}

fn resolve_language(config: &ConfigFile, flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("PAGETEXT_LANG").ok())
        .unwrap_or_else(|| config.language())
}

/// Declared type if given, otherwise sniffed. An unknown file gets
/// `application/octet-stream`, which the dispatcher reports as unsupported.
fn resolve_media_type(declared: Option<String>, path: &Path, data: &[u8]) -> String {
    declared.unwrap_or_else(|| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        media::sniff(&name, data)
            .unwrap_or("application/octet-stream")
            .to_string()
    })
}

/// Returns whether text was written. A file that yields no text is reported
/// once on stderr and is not an `Err`.
#[allow(clippy::too_many_arguments)]
async fn extract(
    config: &ConfigFile,
    file_path: PathBuf,
    media_type: Option<String>,
    lang: Option<String>,
    tesseract: Option<PathBuf>,
    output: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<bool> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let color = ColorMode(!no_color);
    let data = tokio::fs::read(&file_path).await?;
    let media_type = resolve_media_type(media_type, &file_path, &data);
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let recognizer = TesseractCli::new(resolve_tesseract(config, tesseract));
    let extractor = Extractor::new(Arc::new(recognizer), Arc::new(MupdfReader::new()))
        .with_language(resolve_language(config, lang));
    let buffer = Arc::new(TextBuffer::new());
    let uploader = Uploader::new(extractor, buffer.clone());

    let file = UploadedFile::new(file_name.clone(), media_type.clone(), data);
    let mut stderr = std::io::stderr();

    let problem = match uploader.submit(Some(file)).await? {
        SubmitOutcome::Extracted { chars, .. } => {
            let text = buffer.current();
            if let Some(path) = output {
                std::fs::write(&path, &text)?;
            } else {
                let mut stdout = std::io::stdout();
                stdout.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    writeln!(stdout)?;
                }
            }
            tracing::info!(file = %file_name, media_type = %media_type, chars, "text written");
            output::print_summary(&mut stderr, &file_name, &media_type, chars, color)?;
            return Ok(true);
        }
        SubmitOutcome::Unsupported { media_type } => {
            format!("Unsupported file type: {media_type}")
        }
        SubmitOutcome::Failed(err) => err.to_string(),
        SubmitOutcome::Superseded { generation } => {
            format!("submission {generation} was superseded")
        }
    };

    tracing::debug!(file = %file_name, problem = %problem, "no text extracted");
    output::print_problem(&mut stderr, &problem, color)?;
    Ok(false)
}

async fn engines(
    config: &ConfigFile,
    tesseract: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color);
    let mut stdout = std::io::stdout();

    let recognizer = TesseractCli::new(resolve_tesseract(config, tesseract));
    match recognizer.version().await {
        Ok(version) => output::print_engine(&mut stdout, "tesseract", Ok(&version), color)?,
        Err(e) => output::print_engine(&mut stdout, "tesseract", Err(&e.to_string()), color)?,
    }
    output::print_engine(&mut stdout, "mupdf", Ok("built in"), color)?;
    Ok(())
}
