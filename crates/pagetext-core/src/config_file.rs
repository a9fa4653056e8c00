use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extractor::DEFAULT_LANGUAGE;

pub const DEFAULT_TESSERACT: &str = "tesseract";
pub const DEFAULT_BIND: &str = "127.0.0.1:5001";
pub const DEFAULT_MAX_UPLOAD_MB: u32 = 50;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ocr: Option<OcrConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    pub language: Option<String>,
    pub tesseract_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub max_upload_mb: Option<u32>,
}

impl ConfigFile {
    pub fn language(&self) -> String {
        self.ocr
            .as_ref()
            .and_then(|o| o.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    pub fn tesseract_path(&self) -> PathBuf {
        self.ocr
            .as_ref()
            .and_then(|o| o.tesseract_path.clone())
            .unwrap_or_else(|| DEFAULT_TESSERACT.to_string())
            .into()
    }

    pub fn bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn max_upload_bytes(&self) -> usize {
        let mb = self
            .server
            .as_ref()
            .and_then(|s| s.max_upload_mb)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);
        mb as usize * 1024 * 1024
    }
}

/// Platform config directory path: `<config_dir>/pagetext/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pagetext").join("config.toml"))
}

/// Load config by cascading CWD `.pagetext.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pagetext.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_ocr = base.ocr.unwrap_or_default();
    let overlay_ocr = overlay.ocr.unwrap_or_default();
    let base_server = base.server.unwrap_or_default();
    let overlay_server = overlay.server.unwrap_or_default();

    ConfigFile {
        ocr: Some(OcrConfig {
            language: overlay_ocr.language.or(base_ocr.language),
            tesseract_path: overlay_ocr.tesseract_path.or(base_ocr.tesseract_path),
        }),
        server: Some(ServerConfig {
            bind: overlay_server.bind.or(base_server.bind),
            max_upload_mb: overlay_server.max_upload_mb.or(base_server.max_upload_mb),
        }),
    }
}
