use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use pagetext_core::{BoxFuture, EngineError, ImageRecognizer, Recognized};

/// [`ImageRecognizer`] that shells out to the `tesseract` binary.
///
/// The image is written to a private temp directory and recognized with
/// `tesseract <image> stdout -l <language>`. Dropping the recognition future
/// kills the child process.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// First line of `tesseract --version`, or why it could not be run.
    pub async fn version(&self) -> Result<String, EngineError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        // Older releases print the version banner on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    fn args(input: &Path, language: &str) -> Vec<OsString> {
        vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            language.into(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == ErrorKind::NotFound {
            EngineError::Unavailable(format!("{} not found", self.binary.display()))
        } else {
            EngineError::Unavailable(format!("failed to run {}: {e}", self.binary.display()))
        }
    }

    async fn run(&self, data: &[u8], language: &str) -> Result<Recognized, EngineError> {
        let dir = tempfile::Builder::new()
            .prefix("pagetext-ocr-")
            .tempdir()
            .map_err(|e| EngineError::Unavailable(format!("failed to create temp dir: {e}")))?;
        let input = dir.path().join("input");
        tokio::fs::write(&input, data)
            .await
            .map_err(|e| EngineError::Unavailable(format!("failed to write temp image: {e}")))?;

        let output = Command::new(&self.binary)
            .args(Self::args(&input, language))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // tesseract ends each page with a form feed.
        let text = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches('\u{c}')
            .to_string();
        tracing::debug!(language, chars = text.chars().count(), "tesseract finished");
        Ok(Recognized { text })
    }
}

impl ImageRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize<'a>(
        &'a self,
        data: &'a [u8],
        language: &'a str,
    ) -> BoxFuture<'a, Result<Recognized, EngineError>> {
        Box::pin(self.run(data, language))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn args_put_output_on_stdout_with_language() {
        let args = TesseractCli::args(Path::new("/tmp/x/input"), "eng+deu");
        assert_eq!(args, vec!["/tmp/x/input", "stdout", "-l", "eng+deu"]);
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let tess = TesseractCli::new("/nonexistent/pagetext/tesseract");
        let err = tess.recognize(b"\x89PNG", "eng").await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)), "{err:?}");

        let err = tess.version().await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)), "{err:?}");
    }

    /// Write an executable shell script standing in for tesseract.
    #[cfg(unix)]
    fn fake_tesseract(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned_without_trailing_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_tesseract(dir.path(), r#"printf 'lang=%s\n\f' "$4""#);

        let recognized = TesseractCli::new(bin).recognize(b"img", "deu").await.unwrap();
        assert_eq!(recognized.text, "lang=deu\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_recognition_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_tesseract(dir.path(), "echo 'bad image' >&2; exit 1");

        let err = TesseractCli::new(bin).recognize(b"img", "eng").await.unwrap_err();
        match err {
            EngineError::Recognition(msg) => assert!(msg.contains("bad image"), "{msg}"),
            other => panic!("expected Recognition, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dropped_recognition_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let bin = fake_tesseract(dir.path(), &format!("sleep 2\ntouch '{}'", marker.display()));
        let tess = TesseractCli::new(bin);

        let result =
            tokio::time::timeout(Duration::from_millis(300), tess.recognize(b"img", "eng")).await;
        assert!(result.is_err(), "recognition should still be running");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "tesseract ran to completion after being dropped");
    }
}
