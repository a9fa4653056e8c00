use std::io::Write;

use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the one-line summary after a successful extraction.
pub fn print_summary(
    w: &mut dyn Write,
    file_name: &str,
    media_type: &str,
    chars: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({}, {} characters)",
            "Extracted".bold().green(),
            file_name.bold(),
            media_type.dimmed(),
            chars
        )
    } else {
        writeln!(w, "Extracted {} ({}, {} characters)", file_name, media_type, chars)
    }
}

/// Print a problem that ended the extraction without text.
pub fn print_problem(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "error:".bold().red(), message)
    } else {
        writeln!(w, "error: {}", message)
    }
}

/// Print one engine status line for `pagetext engines`.
pub fn print_engine(
    w: &mut dyn Write,
    name: &str,
    status: Result<&str, &str>,
    color: ColorMode,
) -> std::io::Result<()> {
    match (status, color.enabled()) {
        (Ok(detail), true) => writeln!(w, "{:<10} {} {}", name, "ok".green(), detail.dimmed()),
        (Ok(detail), false) => writeln!(w, "{:<10} ok {}", name, detail),
        (Err(reason), true) => writeln!(w, "{:<10} {} {}", name, "missing".red(), reason),
        (Err(reason), false) => writeln!(w, "{:<10} missing {}", name, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_summary() {
        let out = render(|w| print_summary(w, "doc.pdf", "application/pdf", 14, ColorMode(false)));
        assert_eq!(out, "Extracted doc.pdf (application/pdf, 14 characters)\n");
    }

    #[test]
    fn plain_problem() {
        let out = render(|w| {
            print_problem(w, "Unsupported file type: text/plain", ColorMode(false))
        });
        assert_eq!(out, "error: Unsupported file type: text/plain\n");
    }

    #[test]
    fn colored_output_carries_escape_codes() {
        let out = render(|w| print_problem(w, "boom", ColorMode(true)));
        assert!(out.contains("\u{1b}["));
        assert!(out.ends_with("boom\n"));
    }

    #[test]
    fn engine_lines_are_aligned() {
        let out = render(|w| print_engine(w, "mupdf", Ok("built in"), ColorMode(false)));
        assert_eq!(out, "mupdf      ok built in\n");
        let out = render(|w| print_engine(w, "tesseract", Err("not found"), ColorMode(false)));
        assert_eq!(out, "tesseract  missing not found\n");
    }
}
