//! Media-type routing and sniffing.

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const IMAGE_PREFIX: &str = "image/";

/// Extraction path selected for a declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Image,
    Pdf,
    Unsupported,
}

/// Pick the extraction path for a declared media type.
///
/// Matching is exact: any `image/*` goes to OCR, only `application/pdf` goes
/// to the document reader. No case folding or parameter stripping is done.
pub fn route(media_type: &str) -> Route {
    if media_type.starts_with(IMAGE_PREFIX) {
        Route::Image
    } else if media_type == PDF_MEDIA_TYPE {
        Route::Pdf
    } else {
        Route::Unsupported
    }
}

/// Guess a media type from magic bytes, falling back to the file extension.
///
/// Used by surfaces that do not receive a declared type (the CLI).
pub fn sniff(filename: &str, data: &[u8]) -> Option<&'static str> {
    from_magic(data).or_else(|| from_extension(filename))
}

fn from_magic(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"%PDF-") {
        return Some(PDF_MEDIA_TYPE);
    }
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if data.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if is_bmp(data) {
        return Some("image/bmp");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("image/tiff");
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

/// `BM` alone matches too much plain text; also require a known DIB header
/// size at offset 14.
fn is_bmp(data: &[u8]) -> bool {
    if data.len() < 18 || !data.starts_with(b"BM") {
        return false;
    }
    let dib_size = u32::from_le_bytes([data[14], data[15], data[16], data[17]]);
    matches!(dib_size, 12 | 40 | 52 | 56 | 64 | 108 | 124)
}

fn from_extension(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext)?;
    match ext {
        "pdf" => Some(PDF_MEDIA_TYPE),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "webp" => Some("image/webp"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_prefix_routes_to_ocr() {
        assert_eq!(route("image/png"), Route::Image);
        assert_eq!(route("image/jpeg"), Route::Image);
        assert_eq!(route("image/"), Route::Image);
    }

    #[test]
    fn only_exact_pdf_routes_to_reader() {
        assert_eq!(route("application/pdf"), Route::Pdf);
        assert_eq!(route("application/pdf; charset=binary"), Route::Unsupported);
        assert_eq!(route("Application/PDF"), Route::Unsupported);
    }

    #[test]
    fn everything_else_is_unsupported() {
        assert_eq!(route("text/plain"), Route::Unsupported);
        assert_eq!(route(""), Route::Unsupported);
        assert_eq!(route("IMAGE/PNG"), Route::Unsupported);
    }

    #[test]
    fn magic_bytes_win_over_extension() {
        assert_eq!(sniff("scan.png", b"%PDF-1.7\n"), Some("application/pdf"));
        assert_eq!(
            sniff("notes.pdf", b"\x89PNG\r\n\x1a\n\0\0"),
            Some("image/png")
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(sniff("photo.JPG", b"????"), Some("image/jpeg"));
        assert_eq!(sniff("readme.txt", b"hello"), Some("text/plain"));
        assert_eq!(sniff("noext", b"hello"), None);
    }

    #[test]
    fn bmp_needs_dib_header() {
        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&[0; 12]);
        bmp.extend_from_slice(&40u32.to_le_bytes());
        assert_eq!(sniff("scan", &bmp), Some("image/bmp"));

        assert_eq!(sniff("BMW.txt", b"BMW owners club newsletter"), Some("text/plain"));
        assert_eq!(sniff("BM", b"BM"), None);
    }

    #[test]
    fn webp_needs_full_riff_header() {
        assert_eq!(sniff("x", b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff("x", b"RIFF\0\0\0\0WAVE"), None);
    }
}
