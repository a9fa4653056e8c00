use mupdf::{Document, TextPageFlags};

use pagetext_core::{
    BoxFuture, DocumentPage, DocumentReader, EngineError, PagedDocument, TextFragment,
};

/// MuPDF-based implementation of [`DocumentReader`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that the core and the other surfaces do not transitively depend on it.
///
/// MuPDF handles are not shared across threads, so `open` reads every page
/// inside one blocking task and hands back an in-memory document. A page that
/// fails to load is remembered and reported when that page is fetched.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfReader;

impl MupdfReader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for MupdfReader {
    fn name(&self) -> &str {
        "mupdf"
    }

    fn open<'a>(
        &'a self,
        data: &'a [u8],
    ) -> BoxFuture<'a, Result<Box<dyn PagedDocument>, EngineError>> {
        let data = data.to_vec();
        Box::pin(async move {
            let pages = tokio::task::spawn_blocking(move || read_pages(&data))
                .await
                .map_err(|e| EngineError::Unavailable(format!("mupdf task failed: {e}")))??;
            let document: Box<dyn PagedDocument> = Box::new(LoadedDocument { pages });
            Ok(document)
        })
    }
}

type PageResult = Result<Vec<TextFragment>, String>;

/// Open `data` as a PDF and collect the text lines of every page.
fn read_pages(data: &[u8]) -> Result<Vec<PageResult>, EngineError> {
    let document = Document::from_bytes(data, "application/pdf")
        .map_err(|e| EngineError::Open(e.to_string()))?;
    let count = document
        .page_count()
        .map_err(|e| EngineError::Open(e.to_string()))?;

    let mut pages = Vec::with_capacity(count.max(0) as usize);
    for index in 0..count {
        let page = read_page(&document, index);
        if let Err(e) = &page {
            tracing::warn!(page = index + 1, error = %e, "failed to read page");
        }
        pages.push(page);
    }
    Ok(pages)
}

/// One fragment per text line, in MuPDF's block/line order.
fn read_page(document: &Document, index: i32) -> PageResult {
    let page = document.load_page(index).map_err(|e| e.to_string())?;
    let text_page = page
        .to_text_page(TextPageFlags::empty())
        .map_err(|e| e.to_string())?;

    let mut fragments = Vec::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let text: String = line
                .chars()
                .map(|c| c.char().unwrap_or('\u{FFFD}'))
                .collect();
            fragments.push(TextFragment { text });
        }
    }
    Ok(fragments)
}

struct LoadedDocument {
    pages: Vec<PageResult>,
}

impl PagedDocument for LoadedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page<'a>(
        &'a self,
        number: usize,
    ) -> BoxFuture<'a, Result<Box<dyn DocumentPage + 'a>, EngineError>> {
        let result = match number.checked_sub(1).and_then(|i| self.pages.get(i)) {
            Some(Ok(fragments)) => {
                let page: Box<dyn DocumentPage + 'a> = Box::new(LoadedPage { fragments });
                Ok(page)
            }
            Some(Err(e)) => Err(EngineError::Page(e.clone())),
            None => Err(EngineError::Page(format!(
                "page {number} out of range (1..={})",
                self.pages.len()
            ))),
        };
        Box::pin(async move { result })
    }
}

struct LoadedPage<'a> {
    fragments: &'a [TextFragment],
}

impl DocumentPage for LoadedPage<'_> {
    fn text_fragments<'b>(&'b self) -> BoxFuture<'b, Result<Vec<TextFragment>, EngineError>> {
        let fragments = self.fragments.to_vec();
        Box::pin(async move { Ok(fragments) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small uncompressed PDF, one content stream per page, each
    /// inner slice drawn as separate lines.
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let mut objects: Vec<String> = Vec::new();
        let page_count = pages.len();
        // 1: catalog, 2: pages, 3: font, then (page, content) pairs.
        let kids: Vec<String> = (0..page_count)
            .map(|i| format!("{} 0 R", 4 + i * 2))
            .collect();
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        ));
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
        for (i, lines) in pages.iter().enumerate() {
            let content_id = 5 + i * 2;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            ));
            let mut stream = String::from("BT /F1 24 Tf 72 700 Td");
            for (n, line) in lines.iter().enumerate() {
                if n > 0 {
                    stream.push_str(" 0 -60 Td");
                }
                stream.push_str(&format!(" ({line}) Tj"));
            }
            stream.push_str(" ET");
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }
        let xref_at = out.len();
        out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            out.push_str(&format!("{offset:010} 00000 n \n"));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        ));
        out.into_bytes()
    }

    #[tokio::test]
    async fn reads_lines_as_fragments_per_page() {
        let pages: [&[&str]; 2] = [&["Hello", "World"], &["Foo"]];
        let pdf = build_pdf(&pages);
        let reader = MupdfReader::new();
        let document = reader.open(&pdf).await.unwrap();
        assert_eq!(document.page_count(), 2);

        let page = document.page(1).await.unwrap();
        let first: Vec<String> = page
            .text_fragments()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.text.trim().to_string())
            .collect();
        assert_eq!(first, vec!["Hello", "World"]);

        let page = document.page(2).await.unwrap();
        let second = page.text_fragments().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text.trim(), "Foo");
    }

    #[tokio::test]
    async fn out_of_range_page_is_page_error() {
        let pages: [&[&str]; 1] = [&["only"]];
        let pdf = build_pdf(&pages);
        let document = MupdfReader::new().open(&pdf).await.unwrap();
        assert!(matches!(document.page(0).await, Err(EngineError::Page(_))));
        assert!(matches!(document.page(2).await, Err(EngineError::Page(_))));
    }

    #[tokio::test]
    async fn garbage_is_open_error() {
        let result = MupdfReader::new().open(b"definitely not a pdf").await;
        assert!(matches!(result, Err(EngineError::Open(_))));
    }
}
