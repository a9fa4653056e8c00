use axum::response::Html;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Render the upload form with the current result and an optional inline error.
pub fn render_index(result: &str, error: Option<&str>) -> Html<String> {
    let error_block = error
        .map(|msg| format!(r#"<div class="error" id="error">{}</div>"#, escape(msg)))
        .unwrap_or_default();
    let html = INDEX_HTML
        .replace("{{ error }}", &error_block)
        .replace("{{ result }}", &escape(result));
    Html(html)
}

/// HTML-escape user-visible text. Braces are escaped too so substituted text
/// can never form a template placeholder.
fn escape(text: &str) -> String {
    html_escape::encode_text(text)
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}
