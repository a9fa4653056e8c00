use axum::extract::Multipart;

use pagetext_core::UploadedFile;

/// Read the `file` field of the upload form.
///
/// Browsers submit an empty part (no filename, no bytes) when nothing was
/// selected; that is reported as `None`. Unknown fields are drained and
/// otherwise ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<Option<UploadedFile>, String> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let media_type = field.content_type().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();

                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                file = Some(UploadedFile {
                    filename,
                    media_type,
                    data,
                });
            }
            _ => {
                field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read form field {}: {}", name, e))?;
            }
        }
    }

    Ok(file)
}
