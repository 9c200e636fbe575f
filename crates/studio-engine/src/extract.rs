use serde_json::Value;
use studio_contracts::images::{ImageResource, DEFAULT_IMAGE_MIME};

/// Pulls the inline images out of a `generateContent` response.
///
/// Only the first candidate is read. Parts without inline data (text,
/// thoughts, empty payloads) are skipped, and anything that does not look like
/// a response yields an empty list rather than an error.
pub fn extract_images(response: &Value) -> Vec<ImageResource> {
    let parts = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array);
    let Some(parts) = parts else {
        return Vec::new();
    };

    parts
        .iter()
        .filter_map(|part| {
            let inline = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)?;
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .filter(|data| !data.is_empty())?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_IMAGE_MIME);
            Some(ImageResource::from_base64(mime_type, data))
        })
        .collect()
}
