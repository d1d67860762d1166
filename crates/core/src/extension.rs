use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Preferred extension for common types. `mime_guess` returns every known
/// extension in table order, which is not the conventional one for many types.
const CANONICAL_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tiff"),
    ("image/svg+xml", ".svg"),
    ("image/heic", ".heic"),
    ("image/heif", ".heif"),
    ("image/avif", ".avif"),
    ("image/x-icon", ".ico"),
    ("video/mp4", ".mp4"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
    ("video/x-matroska", ".mkv"),
    ("video/mpeg", ".mpg"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("audio/ogg", ".ogg"),
    ("audio/flac", ".flac"),
    ("text/plain", ".txt"),
    ("text/html", ".html"),
    ("text/css", ".css"),
    ("text/csv", ".csv"),
    ("text/markdown", ".md"),
    ("text/javascript", ".js"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("text/xml", ".xml"),
    ("application/pdf", ".pdf"),
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("application/x-tar", ".tar"),
    ("application/x-7z-compressed", ".7z"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/vnd.ms-excel", ".xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
    ("application/rtf", ".rtf"),
    ("application/octet-stream", ".bin"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "extension", rename_all = "snake_case")]
pub enum ExtensionOutcome {
    /// The name already had a `.`; nothing was appended.
    Present,
    Inferred(String),
    /// The MIME type is unknown. Advisory only: the name goes on without an
    /// extension.
    Unknown,
}

impl ExtensionOutcome {
    pub fn was_inferred(&self) -> bool {
        matches!(self, ExtensionOutcome::Inferred(_))
    }

    pub fn is_advisory(&self) -> bool {
        matches!(self, ExtensionOutcome::Unknown)
    }
}

pub fn ensure_extension(name: &str, mime_type: &str) -> (String, ExtensionOutcome) {
    if name.contains('.') {
        return (name.to_string(), ExtensionOutcome::Present);
    }

    match extension_for_mime(mime_type) {
        Some(ext) => {
            debug!(name, mime_type, extension = %ext, "inferred extension");
            (format!("{name}{ext}"), ExtensionOutcome::Inferred(ext))
        }
        None => {
            warn!(name, mime_type, "could not infer an extension from MIME type");
            (name.to_string(), ExtensionOutcome::Unknown)
        }
    }
}

/// Looks up the extension (with its leading `.`) for a MIME type. Parameters
/// such as `; charset=utf-8` are ignored.
pub fn extension_for_mime(mime_type: &str) -> Option<String> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return None;
    }

    if let Some((_, ext)) = CANONICAL_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
    {
        return Some((*ext).to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{ext}"))
}
