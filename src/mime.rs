//! MIME type tables for Drive uploads and exports.
//!
//! Names are first matched against a curated extension table that maps onto
//! Drive's native types, then against `mime_guess`, then default to
//! [`types::FILE`]. A second table picks the export format used when a native
//! document is downloaded.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Drive-native MIME types.
pub mod types {
    pub const AUDIO: &str = "application/vnd.google-apps.audio";
    pub const DOCUMENT: &str = "application/vnd.google-apps.document";
    pub const DRAWING: &str = "application/vnd.google-apps.drawing";
    pub const FILE: &str = "application/vnd.google-apps.file";
    pub const FOLDER: &str = "application/vnd.google-apps.folder";
    pub const FORM: &str = "application/vnd.google-apps.form";
    pub const FUSION_TABLE: &str = "application/vnd.google-apps.fusiontable";
    pub const MAP: &str = "application/vnd.google-apps.map";
    pub const PHOTO: &str = "application/vnd.google-apps.photo";
    pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";
    pub const SCRIPT: &str = "application/vnd.google-apps.script";
    pub const SITES: &str = "application/vnd.google-apps.sites";
    pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
    pub const UNKNOWN: &str = "application/vnd.google-apps.unknown";
    pub const VIDEO: &str = "application/vnd.google-apps.video";

    pub(crate) const NATIVE_PREFIX: &str = "application/vnd.google-apps.";
}

/// Formats a native document can be exported to.
pub mod export {
    // Documents
    pub const HTML: &str = "text/html";
    pub const RICH_TEXT: &str = "text/rtf";
    pub const OPEN_OFFICE_DOC: &str = "application/vnd.oasis.opendocument.text";
    pub const WORD_DOC: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    // Spreadsheets
    pub const CSV: &str = "text/csv";
    pub const EXCEL: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const OPEN_OFFICE_SHEET: &str = "application/x-vnd.oasis.opendocument.spreadsheet";

    // Drawings
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const SVG: &str = "image/svg+xml";

    pub const POWER_POINT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";

    pub const SCRIPT_JSON: &str = "application/vnd.google-apps.script+json";

    // Everything but scripts
    pub const PDF: &str = "application/pdf";

    // Everything but scripts and sheets
    pub const PLAIN_TEXT: &str = "text/plain";
}

static EXTENSION_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: [(&str, &[&str]); 6] = [
        (types::AUDIO, &["mp3", "wav", "aac", "ogg", "wma"]),
        (types::DOCUMENT, &["txt", "doc", "docx", "log", "odt", "rtf"]),
        (types::FOLDER, &[""]),
        (types::PRESENTATION, &["ppt", "pptx"]),
        (types::SPREADSHEET, &["csv", "xls", "xlsx", "xlt", "xml", "ods"]),
        (types::VIDEO, &["flv", "mp4", "mpg", "mov", "mkv", "avi"]),
    ];

    groups
        .iter()
        .flat_map(|(mime, exts)| exts.iter().map(move |ext| (*ext, *mime)))
        .collect()
});

static DOWNLOAD_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (types::DOCUMENT, export::WORD_DOC),
        (types::SPREADSHEET, export::EXCEL),
        (types::DRAWING, export::PDF),
        (types::PRESENTATION, export::POWER_POINT),
        (types::SCRIPT, export::SCRIPT_JSON),
    ])
});

/// Lower-cased text after the last `.` of the final path component.
///
/// Returns an empty string when the name has no dot.
pub fn extension_of(name: &str) -> String {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Guess the MIME type to create `name` with.
pub fn guess_type(name: &str) -> &'static str {
    type_for_extension(&extension_of(name))
}

/// Resolve a bare extension (`"mp4"` or `".mp4"`) to a MIME type.
pub fn type_for_extension(ext: &str) -> &'static str {
    let ext = ext.trim_start_matches('.').to_lowercase();

    if let Some(mime) = EXTENSION_TYPES.get(ext.as_str()) {
        return *mime;
    }

    mime_guess::from_ext(&ext).first_raw().unwrap_or(types::FILE)
}

/// Export format used when downloading an entity of type `mime_type`.
pub fn download_type(mime_type: &str) -> &'static str {
    DOWNLOAD_TYPES
        .get(mime_type)
        .copied()
        .unwrap_or(export::PLAIN_TEXT)
}

/// Whether `mime_type` is one of Drive's own document types, which can only be
/// exported, not downloaded as-is.
pub fn is_native(mime_type: &str) -> bool {
    mime_type.starts_with(types::NATIVE_PREFIX)
}

/// Content type to declare for uploaded bytes.
///
/// Uploading into a native type is a conversion, so the bytes are described
/// by the type their own name implies rather than by `target`.
pub fn media_type<'a>(name: &str, target: &'a str) -> &'a str {
    if is_native(target) {
        mime_guess::from_path(name)
            .first_raw()
            .unwrap_or("application/octet-stream")
    } else {
        target
    }
}
