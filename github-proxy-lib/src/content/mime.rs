//! Content type resolution: extension table, then content sniffing, then a default.

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";

/// Bytes inspected when deciding whether a payload is text.
const SNIFF_LEN: usize = 8 * 1024;

const EXTENSIONS: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("gif", "image/gif"),
    ("htm", "text/html; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("ico", "image/vnd.microsoft.icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("txt", "text/plain; charset=utf-8"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xml", "text/xml; charset=utf-8"),
    ("zip", "application/zip"),
];

/// Resolve the content type of `name` with payload `bytes`.
pub fn resolve_content_type(name: &str, bytes: &[u8]) -> String {
    by_extension(name)
        .or_else(|| sniff(bytes))
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Look up the extension of `name` in the built-in table, case-insensitively.
pub fn by_extension(name: &str) -> Option<&'static str> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Detect the type from the payload itself.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.is_empty() {
        return None;
    }
    if let Some(kind) = infer::get(bytes) {
        return Some(kind.mime_type());
    }
    looks_like_text(bytes).then_some(TEXT_PLAIN)
}

fn looks_like_text(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // A multi-byte character cut at the sample boundary is still text.
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&sample[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{0c}'))
}
