//! SVG markup helpers.

use regex::bytes::Regex;
use std::sync::OnceLock;

const BOM: &[u8] = b"\xEF\xBB\xBF";

fn svg_root() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Optional XML prolog, comments and doctype before the root element
        Regex::new(r"(?s-u)^(?:<\?xml[^>]*\?>\s*)?(?:<!--.*?-->\s*)*(?:<!DOCTYPE[^>]*>\s*)?<svg[\s>/]")
            .expect("valid regex")
    })
}

/// Validate and tidy SVG markup.
///
/// Strips a byte order mark and surrounding whitespace. The remaining bytes are
/// returned untouched, whatever their declared encoding. Returns `None` when the
/// data is not an SVG document.
pub fn normalize(markup: &[u8]) -> Option<Vec<u8>> {
    let trimmed = markup.strip_prefix(BOM).unwrap_or(markup).trim_ascii();
    if svg_root().is_match(trimmed) && trimmed.ends_with(b">") {
        Some(trimmed.to_vec())
    } else {
        None
    }
}

/// Wrap an IconifyJSON icon body in a standalone `<svg>` element
pub fn from_iconify_body(body: &str, left: f64, top: f64, width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1em\" height=\"1em\" viewBox=\"{left} {top} {width} {height}\">{body}</svg>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepts_svg() {
        let svg = "\u{feff}  <svg viewBox=\"0 0 24 24\"><path d=\"M0 0\"/></svg>\n";
        assert_eq!(
            normalize(svg.as_bytes()).as_deref(),
            Some(&b"<svg viewBox=\"0 0 24 24\"><path d=\"M0 0\"/></svg>"[..])
        );
    }

    #[test]
    fn test_normalize_accepts_prolog() {
        let svg = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- icon -->\n<svg/>";
        assert!(normalize(svg.as_bytes()).is_some());
    }

    #[test]
    fn test_normalize_keeps_non_utf8_bytes() {
        let mut svg = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<svg><title>caf".to_vec();
        svg.push(0xE9);
        svg.extend_from_slice(b"</title></svg>\n");

        let normalized = normalize(&svg).unwrap();
        assert_eq!(normalized, svg[..svg.len() - 1]);
    }

    #[test]
    fn test_normalize_rejects_non_svg() {
        assert!(normalize(b"<html><body/></html>").is_none());
        assert!(normalize(b"{\"error\": 404}").is_none());
        assert!(normalize(b"<svgfoo/>").is_none());
        assert!(normalize(b"").is_none());
    }

    #[test]
    fn test_from_iconify_body() {
        let svg = from_iconify_body("<path d=\"M1 1\"/>", 0.0, 0.0, 24.0, 24.0);
        assert_eq!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1em\" height=\"1em\" viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></svg>"
        );
        assert!(normalize(svg.as_bytes()).is_some());
    }
}
