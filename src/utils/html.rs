//! Minimal HTML entity encoding and decoding.
//!
//! Only the entities that matter for translatable text spans are handled:
//! decoding recovers the source text stored inside a wrapped marker, and
//! encoding protects rendered output from injection through translated
//! content.

/// Decode the entities commonly produced by in-browser editing.
pub fn decode_html(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Encode text for safe substitution into an HTML document.
///
/// `&` must be encoded first so already-encoded entities are not mangled.
pub fn encode_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_html() {
        assert_eq!(encode_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(encode_html("plain text"), "plain text");
    }

    #[test]
    fn test_decode_html() {
        assert_eq!(decode_html("a &lt; b &amp; c &gt; d"), "a < b & c > d");
        assert_eq!(decode_html("non&nbsp;breaking"), "non breaking");
    }

    #[test]
    fn test_encode_orders_ampersand_first() {
        // "&lt;" must become "&amp;lt;", not stay as an entity
        assert_eq!(encode_html("&lt;"), "&amp;lt;");
    }
}
