//! Writing-script classification by character code ranges.
//!
//! Used by the translation orchestrator to detect when the authoritative
//! "en" slot of a dictionary entry does not actually hold Latin-script
//! text (e.g. an editor typed Chinese straight into the source page), so
//! English can be backfilled by reverse translation.

/// Writing script of a text span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Latin letters, digits, punctuation (the default bucket).
    Latin,
    /// CJK ideographs, kana, hangul.
    Cjk,
    /// Arabic letters.
    Arabic,
}

/// Classify a text span by the first non-Latin character found.
///
/// Text with no CJK or Arabic characters classifies as `Latin`.
pub fn detect_script(text: &str) -> Script {
    for c in text.chars() {
        let code = c as u32;
        match code {
            // CJK unified ideographs + extension A
            0x4E00..=0x9FFF | 0x3400..=0x4DBF
            // Hiragana, katakana
            | 0x3040..=0x30FF
            // Hangul syllables
            | 0xAC00..=0xD7AF
            // CJK punctuation, fullwidth forms
            | 0x3000..=0x303F | 0xFF00..=0xFFEF => return Script::Cjk,
            // Arabic + Arabic supplement
            0x0600..=0x06FF | 0x0750..=0x077F => return Script::Arabic,
            _ => {}
        }
    }
    Script::Latin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_latin() {
        assert_eq!(detect_script("Happy Customer."), Script::Latin);
        assert_eq!(detect_script(""), Script::Latin);
        assert_eq!(detect_script("café 123"), Script::Latin);
    }

    #[test]
    fn test_detect_cjk() {
        assert_eq!(detect_script("聯絡我們"), Script::Cjk);
        assert_eq!(detect_script("こんにちは"), Script::Cjk);
        // Mixed text with any CJK character counts as CJK
        assert_eq!(detect_script("hello 世界"), Script::Cjk);
    }

    #[test]
    fn test_detect_arabic() {
        assert_eq!(detect_script("مرحبا"), Script::Arabic);
    }
}
