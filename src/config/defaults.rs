//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "site".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5980
    }
}

// ============================================================================
// [i18n] Section Defaults
// ============================================================================

pub mod i18n {
    pub fn source() -> String {
        "en".into()
    }

    pub fn primary() -> String {
        "zh_cn".into()
    }

    pub fn variant() -> Option<String> {
        None
    }

    pub fn languages() -> Vec<String> {
        vec![source(), primary()]
    }

    pub mod backends {
        pub fn machine() -> Vec<String> {
            Vec::new()
        }

        pub fn convert() -> Option<String> {
            None
        }

        pub fn converter() -> String {
            "Traditional".into()
        }
    }
}
