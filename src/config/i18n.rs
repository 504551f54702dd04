//! `[i18n]` section configuration.
//!
//! Declares the language set and the external translation backends. The
//! `source` language is the authoritative one stored in page markup; the
//! `primary` target is filled first, an optional script `variant` (e.g.
//! Traditional Chinese next to Simplified) can be derived either by
//! direct machine translation or through a script-conversion service.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[i18n]` section in lingon.toml.
///
/// # Example
/// ```toml
/// [i18n]
/// enable = true
/// source = "en"
/// primary = "zh_cn"
/// variant = "zh_hk"
/// languages = ["en", "zh_cn", "zh_hk"]
///
/// [i18n.backends]
/// machine = ["http://localhost:1188/translate"]
/// convert = "https://api.zhconvert.org/convert"
/// converter = "Traditional"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct I18nConfig {
    /// Master switch for translation substitution and the orchestrator.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Authoritative language of the page markup.
    #[serde(default = "defaults::i18n::source")]
    #[educe(Default = defaults::i18n::source())]
    pub source: String,

    /// First target language, filled with machine-backend fallback.
    #[serde(default = "defaults::i18n::primary")]
    #[educe(Default = defaults::i18n::primary())]
    pub primary: String,

    /// Script-variant language derived from `primary` when direct
    /// machine translation fails.
    #[serde(default = "defaults::i18n::variant")]
    #[educe(Default = defaults::i18n::variant())]
    pub variant: Option<String>,

    /// Full language set each dictionary entry carries a slot for.
    #[serde(default = "defaults::i18n::languages")]
    #[educe(Default = defaults::i18n::languages())]
    pub languages: Vec<String>,

    /// External translation services.
    #[serde(default)]
    pub backends: BackendsConfig,
}

/// `[i18n.backends]` - endpoints of the external translation services.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    /// Machine translation endpoints, tried in order (ordered fallback
    /// chain). DeepLX/EasyNMT-style JSON contract.
    #[serde(default = "defaults::i18n::backends::machine")]
    #[educe(Default = defaults::i18n::backends::machine())]
    pub machine: Vec<String>,

    /// Script-conversion endpoint (zhconvert-style), used to derive the
    /// variant language from the primary one.
    #[serde(default = "defaults::i18n::backends::convert")]
    #[educe(Default = defaults::i18n::backends::convert())]
    pub convert: Option<String>,

    /// Converter name passed to the conversion endpoint.
    #[serde(default = "defaults::i18n::backends::converter")]
    #[educe(Default = defaults::i18n::backends::converter())]
    pub converter: String,
}

impl I18nConfig {
    /// Languages other than source, primary and variant, filled by
    /// direct machine translation from the source text.
    pub fn extra_languages(&self) -> impl Iterator<Item = &String> {
        self.languages.iter().filter(|lang| {
            **lang != self.source
                && **lang != self.primary
                && Some(lang.as_str()) != self.variant.as_deref()
        })
    }
}
