//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[site]` section in lingon.toml - the content tree being served and
/// edited.
///
/// # Example
/// ```toml
/// [site]
/// root = "site"   # relative to the project root
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Directory holding the static HTML/asset files. Resolved to an
    /// absolute path at load time; every resolved pathname must stay
    /// inside it.
    #[serde(default = "defaults::site::root")]
    #[educe(Default = defaults::site::root())]
    pub root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_site_section_default() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.site.root, PathBuf::from("site"));
    }

    #[test]
    fn test_site_section_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [site]
            root = "public_html"
        "#,
        )
        .unwrap();
        assert_eq!(config.site.root, PathBuf::from("public_html"));
    }
}
