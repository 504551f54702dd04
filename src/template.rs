//! Recursive template fragment expansion.
//!
//! Pages reference reusable fragments with `{[path]}` markers:
//! `{[/header.html]}` resolves from the site root, `{[footer.html]}`
//! from the including file's directory. The document is rescanned after
//! each pass until no marker remains, so fragments may include further
//! fragments.
//!
//! Every referenced path goes through the same containment check as
//! request resolution; an out-of-root marker is replaced with an empty
//! string. The rescan loop carries an explicit pass budget so an
//! inclusion cycle fails closed with [`TemplateError::RecursionLimit`]
//! instead of spinning forever, and a size budget stops a self-doubling
//! inclusion before it exhausts memory.

use crate::{config::SiteConfig, i18n, log, resolve::lexical_join};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;

/// Inclusion marker pattern: `{[pathname]}`.
static INCLUDE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\[(.*?)\]\}").unwrap());

/// Upper bound on rescan passes; generous for any legitimate nesting.
const MAX_PASSES: usize = 64;

/// Upper bound on the expanded document size. A fragment that includes
/// itself more than once doubles the marker count every pass, so the
/// pass budget alone does not bound memory.
const MAX_EXPANDED_BYTES: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template expansion did not settle after {0} passes (inclusion cycle?)")]
    RecursionLimit(usize),

    #[error("expanded document grew past {0} bytes (runaway inclusion?)")]
    SizeLimit(usize),
}

/// Expand every `{[...]}` marker in `html`.
///
/// `file` is the including page (relative markers resolve from its
/// directory). Each fragment is translated for `lang` through its own
/// sidecar dictionary before substitution, when i18n is enabled.
pub fn expand_templates(
    config: &SiteConfig,
    html: String,
    file: &Path,
    lang: &str,
) -> Result<String, TemplateError> {
    let site_root = config.site.root.as_path();
    let dir = file.parent().unwrap_or(site_root);
    let mut html = html;

    for _ in 0..MAX_PASSES {
        if html.len() > MAX_EXPANDED_BYTES {
            return Err(TemplateError::SizeLimit(MAX_EXPANDED_BYTES));
        }

        let markers: Vec<(String, String)> = INCLUDE_MARKER
            .captures_iter(&html)
            .map(|c| (c[0].to_string(), c[1].to_string()))
            .collect();
        if markers.is_empty() {
            return Ok(html);
        }

        for (marker, pathname) in markers {
            // Rebase onto the site root so `..` may climb within the
            // site but never out of it.
            let relative = if pathname.starts_with('/') {
                Some(PathBuf::from(&pathname))
            } else {
                dir.strip_prefix(site_root)
                    .ok()
                    .map(|prefix| prefix.join(&pathname))
            };
            let fragment_file = match relative.map(|rel| lexical_join(site_root, &rel)) {
                Some(Ok(path)) => path,
                _ => {
                    log!("serve"; "dropped out-of-root template marker {marker}");
                    html = html.replacen(&marker, "", 1);
                    continue;
                }
            };

            let fragment = match fs::read_to_string(&fragment_file) {
                Ok(content) => content,
                Err(err) => {
                    log!("serve"; "dropped unreadable template {}: {err}", fragment_file.display());
                    html = html.replacen(&marker, "", 1);
                    continue;
                }
            };

            let fragment = if config.i18n.enable {
                i18n::translate_html(&fragment, &fragment_file, lang)
            } else {
                fragment
            };
            html = html.replacen(&marker, &fragment, 1);
        }
    }

    Err(TemplateError::RecursionLimit(MAX_PASSES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{LangDict, lang_file_path, seed_dictionary, write_lang_file};
    use std::fs;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.root = root.to_path_buf();
        config
    }

    #[test]
    fn test_expands_absolute_and_relative_markers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("header.html"), "<header>H</header>").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/footer.html"), "<footer>F</footer>").unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("sub/index.html");
        let html = "{[/header.html]}<main/>{[footer.html]}".to_string();

        let out = expand_templates(&config, html, &page, "en").unwrap();
        assert_eq!(out, "<header>H</header><main/><footer>F</footer>");
    }

    #[test]
    fn test_expands_nested_fragments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("outer.html"), "<div>{[/inner.html]}</div>").unwrap();
        fs::write(dir.path().join("inner.html"), "deep").unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let out = expand_templates(&config, "{[/outer.html]}".to_string(), &page, "en").unwrap();
        assert_eq!(out, "<div>deep</div>");
    }

    #[test]
    fn test_relative_marker_may_climb_within_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("header.html"), "<header/>").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("sub/index.html");

        let out =
            expand_templates(&config, "{[../header.html]}".to_string(), &page, "en").unwrap();
        assert_eq!(out, "<header/>");
    }

    #[test]
    fn test_drops_out_of_root_marker() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let html = "a{[../../etc/passwd]}b".to_string();
        let out = expand_templates(&config, html, &page, "en").unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_drops_missing_fragment() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let out =
            expand_templates(&config, "a{[/nope.html]}b".to_string(), &page, "en").unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_inclusion_cycle_fails_closed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "{[/b.html]}").unwrap();
        fs::write(dir.path().join("b.html"), "{[/a.html]}").unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let out = expand_templates(&config, "{[/a.html]}".to_string(), &page, "en");
        assert!(matches!(out, Err(TemplateError::RecursionLimit(_))));
    }

    #[test]
    fn test_self_doubling_inclusion_fails_closed() {
        let dir = TempDir::new().unwrap();
        // Two self-references double the marker count every pass
        fs::write(dir.path().join("a.html"), "{[/a.html]}{[/a.html]}").unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let out = expand_templates(&config, "{[/a.html]}".to_string(), &page, "en");
        assert!(matches!(out, Err(TemplateError::SizeLimit(_))));
    }

    #[test]
    fn test_fragment_translated_through_its_own_sidecar() {
        let dir = TempDir::new().unwrap();
        let fragment = dir.path().join("header.html");
        fs::write(&fragment, "<h1>{{Welcome}}</h1>").unwrap();

        let langs = vec!["en".to_string(), "zh_cn".to_string()];
        let mut dict = LangDict::new();
        seed_dictionary(&mut dict, "{{Welcome}}", &langs, "en");
        dict.get_mut("{{Welcome}}")
            .unwrap()
            .insert("zh_cn".into(), "欢迎".into());
        write_lang_file(&lang_file_path(&fragment), &dict).unwrap();

        let config = test_config(dir.path());
        let page = dir.path().join("index.html");

        let out =
            expand_templates(&config, "{[/header.html]}".to_string(), &page, "zh_cn").unwrap();
        assert_eq!(out, "<h1>欢迎</h1>");

        // The source language substitutes its own seeded text
        let out =
            expand_templates(&config, "{[/header.html]}".to_string(), &page, "en").unwrap();
        assert_eq!(out, "<h1>Welcome</h1>");
    }
}
