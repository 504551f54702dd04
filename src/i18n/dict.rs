//! Per-page sidecar dictionaries.
//!
//! Each page `<page>.html` carries an optional `<page>.html.json` sidecar
//! mapping wrapped source text (delimiters included) to its per-language
//! translations:
//!
//! ```json
//! {
//!   "{{Happy Customer.}}": {
//!     "en": "Happy Customer.",
//!     "zh_cn": "快乐的客户。",
//!     "zh_hk": ""
//!   }
//! }
//! ```
//!
//! The `"en"` slot is authoritative; the others are derived. Writes are
//! always full-document rewrites. A malformed sidecar is treated as
//! absent and re-seeded from the page on the next save.

use crate::{
    i18n::extract::{extract_wrapped_text, strip_delimiters},
    log,
    utils::html::decode_html,
};
use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

/// Per-language translated text, keyed by language code.
pub type LangText = BTreeMap<String, String>;

/// Wrapped source text (with `{{ }}`) to its translations.
///
/// `BTreeMap` keeps serialization deterministic: write, load, re-serialize
/// round-trips byte for byte.
pub type LangDict = BTreeMap<String, LangText>;

/// Suffix appended to the full page file name.
pub const LANG_FILE_SUFFIX: &str = ".json";

/// Sidecar path for a page: `contact.html` -> `contact.html.json`.
pub fn lang_file_path(page: &Path) -> PathBuf {
    let mut name = page.as_os_str().to_owned();
    name.push(LANG_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Load a sidecar dictionary.
///
/// Returns `None` when the file is missing or fails schema validation
/// (outer key = wrapped text, inner key = language code, value = string);
/// both cases mean "no existing dictionary" to the caller.
pub fn load_lang_file(file: &Path) -> Option<LangDict> {
    let text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            log!("i18n"; "failed to read {}: {err}", file.display());
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(dict) => Some(dict),
        Err(err) => {
            log!("i18n"; "malformed dictionary {}: {err}", file.display());
            None
        }
    }
}

/// Rewrite the whole sidecar file.
pub fn write_lang_file(file: &Path, dict: &LangDict) -> Result<()> {
    let mut json = serde_json::to_string_pretty(dict)?;
    json.push('\n');
    fs::write(file, json).with_context(|| format!("Failed to write {}", file.display()))?;
    Ok(())
}

/// Add entries for wrapped spans in `html` that the dictionary does not
/// know yet.
///
/// The `source` (normally `"en"`) slot of a new entry is seeded from the
/// delimiter-stripped, entity-decoded key content; every other configured
/// language starts empty. Returns whether anything was added.
pub fn seed_dictionary(
    dict: &mut LangDict,
    html: &str,
    languages: &[String],
    source: &str,
) -> bool {
    let mut changed = false;
    for key in extract_wrapped_text(html) {
        if dict.contains_key(key) {
            continue;
        }
        let mut entry = LangText::new();
        for lang in languages {
            let text = if lang == source {
                decode_html(strip_delimiters(key))
            } else {
                String::new()
            };
            entry.insert(lang.clone(), text);
        }
        dict.insert(key.to_string(), entry);
        changed = true;
    }
    changed
}

/// Substitute each wrapped span in `html` with its translation for
/// `lang`, read from the page's sidecar dictionary.
///
/// Substituted values are entity-encoded so translated content cannot
/// inject markup. A missing sidecar, key or language slot leaves the
/// wrapped marker untouched in the output, which is visually obvious and
/// safe.
pub fn translate_html(html: &str, page: &Path, lang: &str) -> String {
    let Some(dict) = load_lang_file(&lang_file_path(page)) else {
        return html.to_string();
    };

    let mut out = html.to_string();
    for key in extract_wrapped_text(html) {
        let Some(text) = dict.get(key).and_then(|entry| entry.get(lang)) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        out = out.replace(key, &crate::utils::html::encode_html(text));
    }
    out
}

/// Patch a single resolved slot: reload the file, set the one field,
/// rewrite the whole document.
///
/// This read-modify-write is deliberately unlocked; concurrent manual
/// edits to *other* keys can still be lost between reload and rewrite.
/// Accepted for single-editor usage.
pub fn patch_slot(file: &Path, key: &str, lang: &str, value: &str) -> Result<()> {
    let mut dict = load_lang_file(file).unwrap_or_default();
    dict.entry(key.to_string())
        .or_default()
        .insert(lang.to_string(), value.to_string());
    write_lang_file(file, &dict)
}
