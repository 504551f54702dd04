//! Final HTML composition for a resolved page.
//!
//! Outside an edit session, a page response is template expansion
//! followed by translation substitution. During an edit session the raw
//! content is returned with the editor client injected, so the editor
//! always works on the untranslated source markup.

use crate::{
    config::SiteConfig,
    i18n,
    template::{TemplateError, expand_templates},
};
use std::path::Path;

/// Route the injected editor client is served from.
pub const EDITOR_SCRIPT_ROUTE: &str = "/lingon-edit.js";

/// Compose the response body for a page.
///
/// `edit_mode` short-circuits to raw content plus the editor script.
/// Otherwise: expand templates (if enabled), then substitute the `lang`
/// slot of each wrapped span from the sidecar dictionary. Missing
/// dictionary data leaves markers untouched rather than failing.
pub fn render_page(
    config: &SiteConfig,
    content: String,
    file: &Path,
    lang: &str,
    edit_mode: bool,
) -> Result<String, TemplateError> {
    if edit_mode {
        return Ok(format!(
            "{content}<script src=\"{EDITOR_SCRIPT_ROUTE}\"></script>"
        ));
    }

    let html = if config.templates.enable {
        expand_templates(config, content, file, lang)?
    } else {
        content
    };

    Ok(if config.i18n.enable {
        i18n::translate_html(&html, file, lang)
    } else {
        html
    })
}
