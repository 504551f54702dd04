//! Batch translation over the site tree.
//!
//! The `translate` subcommand walks every page under the site root (or
//! a single page given a pathname), seeds missing dictionary entries
//! from the page markup, then runs the translation orchestrator to
//! completion. Useful after bulk edits made outside the server, or to
//! warm dictionaries before first deploy.

use crate::{
    backup::is_backup_name,
    config::SiteConfig,
    i18n::{self, Orchestrator},
    log,
    resolve::{PAGE_EXT, resolve_pathname},
};
use anyhow::{Context, Result, bail};
use std::{fs, path::PathBuf, sync::Arc};
use walkdir::WalkDir;

/// Translate the whole site, or a single resolved page.
pub fn translate_site(config: &'static SiteConfig, pathname: Option<&str>) -> Result<()> {
    if !config.i18n.enable {
        bail!("Translation is disabled in the config ([i18n] enable = false).");
    }

    let pages = match pathname {
        Some(pathname) => {
            let resolved = resolve_pathname(&config.site.root, pathname, false)?;
            if !resolved.exists {
                bail!("No such page: {pathname}");
            }
            if !resolved.file.extension().is_some_and(|ext| ext == PAGE_EXT) {
                bail!("Not a page: {}", resolved.file.display());
            }
            vec![resolved.file]
        }
        None => collect_pages(config),
    };

    if pages.is_empty() {
        log!("translate"; "no pages found under {}", config.site.root.display());
        return Ok(());
    }
    log!("translate"; "{} page(s) to process", pages.len());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let orchestrator = Arc::new(Orchestrator::new(config, runtime.handle()));

    for page in pages {
        seed_page(config, &page)?;
        log!("translate"; "{}", page.display());
        runtime.block_on(orchestrator.fill_dictionary(&page));
    }

    Ok(())
}

/// Collect pages under the site root, skipping backup snapshots.
fn collect_pages(config: &SiteConfig) -> Vec<PathBuf> {
    WalkDir::new(&config.site.root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == PAGE_EXT))
        .filter(|entry| {
            entry
                .path()
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !is_backup_name(name))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Make sure every wrapped span in the page has a dictionary entry.
fn seed_page(config: &SiteConfig, page: &std::path::Path) -> Result<()> {
    let content = fs::read_to_string(page)
        .with_context(|| format!("Failed to read {}", page.display()))?;
    let sidecar = i18n::lang_file_path(page);
    let mut dict = i18n::load_lang_file(&sidecar).unwrap_or_default();
    let changed = i18n::seed_dictionary(
        &mut dict,
        &content,
        &config.i18n.languages,
        &config.i18n.source,
    );
    if changed && !dict.is_empty() {
        i18n::write_lang_file(&sidecar, &dict)?;
    }
    Ok(())
}
