//! Asynchronous filling of empty dictionary slots.
//!
//! After a page save completes, the orchestrator walks the page's sidecar
//! dictionary and fills every empty language slot it can, without ever
//! blocking the response that triggered the save. Per-slot rules:
//!
//! - the primary target is derived from the source text via the ordered
//!   machine-backend chain;
//! - the script variant is preferably translated directly, falling back
//!   to script conversion of the already-resolved primary text;
//! - every other configured language is translated directly;
//! - an empty (or visibly non-Latin) source slot is backfilled by
//!   reverse-translating whichever localized slot is non-empty.
//!
//! Each successful fill is persisted immediately through a
//! reload-patch-rewrite of the sidecar, so a crash mid-pass loses at most
//! the slots still in flight. A backend failure leaves its slot empty and
//! is retried on the next save touching the same dictionary.

use crate::{
    config::{I18nConfig, SiteConfig},
    i18n::{
        backend::{Backend, BackendError},
        dict::{self, LangText},
        queue::{Lane, TranslationCache},
    },
    log,
    utils::script::{Script, detect_script},
};
use reqwest::Client;
use std::path::Path;

/// Owns the per-backend lanes and the process-lifetime cache.
///
/// Constructed once at startup by the composition root; there is no
/// global instance.
#[derive(Debug)]
pub struct Orchestrator {
    i18n: I18nConfig,
    /// Machine translation lanes, tried in configuration order.
    machine: Vec<Lane>,
    /// Script-conversion lane for the variant language.
    convert: Option<Lane>,
}

impl Orchestrator {
    /// Build backends and lanes from the loaded configuration.
    pub fn new(config: &SiteConfig, handle: &tokio::runtime::Handle) -> Self {
        let client = Client::new();
        let cache = TranslationCache::new();

        let machine = config
            .i18n
            .backends
            .machine
            .iter()
            .enumerate()
            .map(|(index, endpoint)| {
                let backend =
                    Backend::machine(format!("machine-{}", index + 1), endpoint, client.clone());
                Lane::spawn(backend, cache.clone(), handle)
            })
            .collect();

        let convert = config.i18n.backends.convert.as_ref().map(|endpoint| {
            let backend = Backend::script_converter(
                "convert",
                endpoint,
                &config.i18n.backends.converter,
                client.clone(),
            );
            Lane::spawn(backend, cache.clone(), handle)
        });

        Self::from_parts(config.i18n.clone(), machine, convert)
    }

    /// Assemble from already-spawned lanes (used by tests with mock
    /// backends).
    pub fn from_parts(i18n: I18nConfig, machine: Vec<Lane>, convert: Option<Lane>) -> Self {
        Self {
            i18n,
            machine,
            convert,
        }
    }

    /// Fill every fillable slot of the page's sidecar dictionary.
    ///
    /// Never fails: backend and persistence errors are logged per slot
    /// and the slot stays empty until the next save retries it.
    pub async fn fill_dictionary(&self, page: &Path) {
        let file = dict::lang_file_path(page);
        let Some(entries) = dict::load_lang_file(&file) else {
            return;
        };

        for (key, entry) in &entries {
            self.fill_key(&file, key, entry).await;
        }
    }

    async fn fill_key(&self, file: &Path, key: &str, entry: &LangText) {
        let source = self.i18n.source.as_str();
        let mut source_text = entry.get(source).cloned().unwrap_or_default();

        // Backfill the authoritative slot when it is empty or clearly
        // not written in the source script (an editor typed localized
        // text straight into the page).
        if source_text.is_empty() || detect_script(&source_text) != Script::Latin {
            let localized = entry
                .iter()
                .find(|(lang, text)| lang.as_str() != source && !text.is_empty());
            if let Some((lang, text)) = localized {
                match self.machine_translate(text, lang, source).await {
                    Ok(translated) => {
                        self.persist(file, key, source, &translated);
                        source_text = translated;
                    }
                    Err(err) => {
                        log!("i18n"; "could not backfill {source} for {key}: {err}");
                    }
                }
            }
        }

        if source_text.is_empty() {
            return;
        }

        // Primary target via the machine chain.
        let primary = self.i18n.primary.as_str();
        let mut primary_text = entry.get(primary).cloned().unwrap_or_default();
        if primary_text.is_empty() && primary != source {
            match self.machine_translate(&source_text, source, primary).await {
                Ok(translated) => {
                    self.persist(file, key, primary, &translated);
                    primary_text = translated;
                }
                Err(err) => log!("i18n"; "{primary} slot left empty for {key}: {err}"),
            }
        }

        // Script variant: direct translation preferred, conversion of
        // the primary text as fallback.
        if let Some(variant) = self.i18n.variant.as_deref() {
            let variant_text = entry.get(variant).map(String::as_str).unwrap_or_default();
            if variant_text.is_empty() {
                match self.machine_translate(&source_text, source, variant).await {
                    Ok(translated) => self.persist(file, key, variant, &translated),
                    Err(direct_err) => {
                        let converted = match (&self.convert, primary_text.is_empty()) {
                            (Some(convert), false) => {
                                convert.translate(&primary_text, primary, variant).await
                            }
                            _ => Err(direct_err),
                        };
                        match converted {
                            Ok(translated) => self.persist(file, key, variant, &translated),
                            Err(err) => {
                                log!("i18n"; "{variant} slot left empty for {key}: {err}");
                            }
                        }
                    }
                }
            }
        }

        // Every remaining language translates directly from the source.
        for lang in self.i18n.extra_languages() {
            let current = entry.get(lang).map(String::as_str).unwrap_or_default();
            if !current.is_empty() {
                continue;
            }
            match self.machine_translate(&source_text, source, lang).await {
                Ok(translated) => self.persist(file, key, lang, &translated),
                Err(err) => log!("i18n"; "{lang} slot left empty for {key}: {err}"),
            }
        }
    }

    /// Try each machine lane in order; first success wins.
    async fn machine_translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        let mut last = BackendError::NoBackend;
        for lane in &self.machine {
            match lane.translate(text, source, target).await {
                Ok(translated) => return Ok(translated),
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    fn persist(&self, file: &Path, key: &str, lang: &str, value: &str) {
        if let Err(err) = dict::patch_slot(file, key, lang, value) {
            log!("i18n"; "failed to persist {lang} for {key}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BackendsConfig,
        i18n::{backend::mock::MockBackend, dict::LangDict},
    };
    use std::sync::{Arc, atomic::Ordering};
    use tempfile::TempDir;

    fn test_i18n(variant: bool) -> I18nConfig {
        let mut languages = vec!["en".to_string(), "zh_cn".to_string()];
        if variant {
            languages.push("zh_hk".to_string());
        }
        I18nConfig {
            enable: true,
            source: "en".into(),
            primary: "zh_cn".into(),
            variant: variant.then(|| "zh_hk".to_string()),
            languages,
            backends: BackendsConfig::default(),
        }
    }

    fn lane(mock: &Arc<MockBackend>) -> Lane {
        Lane::spawn(
            Backend::Mock(mock.clone()),
            TranslationCache::new(),
            &tokio::runtime::Handle::current(),
        )
    }

    /// Write a sidecar for a page holding the given entries.
    fn write_sidecar(dir: &TempDir, entries: &[(&str, &[(&str, &str)])]) -> std::path::PathBuf {
        let page = dir.path().join("index.html");
        let mut dict = LangDict::new();
        for (key, slots) in entries {
            let entry: LangText = slots
                .iter()
                .map(|(lang, text)| (lang.to_string(), text.to_string()))
                .collect();
            dict.insert(key.to_string(), entry);
        }
        dict::write_lang_file(&dict::lang_file_path(&page), &dict).unwrap();
        page
    }

    fn load_sidecar(page: &Path) -> LangDict {
        dict::load_lang_file(&dict::lang_file_path(page)).unwrap()
    }

    #[tokio::test]
    async fn test_fills_primary_and_variant_from_source() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(
            &dir,
            &[
                ("{{Hello}}", &[("en", "Hello"), ("zh_cn", ""), ("zh_hk", "")]),
                ("{{Other}}", &[("en", "Other"), ("zh_cn", ""), ("zh_hk", "")]),
            ],
        );

        let mt = Arc::new(MockBackend::new("mt", "mt"));
        let orchestrator = Orchestrator::from_parts(test_i18n(true), vec![lane(&mt)], None);
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{Hello}}"]["zh_cn"], "mt[zh_cn]Hello");
        assert_eq!(dict["{{Hello}}"]["zh_hk"], "mt[zh_hk]Hello");
        // The unrelated key's source text must survive the fills
        assert_eq!(dict["{{Other}}"]["en"], "Other");
        assert_eq!(dict["{{Other}}"]["zh_cn"], "mt[zh_cn]Other");
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary_machine_backend() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(&dir, &[("{{Hello}}", &[("en", "Hello"), ("zh_cn", "")])]);

        let down = Arc::new(MockBackend::failing("down"));
        let backup = Arc::new(MockBackend::new("backup", "backup"));
        let orchestrator = Orchestrator::from_parts(
            test_i18n(false),
            vec![lane(&down), lane(&backup)],
            None,
        );
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{Hello}}"]["zh_cn"], "backup[zh_cn]Hello");
        assert!(down.calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_variant_derived_by_conversion_when_direct_fails() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(
            &dir,
            &[(
                "{{Hello}}",
                &[("en", "Hello"), ("zh_cn", "你好"), ("zh_hk", "")],
            )],
        );

        let down = Arc::new(MockBackend::failing("down"));
        let conv = Arc::new(MockBackend::new("conv", "conv"));
        let orchestrator =
            Orchestrator::from_parts(test_i18n(true), vec![lane(&down)], Some(lane(&conv)));
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        // Converted from the already-resolved primary text, not from en
        assert_eq!(dict["{{Hello}}"]["zh_hk"], "conv[zh_hk]你好");
        assert_eq!(dict["{{Hello}}"]["zh_cn"], "你好");
    }

    #[tokio::test]
    async fn test_backfills_empty_source_by_reverse_translation() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(&dir, &[("{{x}}", &[("en", ""), ("zh_cn", "你好")])]);

        let mt = Arc::new(MockBackend::new("mt", "mt"));
        let orchestrator = Orchestrator::from_parts(test_i18n(false), vec![lane(&mt)], None);
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{x}}"]["en"], "mt[en]你好");
    }

    #[tokio::test]
    async fn test_backfills_source_detected_as_non_latin() {
        let dir = TempDir::new().unwrap();
        // Someone typed Chinese straight into the wrapped source span
        let page = write_sidecar(&dir, &[("{{x}}", &[("en", "联络我们"), ("zh_cn", "联络我们")])]);

        let mt = Arc::new(MockBackend::new("mt", "mt"));
        let orchestrator = Orchestrator::from_parts(test_i18n(false), vec![lane(&mt)], None);
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{x}}"]["en"], "mt[en]联络我们");
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_slot_empty() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(&dir, &[("{{Hello}}", &[("en", "Hello"), ("zh_cn", "")])]);

        let down = Arc::new(MockBackend::failing("down"));
        let orchestrator = Orchestrator::from_parts(test_i18n(false), vec![lane(&down)], None);
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{Hello}}"]["zh_cn"], "");
        assert_eq!(dict["{{Hello}}"]["en"], "Hello");
    }

    #[tokio::test]
    async fn test_missing_sidecar_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mt = Arc::new(MockBackend::new("mt", "mt"));
        let orchestrator = Orchestrator::from_parts(test_i18n(false), vec![lane(&mt)], None);

        orchestrator.fill_dictionary(&dir.path().join("index.html")).await;
        assert_eq!(mt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extra_language_translated_directly() {
        let dir = TempDir::new().unwrap();
        let page = write_sidecar(
            &dir,
            &[("{{Hello}}", &[("en", "Hello"), ("zh_cn", ""), ("ja", "")])],
        );

        let mut i18n = test_i18n(false);
        i18n.languages.push("ja".into());

        let mt = Arc::new(MockBackend::new("mt", "mt"));
        let orchestrator = Orchestrator::from_parts(i18n, vec![lane(&mt)], None);
        orchestrator.fill_dictionary(&page).await;

        let dict = load_sidecar(&page);
        assert_eq!(dict["{{Hello}}"]["ja"], "mt[ja]Hello");
    }
}
