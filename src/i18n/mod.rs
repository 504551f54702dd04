//! Multi-language support: translatable-text extraction, per-page sidecar
//! dictionaries, and the asynchronous translation orchestrator.

pub mod backend;
pub mod dict;
pub mod extract;
pub mod orchestrator;
pub mod queue;

pub use dict::{
    LangDict, LangText, lang_file_path, load_lang_file, seed_dictionary, translate_html,
    write_lang_file,
};
pub use extract::{extract_wrapped_text, strip_delimiters};
pub use orchestrator::Orchestrator;
