//! URL pathname to site file resolution.
//!
//! Maps an incoming URL path onto a file inside the site root without ever
//! escaping it. Resolution order for an extension-less pathname:
//!
//! 1. `../file`       -> rejected (out of the site directory)
//! 2. `/contact.html` -> `/contact.html`
//! 3. `/contact`      -> `/contact` (file exists without extension)
//! 4. `/contact`      -> `/contact/index.html` (directory exists)
//! 5. `/contact`      -> `/contact.html` (sibling .html exists)
//! 6. `/contact`      -> `/contact/index.html` (nothing exists)
//!
//! Containment is checked on the *normalized* path, so URL-encoded `..`
//! segments cannot slip through. Pathnames whose final component looks
//! like an environment secret file are rejected outright.

use std::{
    borrow::Cow,
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// Resolution errors, surfaced to the caller which picks the HTTP status.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolved pathname is out of the site directory")]
    OutOfRoot,

    #[error("resolved pathname is forbidden")]
    Forbidden,

    /// e.g. socket or fifo sitting where a page was expected
    #[error("unsupported file type: `{0}`")]
    UnsupportedType(PathBuf),

    #[error("IO error when resolving `{0}`")]
    Io(PathBuf, #[source] io::Error),
}

/// A pathname resolved to a concrete file inside the site root.
///
/// `exists` tells the caller whether the file is already on disk; a
/// non-existing resolution is still useful as a save target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub file: PathBuf,
    pub exists: bool,
}

/// Extension carried by page files.
pub const PAGE_EXT: &str = "html";

/// Resolve a URL pathname to a file under `site_root`.
///
/// `site_root` must be absolute. With `mkdir` set, the fallback directory
/// for a not-yet-existing page is created (save intent).
pub fn resolve_pathname(
    site_root: &Path,
    pathname: &str,
    mkdir: bool,
) -> Result<ResolvedFile, ResolveError> {
    let decoded = match urlencoding::decode(pathname) {
        Ok(s) => s,
        // Not valid UTF-8 after decoding; fall back to the raw string
        Err(_) => Cow::Borrowed(pathname),
    };

    let file = lexical_join(site_root, Path::new(decoded.as_ref()))?;

    if file.file_name().is_some_and(is_forbidden_name) {
        return Err(ResolveError::Forbidden);
    }

    // /contact.html -> /contact.html
    if file.extension().is_some_and(|ext| ext == PAGE_EXT) {
        let exists = file.is_file();
        return Ok(ResolvedFile { file, exists });
    }

    match fs::metadata(&file) {
        Ok(meta) => {
            // /contact -> /contact (file exists without extension)
            if meta.is_file() {
                return Ok(ResolvedFile { file, exists: true });
            }

            // /contact -> /contact/index.html (directory exists)
            if meta.is_dir() {
                let index = file.join("index.html");
                let exists = index.is_file();
                return Ok(ResolvedFile {
                    file: index,
                    exists,
                });
            }

            // e.g. socket file descriptor
            Err(ResolveError::UnsupportedType(file))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // /contact -> /contact.html (sibling .html exists)
            let mut html_name: OsString = file.clone().into_os_string();
            html_name.push(".html");
            let html_file = PathBuf::from(html_name);
            if html_file.is_file() {
                return Ok(ResolvedFile {
                    file: html_file,
                    exists: true,
                });
            }

            // /contact -> /contact/index.html (nothing exists)
            if mkdir {
                fs::create_dir_all(&file).map_err(|e| ResolveError::Io(file.clone(), e))?;
            }
            Ok(ResolvedFile {
                file: file.join("index.html"),
                exists: false,
            })
        }
        Err(err) => Err(ResolveError::Io(file, err)),
    }
}

/// Join `pathname` onto `root` purely lexically, resolving `.` and `..`
/// without touching the filesystem.
///
/// Rejects any path whose normalized form would climb above `root`.
/// Also used by the template expander for its containment check.
pub(crate) fn lexical_join(root: &Path, pathname: &Path) -> Result<PathBuf, ResolveError> {
    let base_depth = root.components().count();
    let mut joined = root.to_path_buf();
    let mut depth = base_depth;

    for component in pathname.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                if depth <= base_depth {
                    return Err(ResolveError::OutOfRoot);
                }
                joined.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
        }
    }

    Ok(joined)
}

/// Match secret-file naming patterns: `.env`, `.env.*`, `*.env`.
fn is_forbidden_name(name: &std::ffi::OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    name == ".env" || name.starts_with(".env.") || name.ends_with(".env")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build the fixture tree used by the original resolution contract:
    /// an extensionless file, a page file, a directory with an index and
    /// an empty directory.
    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file2"), "extensionless").unwrap();
        fs::write(dir.path().join("file3.html"), "<p>page</p>").unwrap();
        fs::create_dir(dir.path().join("dir-with-index")).unwrap();
        fs::write(dir.path().join("dir-with-index/index.html"), "<p>index</p>").unwrap();
        fs::create_dir(dir.path().join("empty-dir")).unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        dir
    }

    #[test]
    fn test_rejects_path_out_of_site_directory() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/../file", false);
        assert!(matches!(out, Err(ResolveError::OutOfRoot)));
    }

    #[test]
    fn test_rejects_url_encoded_traversal() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/%2e%2e/file", false);
        assert!(matches!(out, Err(ResolveError::OutOfRoot)));

        let out = resolve_pathname(dir.path(), "/a/%2E%2E/%2E%2E/file", false);
        assert!(matches!(out, Err(ResolveError::OutOfRoot)));
    }

    #[test]
    fn test_traversal_within_root_is_allowed() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/empty-dir/../file3.html", false).unwrap();
        assert_eq!(out.file, dir.path().join("file3.html"));
        assert!(out.exists);
    }

    #[test]
    fn test_rejects_env_files_even_when_present() {
        let dir = site();
        for pathname in ["/.env", "/.env.docker", "/docker.env"] {
            let out = resolve_pathname(dir.path(), pathname, false);
            assert!(matches!(out, Err(ResolveError::Forbidden)), "{pathname}");
        }
    }

    #[test]
    fn test_preserves_html_pathname() {
        let dir = site();

        let out = resolve_pathname(dir.path(), "/file3.html", false).unwrap();
        assert_eq!(out.file, dir.path().join("file3.html"));
        assert!(out.exists);

        let out = resolve_pathname(dir.path(), "/file2.html", false).unwrap();
        assert_eq!(out.file, dir.path().join("file2.html"));
        assert!(!out.exists);
    }

    #[test]
    fn test_does_not_add_html_if_file_exists() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/file2", false).unwrap();
        assert_eq!(out.file, dir.path().join("file2"));
        assert!(out.exists);
    }

    #[test]
    fn test_resolves_index_inside_existing_directory() {
        let dir = site();

        let out = resolve_pathname(dir.path(), "/dir-with-index", false).unwrap();
        assert_eq!(out.file, dir.path().join("dir-with-index/index.html"));
        assert!(out.exists);

        let out = resolve_pathname(dir.path(), "/empty-dir", false).unwrap();
        assert_eq!(out.file, dir.path().join("empty-dir/index.html"));
        assert!(!out.exists);
    }

    #[test]
    fn test_resolves_html_sibling_if_exists() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/file3", false).unwrap();
        assert_eq!(out.file, dir.path().join("file3.html"));
        assert!(out.exists);
    }

    #[test]
    fn test_falls_back_to_index_inside_missing_directory() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/not-exists", false).unwrap();
        assert_eq!(out.file, dir.path().join("not-exists/index.html"));
        assert!(!out.exists);
        assert!(!dir.path().join("not-exists").exists());
    }

    #[test]
    fn test_mkdir_intent_creates_fallback_directory() {
        let dir = site();
        let out = resolve_pathname(dir.path(), "/new/page", true).unwrap();
        assert_eq!(out.file, dir.path().join("new/page/index.html"));
        assert!(!out.exists);
        assert!(dir.path().join("new/page").is_dir());
    }

    #[test]
    fn test_decodes_url_encoded_pathname() {
        let dir = site();
        fs::write(dir.path().join("my page.html"), "<p>hi</p>").unwrap();
        let out = resolve_pathname(dir.path(), "/my%20page.html", false).unwrap();
        assert_eq!(out.file, dir.path().join("my page.html"));
        assert!(out.exists);
    }
}
