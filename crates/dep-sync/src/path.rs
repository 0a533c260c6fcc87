use std::path::PathBuf;

use url::Url;

/// Derive the local filesystem path from a URL, if it's a `file:` URL.
///
/// The derivation is purely syntactic: the URL's path component is used
/// as-is on POSIX platforms, while on Windows the leading separator before
/// the drive letter is stripped and separators are normalized. No filesystem
/// access is performed, so two references to the same directory only match
/// when they spell the same path.
pub(crate) fn path_from_url(url: &Url) -> Option<PathBuf> {
    if url.scheme() != "file" {
        return None;
    }
    Some(normalize_path(url.path()))
}

#[cfg(windows)]
fn normalize_path(path: &str) -> PathBuf {
    // Ex) `/C:/a/b` -> `C:\a\b`
    let path = path.strip_prefix('/').unwrap_or(path);
    PathBuf::from(path.replace('/', "\\"))
}

#[cfg(not(windows))]
fn normalize_path(path: &str) -> PathBuf {
    PathBuf::from(path)
}
