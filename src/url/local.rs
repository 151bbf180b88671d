use crate::UrlError;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used for URLs that address a directory (`.../dir/`)
pub const DIRECTORY_INDEX: &str = "index.html";

/// Returns the raw (still percent-encoded) path segments a URL is stored under
///
/// Empty segments from doubled slashes are skipped, and a trailing slash maps
/// to [`DIRECTORY_INDEX`]. The same mapping is used for on-disk paths and for
/// relative hrefs, so both always agree.
pub fn href_segments(url: &Url) -> Vec<String> {
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    if url.path().ends_with('/') {
        segments.push(DIRECTORY_INDEX.to_string());
    }

    segments
}

/// Segments of the file a URL is stored as, relative to the mirror root
///
/// The leading `tree_root` segment (if present, compared case-insensitively) is
/// stripped and an empty result maps to [`DIRECTORY_INDEX`]. Segments stay
/// percent-encoded. Both [`local_target`] and in-page relative hrefs are built
/// from this list, so a rewritten link always lands on the file it names.
pub fn local_segments(url: &Url, tree_root: &str) -> Vec<String> {
    let mut segments = href_segments(url);

    if !tree_root.is_empty()
        && segments
            .first()
            .map(|first| first.eq_ignore_ascii_case(tree_root))
            .unwrap_or(false)
    {
        segments.remove(0);
    }

    if segments.is_empty() {
        segments.push(DIRECTORY_INDEX.to_string());
    }

    segments
}

/// Maps a resolved URL to its file under the mirror root
///
/// The segments from [`local_segments`] are percent-decoded and appended to
/// `root`. Host, query and fragment do not take part in the mapping.
///
/// # Arguments
///
/// * `url` - An already-resolved resource URL
/// * `root` - The mirror root directory
/// * `tree_root` - The URL path segment the mirrored tree hangs from
///
/// # Returns
///
/// * `Ok(PathBuf)` - Local file path
/// * `Err(UrlError)` - A segment cannot be represented safely on disk
pub fn local_target(url: &Url, root: &Path, tree_root: &str) -> Result<PathBuf, UrlError> {
    let mut path = root.to_path_buf();
    for segment in local_segments(url, tree_root) {
        let decoded = urlencoding::decode(&segment)
            .map_err(|e| UrlError::UnsafeSegment(format!("{}: {}", segment, e)))?;

        if decoded == "." || decoded == ".." || decoded.contains('/') || decoded.contains('\\') {
            return Err(UrlError::UnsafeSegment(decoded.into_owned()));
        }

        path.push(decoded.as_ref());
    }

    Ok(path)
}

/// Directory segments of the file a page is stored as, relative to the mirror root
pub fn page_dir_segments(page_url: &Url, tree_root: &str) -> Vec<String> {
    let mut segments = local_segments(page_url, tree_root);
    segments.pop();
    segments
}
