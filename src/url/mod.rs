//! URL handling module for Course-Mirror
//!
//! This module provides the pure link logic shared by page extraction and the
//! fetch pipeline: relative path computation, host/path rewriting, scope
//! classification and the URL → local file mapping.

mod classify;
mod local;
mod normalize;
mod resolve;

// Re-export main functions
pub use classify::{classify, is_in_tree, is_script_link, Disposition, ScopeConfig};
pub use local::{href_segments, local_segments, local_target, page_dir_segments, DIRECTORY_INDEX};
pub use normalize::{normalize, HostFix, PathSegmentRewrite, RewriteRule};
pub use resolve::relative_path;

use ::url::Url;

/// Computes the href that points from `page_url` to `target` inside the mirror
///
/// Both ends are mapped with [`local_segments`], the same mapping used to write
/// files, so the href resolves against the saved page to the saved target.
/// Query string and fragment of the target are preserved.
///
/// # Examples
///
/// ```
/// use course_mirror::url::relative_href;
/// use url::Url;
///
/// let page = Url::parse("https://c.example.edu/course_builder/2425/algebra/").unwrap();
/// let target = Url::parse("https://c.example.edu/course_builder/2425/geometry/a.pdf#p2").unwrap();
/// assert_eq!(relative_href(&page, &target, "course_builder"), "../geometry/a.pdf#p2");
/// ```
pub fn relative_href(page_url: &Url, target: &Url, tree_root: &str) -> String {
    let base = page_dir_segments(page_url, tree_root);
    let segments = local_segments(target, tree_root);
    let mut href = relative_path(&base, &segments);

    if let Some(query) = target.query() {
        href.push('?');
        href.push_str(query);
    }
    if let Some(fragment) = target.fragment() {
        href.push('#');
        href.push_str(fragment);
    }

    href
}
