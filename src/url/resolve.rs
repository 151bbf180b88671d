/// Computes a document-relative path from a base directory to a target path
///
/// Both arguments are sequences of path segments. The result climbs out of the
/// part of `base_dir` that is not shared with `target` using `..` segments, then
/// descends into the remainder of `target`. When the two sequences are identical
/// the result is `"."`. The output never starts with `/`.
///
/// # Arguments
///
/// * `base_dir` - Segments of the directory the reference is written from
/// * `target` - Segments of the path being referenced
///
/// # Examples
///
/// ```
/// use course_mirror::url::relative_path;
///
/// assert_eq!(relative_path(&["a", "b"], &["a", "b"]), ".");
/// assert_eq!(relative_path(&["a", "b"], &["a", "c"]), "../c");
/// assert_eq!(relative_path::<&str>(&[], &["x", "y"]), "x/y");
/// ```
pub fn relative_path<S: AsRef<str>>(base_dir: &[S], target: &[S]) -> String {
    let common = base_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a.as_ref() == b.as_ref())
        .count();

    let ups = base_dir.len() - common;
    let parts: Vec<&str> = std::iter::repeat("..")
        .take(ups)
        .chain(target[common..].iter().map(AsRef::as_ref))
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
