use crate::{ConfigError, UrlError};
use regex::Regex;
use url::Url;

/// Replaces one hostname with another, dropping any explicit port
///
/// Used to redirect a known alternate network address (for example a raw IP)
/// to the canonical hostname of the mirrored site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFix {
    from: String,
    to: String,
}

impl HostFix {
    /// Creates a host fix; both names are compared in lowercase
    pub fn new(from: &str, to: &str) -> Result<Self, ConfigError> {
        let from = from.trim().to_lowercase();
        let to = to.trim().to_lowercase();

        if from.is_empty() || to.is_empty() {
            return Err(ConfigError::Validation(
                "host fix requires both 'from' and 'to'".to_string(),
            ));
        }
        if from == to {
            return Err(ConfigError::Validation(format!(
                "host fix 'from' and 'to' are identical: {}",
                from
            )));
        }

        Ok(Self { from, to })
    }

    pub fn from_host(&self) -> &str {
        &self.from
    }

    pub fn to_host(&self) -> &str {
        &self.to
    }
}

/// Rewrites the 4-digit year segment that follows an anchor segment
///
/// With anchor `course_builder`, prefix `""` and digits `2425`, the path
/// `/course_builder/2223/x` becomes `/course_builder/2425/x`. The year segment may
/// carry a leading underscore (`_2223`), which is replaced along with the digits.
/// The anchor is matched case-insensitively and kept verbatim.
#[derive(Debug, Clone)]
pub struct PathSegmentRewrite {
    pattern: Regex,
    replacement: String,
    anchor: String,
    segment: String,
}

impl PathSegmentRewrite {
    pub fn new(anchor: &str, prefix: &str, digits: &str) -> Result<Self, ConfigError> {
        let anchor = anchor.trim_matches('/');
        if anchor.is_empty() || anchor.contains('/') {
            return Err(ConfigError::InvalidPattern(format!(
                "path rewrite anchor must be a single segment, got '{}'",
                anchor
            )));
        }
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidPattern(format!(
                "path rewrite digits must be exactly 4 ASCII digits, got '{}'",
                digits
            )));
        }
        if prefix.contains('/') || prefix.contains('$') {
            return Err(ConfigError::InvalidPattern(format!(
                "path rewrite prefix cannot contain '/' or '$', got '{}'",
                prefix
            )));
        }

        let pattern = Regex::new(&format!(r"(?i)(/{}/)_?\d{{4}}(/|$)", regex::escape(anchor)))
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            pattern,
            replacement: format!("${{1}}{}{}${{2}}", prefix, digits),
            anchor: anchor.to_string(),
            segment: format!("{}{}", prefix, digits),
        })
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// The segment written after the anchor, prefix included
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Applies the rewrite to a URL path; paths without the anchor are returned unchanged
    pub fn apply(&self, path: &str) -> String {
        self.pattern
            .replacen(path, 1, self.replacement.as_str())
            .into_owned()
    }
}

/// Host and path substitutions applied to every resolved link
#[derive(Debug, Clone, Default)]
pub struct RewriteRule {
    pub host_fix: Option<HostFix>,
    pub path_rewrite: Option<PathSegmentRewrite>,
}

impl RewriteRule {
    /// Applies the host fix, then the path rewrite, to an already-resolved URL
    pub fn apply(&self, url: &mut Url) -> Result<(), UrlError> {
        if let Some(fix) = &self.host_fix {
            let matches = url
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(&fix.from))
                .unwrap_or(false);

            if matches {
                url.set_host(Some(fix.to.as_str()))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
                url.set_port(None)
                    .map_err(|_| UrlError::Malformed(format!("Failed to clear port: {}", url)))?;
            }
        }

        if let Some(rewrite) = &self.path_rewrite {
            let rewritten = rewrite.apply(url.path());
            if rewritten != url.path() {
                url.set_path(&rewritten);
            }
        }

        Ok(())
    }
}

/// Resolves an href against its page and applies the rewrite rules
///
/// # Normalization Steps
///
/// 1. Resolve `href` against `page_url`; malformed input is an error
/// 2. Host fix: replace a matching hostname and clear the port
/// 3. Path rewrite: substitute the year segment after the anchor
///
/// The host fix runs first because it decides which path layout applies.
///
/// # Examples
///
/// ```
/// use course_mirror::url::{normalize, HostFix, RewriteRule};
/// use url::Url;
///
/// let page = Url::parse("http://10.0.0.5:8080/course_builder/2425/index.html").unwrap();
/// let rules = RewriteRule {
///     host_fix: Some(HostFix::new("10.0.0.5", "courses.example.edu").unwrap()),
///     path_rewrite: None,
/// };
/// let url = normalize("notes.pdf", &page, &rules).unwrap();
/// assert_eq!(url.as_str(), "http://courses.example.edu/course_builder/2425/notes.pdf");
/// ```
pub fn normalize(href: &str, page_url: &Url, rules: &RewriteRule) -> Result<Url, UrlError> {
    let mut url = page_url
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    rules.apply(&mut url)?;

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page() -> Url {
        Url::parse("https://courses.example.edu/course_builder/2425/algebra/index.html").unwrap()
    }

    fn host_rules() -> RewriteRule {
        RewriteRule {
            host_fix: Some(HostFix::new("10.0.0.5", "courses.example.edu").unwrap()),
            path_rewrite: None,
        }
    }

    fn year_rules(prefix: &str) -> RewriteRule {
        RewriteRule {
            host_fix: None,
            path_rewrite: Some(PathSegmentRewrite::new("course_builder", prefix, "2425").unwrap()),
        }
    }

    #[test]
    fn test_resolves_relative_href() {
        let url = normalize("../geometry/", &page(), &RewriteRule::default()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://courses.example.edu/course_builder/2425/geometry/"
        );
    }

    #[test]
    fn test_malformed_href_is_error() {
        let result = normalize("http://[::1", &page(), &RewriteRule::default());
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_host_fix_replaces_host_and_port() {
        let url = normalize("http://10.0.0.5:8080/a/b", &page(), &host_rules()).unwrap();
        assert_eq!(url.host_str(), Some("courses.example.edu"));
        assert_eq!(url.port(), None);
        assert_eq!(url.path(), "/a/b");
    }

    #[test]
    fn test_host_fix_ignores_other_hosts() {
        let url = normalize("https://other.example.org:8443/a", &page(), &host_rules()).unwrap();
        assert_eq!(url.as_str(), "https://other.example.org:8443/a");
    }

    #[test]
    fn test_year_rewrite_plain() {
        let url = normalize("/course_builder/2223/x", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/course_builder/2425/x");
    }

    #[test]
    fn test_year_rewrite_underscore() {
        let url = normalize("/course_builder/_2223/x", &page(), &year_rules("_")).unwrap();
        assert_eq!(url.path(), "/course_builder/_2425/x");
    }

    #[test]
    fn test_year_rewrite_case_insensitive_anchor() {
        let url = normalize("/Course_Builder/2223/x", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/Course_Builder/2425/x");
    }

    #[test]
    fn test_year_rewrite_at_path_end() {
        let url = normalize("/course_builder/2223", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/course_builder/2425");
    }

    #[test]
    fn test_path_without_anchor_unchanged() {
        let url = normalize("/archive/2223/x", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/archive/2223/x");
    }

    #[test]
    fn test_other_numeric_segments_untouched() {
        let url = normalize("/course_builder/2223/files/1999/x", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/course_builder/2425/files/1999/x");
    }

    #[test]
    fn test_five_digit_segment_untouched() {
        let url = normalize("/course_builder/22231/x", &page(), &year_rules("")).unwrap();
        assert_eq!(url.path(), "/course_builder/22231/x");
    }

    #[test]
    fn test_host_fix_runs_before_path_rewrite() {
        let rules = RewriteRule {
            host_fix: Some(HostFix::new("10.0.0.5", "courses.example.edu").unwrap()),
            path_rewrite: Some(PathSegmentRewrite::new("course_builder", "", "2425").unwrap()),
        };
        let url = normalize("http://10.0.0.5:81/course_builder/2223/a?q=1#f", &page(), &rules)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://courses.example.edu/course_builder/2425/a?q=1#f"
        );
    }

    #[test]
    fn test_rule_accessors() {
        let fix = HostFix::new("10.0.0.5", "Courses.Example.edu").unwrap();
        assert_eq!(fix.from_host(), "10.0.0.5");
        assert_eq!(fix.to_host(), "courses.example.edu");

        let seg = PathSegmentRewrite::new("/course_builder/", "_", "2425").unwrap();
        assert_eq!(seg.anchor(), "course_builder");
        assert_eq!(seg.segment(), "_2425");
    }

    #[test]
    fn test_invalid_rewrite_config() {
        assert!(PathSegmentRewrite::new("course_builder", "", "24").is_err());
        assert!(PathSegmentRewrite::new("course_builder", "", "24a5").is_err());
        assert!(PathSegmentRewrite::new("", "", "2425").is_err());
        assert!(PathSegmentRewrite::new("course_builder", "a/b", "2425").is_err());
        assert!(HostFix::new("a.example.com", "A.example.com").is_err());
    }

    proptest! {
        #[test]
        fn test_normalize_idempotent(
            host in prop_oneof![Just("10.0.0.5"), Just("courses.example.edu"), Just("other.org")],
            anchor in prop_oneof![Just("course_builder"), Just("COURSE_BUILDER"), Just("misc")],
            year in "_?[0-9]{4}",
            tail in "[a-z]{0,6}",
            prefix in prop_oneof![Just(""), Just("_")],
        ) {
            let rules = RewriteRule {
                host_fix: Some(HostFix::new("10.0.0.5", "courses.example.edu").unwrap()),
                path_rewrite: Some(PathSegmentRewrite::new("course_builder", prefix, "2425").unwrap()),
            };
            let href = format!("http://{}:8080/{}/{}/{}", host, anchor, year, tail);
            let once = normalize(&href, &page(), &rules).unwrap();
            let twice = normalize(once.as_str(), &once, &rules).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
