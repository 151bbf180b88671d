//! End-to-end mirror runs
//!
//! A wiremock server plays the course site. Pages are loaded through the plain
//! HTTP session, resources through the fetch pipeline, and the results are
//! checked on disk.

use course_mirror::config::{parse_config, Config};
use course_mirror::mirror::{Coordinator, RunOptions};
use course_mirror::page::HttpSession;
use course_mirror::progress::{ProgressSink, ProgressState};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Keeps every rendered state so a test can inspect the run afterwards
#[derive(Clone, Default)]
struct RecordingSink {
    states: Arc<Mutex<Vec<ProgressState>>>,
    cleared: Arc<Mutex<bool>>,
}

impl ProgressSink for RecordingSink {
    fn render(&mut self, state: &ProgressState) {
        self.states.lock().unwrap().push(*state);
    }

    fn clear(&mut self) {
        *self.cleared.lock().unwrap() = true;
    }
}

const ALGEBRA_PAGE: &str = r##"<html>
<head><title>Algebra 2022-23</title></head>
<body>
<h1>Algebra 2022-23</h1>
<a href="notes.pdf">Notes</a>
<a href="/course_builder/2023/algebra/notes.pdf">Last year's notes</a>
<a href="../shared/sheet.docx">Formula sheet</a>
<a href="/course_builder/staff/marks.html">Marks</a>
<a href="https://elsewhere.org/reading">Reading</a>
<a href="javascript:void(0)">Print</a>
<a href="#top">Top</a>
</body>
</html>"##;

fn test_config(server: &MockServer, root: &Path, extra: &str) -> Config {
    let base = server.uri();
    parse_config(&format!(
        r#"
[mirror]
root = "{root}"
tree-root = "course_builder"

[scope]
allowed-hosts = ["127.0.0.1"]
allowed-path-prefixes = ["/course_builder/"]
excluded-prefixes = ["{base}/course_builder/staff"]

[rewrite.path-segment]
anchor = "course_builder"
digits = "2425"

[fetch]
timeout-secs = 5
user-agent = "course-mirror-test"

[extract]
retry-delay-ms = 0

[selection]
subtree = "2425"

[[unit]]
label = "Algebra"
url = "{base}/course_builder/2425/algebra/"

[substitutions]
"2022-23" = "2024-25"
{extra}
"#,
        root = root.display(),
        base = base,
        extra = extra,
    ))
    .unwrap()
}

fn session() -> HttpSession {
    HttpSession::with_timeout("course-mirror-test", Duration::from_secs(5), true).unwrap()
}

async fn mount_page(server: &MockServer, page_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_resource(server: &MockServer, resource_path: &str, body: &[u8], expected: u64) {
    Mock::given(method("GET"))
        .and(path(resource_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_mirror_single_unit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/course_builder/2425/algebra/", ALGEBRA_PAGE).await;
    mount_resource(&server, "/course_builder/2425/algebra/notes.pdf", b"%PDF-notes", 1).await;
    mount_resource(&server, "/course_builder/2425/shared/sheet.docx", b"docx-bytes", 1).await;

    let config = test_config(&server, dir.path(), "");
    let sink = RecordingSink::default();
    let mut coordinator =
        Coordinator::new(&config, RunOptions::default(), Box::new(sink.clone())).unwrap();

    let summary = coordinator.run(&mut session()).await.unwrap();

    // The rewritten year makes the second notes link a duplicate of the first.
    assert_eq!(summary.units_total, 1);
    assert_eq!(summary.units_failed, 0);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed_resources, 0);
    assert!(summary.report.is_none());

    let notes = dir.path().join("2425/algebra/notes.pdf");
    let sheet = dir.path().join("2425/shared/sheet.docx");
    assert_eq!(std::fs::read(&notes).unwrap(), b"%PDF-notes");
    assert_eq!(std::fs::read(&sheet).unwrap(), b"docx-bytes");
    assert!(!dir.path().join("2425/algebra/notes.pdf.part").exists());

    // Progress: three results counted for the unit, then one unit completed.
    let states = sink.states.lock().unwrap().clone();
    assert!(states
        .iter()
        .any(|s| s.unit_total == 3 && s.unit_completed == 3));
    let last = states.last().unwrap();
    assert_eq!(last.aggregate_completed, 1);
    assert_eq!(last.aggregate_total, 1);
    assert_eq!(last.unit_total, 0);
    assert!(*sink.cleared.lock().unwrap());

    // The saved page links into the mirror relatively and leaves the rest alone.
    let page = std::fs::read_to_string(dir.path().join("2425/algebra/index.html")).unwrap();
    assert!(page.contains(r#"href="notes.pdf""#));
    assert!(page.contains(r#"href="../shared/sheet.docx""#));
    assert!(page.contains(r#"href="/course_builder/staff/marks.html""#));
    assert!(page.contains(r#"href="https://elsewhere.org/reading""#));
    assert!(page.contains(r#"href="javascript:void(0)""#));
    assert!(page.contains(r##"href="#top""##));
    assert!(page.contains("Algebra 2024-25"));
    assert!(!page.contains("2022-23"));
}

#[tokio::test]
async fn test_rerun_skips_existing_files() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/course_builder/2425/algebra/", ALGEBRA_PAGE).await;
    // Each resource may be requested only once across both runs.
    mount_resource(&server, "/course_builder/2425/algebra/notes.pdf", b"%PDF-notes", 1).await;
    mount_resource(&server, "/course_builder/2425/shared/sheet.docx", b"docx-bytes", 1).await;

    let config = test_config(&server, dir.path(), "");

    let mut first =
        Coordinator::new(&config, RunOptions::default(), Box::new(RecordingSink::default())).unwrap();
    let summary = first.run(&mut session()).await.unwrap();
    assert_eq!(summary.downloaded, 2);

    let mut second =
        Coordinator::new(&config, RunOptions::default(), Box::new(RecordingSink::default())).unwrap();
    let summary = second.run(&mut session()).await.unwrap();
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.skipped, 3);

    // The page itself is always refreshed.
    assert!(dir.path().join("2425/algebra/index.html").exists());
}

#[tokio::test]
async fn test_failed_resources_are_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/course_builder/2425/geometry/",
        r#"<a href="missing.pdf">Missing</a><a href="present.pdf">Present</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/course_builder/2425/geometry/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_resource(&server, "/course_builder/2425/geometry/present.pdf", b"ok", 1).await;
    Mock::given(method("GET"))
        .and(path("/course_builder/2425/closed/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let extra = format!(
        r#"
[[unit]]
label = "Geometry"
url = "{base}/course_builder/2425/geometry/"

[[unit]]
label = "Closed"
url = "{base}/course_builder/2425/closed/"
"#,
        base = server.uri()
    );
    // The Algebra page is not mounted: wiremock answers 404 and the unit fails.
    let config = test_config(&server, dir.path(), &extra);

    let mut coordinator =
        Coordinator::new(&config, RunOptions::default(), Box::new(RecordingSink::default())).unwrap();
    let summary = coordinator.run(&mut session()).await.unwrap();

    assert_eq!(summary.units_total, 3);
    assert_eq!(summary.units_failed, 2);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed_resources, 1);
    assert!(!dir.path().join("2425/geometry/missing.pdf").exists());

    let report_path = summary.report.unwrap();
    assert_eq!(report_path, dir.path().join("2425/missing_files.txt"));

    let report = std::fs::read_to_string(report_path).unwrap();
    let lines: Vec<&str> = report.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().any(|l| l.starts_with("Algebra :: ")));
    assert!(lines.contains(&format!(
        "Geometry :: {}/course_builder/2425/geometry/missing.pdf :: HTTP 404",
        server.uri()
    )
    .as_str()));
    assert!(lines.iter().any(|l| l.starts_with("Closed :: ") && l.contains("HTTP 500")));
}

#[tokio::test]
async fn test_unit_filter_skips_report() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/course_builder/2425/algebra/", r#"<a href="gone.pdf">Gone</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/course_builder/2425/algebra/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server, dir.path(), "");
    let options = RunOptions {
        unit_filter: vec!["Algebra".to_string()],
        substitutions: None,
    };

    let mut coordinator =
        Coordinator::new(&config, options, Box::new(RecordingSink::default())).unwrap();
    let summary = coordinator.run(&mut session()).await.unwrap();

    assert_eq!(summary.failed_resources, 1);
    assert!(summary.report.is_none());
    assert!(!dir.path().join("2425/missing_files.txt").exists());
}
