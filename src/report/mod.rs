//! Missing-resource report
//!
//! When a whole tree is mirrored, every resource or unit that could not be
//! mirrored is collected here and written as one `label :: url :: reason` line
//! per failure.

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the report file under the selected subtree
pub const REPORT_FILE_NAME: &str = "missing_files.txt";

/// One failed resource or unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLogEntry {
    pub unit_label: String,
    pub url: String,
    pub reason: String,
}

impl fmt::Display for MissingLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep one entry per line even if a reason spans several.
        let reason = self.reason.replace(['\r', '\n'], " ");
        write!(f, "{} :: {} :: {}", self.unit_label, self.url, reason)
    }
}

/// In-memory list of failures for the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingLog {
    entries: Vec<MissingLogEntry>,
}

impl MissingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, unit_label: &str, url: &str, reason: impl Into<String>) {
        self.entries.push(MissingLogEntry {
            unit_label: unit_label.to_string(),
            url: url.to_string(),
            reason: reason.into(),
        });
    }

    pub fn entries(&self) -> &[MissingLogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Renders the report body
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Writes the report to `<mirror_root>/<subtree>/missing_files.txt`
    ///
    /// Nothing is written when the log is empty; the path is returned only when
    /// a file was produced.
    pub fn write(&self, mirror_root: &Path, subtree: &str) -> std::io::Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let dir = mirror_root.join(subtree);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(REPORT_FILE_NAME);

        let header = format!(
            "# {} missing item(s), generated {}\n",
            self.entries.len(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        std::fs::write(&path, header + &self.render())?;

        Ok(Some(path))
    }
}
