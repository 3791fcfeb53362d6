//! Local delivery: export directory and standard output.

use crate::notify::{Notifier, NotifyError};
use crate::report::Document;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes each report into an export directory.
pub struct FileNotifier {
    dir: PathBuf,
}

impl FileNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name for a report generated at `at`.
    pub fn file_name(at: DateTime<Utc>, extension: &str) -> String {
        format!("birdweather_report_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `document` with a name stamped now and return its path.
    pub fn write(&self, document: &Document) -> Result<PathBuf, NotifyError> {
        self.write_at(document, Utc::now())
    }

    /// Write `document` with a name stamped `at` and return its path.
    pub fn write_at(&self, document: &Document, at: DateTime<Utc>) -> Result<PathBuf, NotifyError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            NotifyError::Io(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self
            .dir
            .join(Self::file_name(at, document.format.extension()));
        std::fs::write(&path, &document.body)
            .map_err(|e| NotifyError::Io(format!("Failed to write {}: {e}", path.display())))?;
        Ok(path)
    }
}

impl Notifier for FileNotifier {
    fn name(&self) -> &'static str {
        "file"
    }

    fn deliver(&self, document: &Document) -> Result<(), NotifyError> {
        let path = self.write(document)?;
        tracing::info!(path = %path.display(), bytes = document.body.len(), "Report written");
        Ok(())
    }
}

/// Prints the report body to standard output.
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn deliver(&self, document: &Document) -> Result<(), NotifyError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(document.body.as_bytes())
            .and_then(|_| handle.flush())
            .map_err(|e| NotifyError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportFormat, REPORT_SUBJECT};
    use chrono::TimeZone;

    fn document() -> Document {
        Document {
            subject: REPORT_SUBJECT.to_string(),
            format: ReportFormat::Html,
            body: "<html></html>".to_string(),
        }
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 7, 30, 5).unwrap();
        assert_eq!(
            FileNotifier::file_name(at, "html"),
            "birdweather_report_20240502_073005.html"
        );
    }

    #[test]
    fn test_writes_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = FileNotifier::new(dir.path().join("reports"));

        let path = notifier.write(&document()).unwrap();

        assert!(path.starts_with(dir.path().join("reports")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_repeated_writes_return_each_path() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = FileNotifier::new(dir.path());
        let first = Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 3, 7, 0, 0).unwrap();

        let a = notifier.write_at(&document(), first).unwrap();
        let b = notifier.write_at(&document(), second).unwrap();

        assert_ne!(a, b);
        assert_eq!(
            b.file_name().unwrap().to_str().unwrap(),
            "birdweather_report_20240503_070000.html"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_deliver_writes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = FileNotifier::new(dir.path());

        notifier.deliver(&document()).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let notifier = FileNotifier::new(&blocker);
        assert!(matches!(
            notifier.deliver(&document()),
            Err(NotifyError::Io(_))
        ));
    }
}
