//! Per-file outcomes and the run report.

use serde::Serialize;

use crate::parser::path::SkipReason;

/// Why a file produced no document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipKind {
    Path(SkipReason),
    Parse,
    BodyRead,
    Date,
    /// Unreadable file or directory, only when walk errors are tolerated.
    Walk,
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Uploaded,
    Duplicate,
    UploadFailed { status: u16 },
    /// Parsed into a document but not sent (dry run).
    Validated,
    Skipped(SkipKind),
}

/// Counters for a whole ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files_seen: u64,
    pub bytes_read: u64,
    pub uploaded: u64,
    pub duplicates: u64,
    pub upload_failures: u64,
    pub validated: u64,
    pub skipped_path: u64,
    pub skipped_parse: u64,
    pub skipped_body: u64,
    pub skipped_date: u64,
    pub walk_errors: u64,
}

impl IngestReport {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Uploaded => self.uploaded += 1,
            FileOutcome::Duplicate => self.duplicates += 1,
            FileOutcome::UploadFailed { .. } => self.upload_failures += 1,
            FileOutcome::Validated => self.validated += 1,
            FileOutcome::Skipped(SkipKind::Path(_)) => self.skipped_path += 1,
            FileOutcome::Skipped(SkipKind::Parse) => self.skipped_parse += 1,
            FileOutcome::Skipped(SkipKind::BodyRead) => self.skipped_body += 1,
            FileOutcome::Skipped(SkipKind::Date) => self.skipped_date += 1,
            FileOutcome::Skipped(SkipKind::Walk) => self.walk_errors += 1,
        }
    }

    /// Files that never reached the index for a per-file reason.
    pub fn skipped(&self) -> u64 {
        self.skipped_path + self.skipped_parse + self.skipped_body + self.skipped_date + self.walk_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_outcome() {
        let mut report = IngestReport::default();
        report.record(&FileOutcome::Uploaded);
        report.record(&FileOutcome::Uploaded);
        report.record(&FileOutcome::Duplicate);
        report.record(&FileOutcome::UploadFailed { status: 500 });
        report.record(&FileOutcome::Skipped(SkipKind::Date));
        report.record(&FileOutcome::Skipped(SkipKind::Path(SkipReason::EmptyFolder)));

        assert_eq!(report.files_seen, 6);
        assert_eq!(report.uploaded, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.upload_failures, 1);
        assert_eq!(report.skipped_date, 1);
        assert_eq!(report.skipped_path, 1);
        assert_eq!(report.skipped(), 2);
    }
}
