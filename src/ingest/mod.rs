//! Ingestion driver: walk the corpus and push every message through
//! classify → parse → map → upload, one file at a time.

pub mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{IndexerError, Result};
use crate::index::bootstrap::ensure_index;
use crate::index::transport::IndexTransport;
use crate::index::uploader::{UploadOutcome, Uploader};
use crate::model::document::MailDocument;
use crate::model::schema::IndexSchema;
use crate::parser::message::MailMessage;
use crate::parser::path::{classify, PathLayout};

pub use report::{FileOutcome, IngestReport, SkipKind};

/// Ensure the index exists, then ingest every file under `root`.
///
/// With `dry_run` nothing is sent: files are classified and parsed only.
pub fn run_pipeline<T: IndexTransport + ?Sized>(
    root: &Path,
    config: &Config,
    transport: &T,
    dry_run: bool,
    progress: Option<&dyn Fn(&IngestReport)>,
) -> Result<IngestReport> {
    let schema = IndexSchema::from_config(config);
    if !dry_run {
        ensure_index(transport, &schema)?;
    }
    Ingestor::new(root, config, transport, &schema)
        .dry_run(dry_run)
        .run(progress)
}

/// Sequential corpus walker.
pub struct Ingestor<'a, T: IndexTransport + ?Sized> {
    root: PathBuf,
    layout: PathLayout,
    continue_on_walk_error: bool,
    dry_run: bool,
    uploader: Uploader<'a, T>,
    report: IngestReport,
}

impl<'a, T: IndexTransport + ?Sized> Ingestor<'a, T> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &Config,
        transport: &'a T,
        schema: &'a IndexSchema,
    ) -> Self {
        Self {
            root: root.into(),
            layout: PathLayout::from(&config.layout),
            continue_on_walk_error: config.ingest.continue_on_walk_error,
            dry_run: false,
            uploader: Uploader::new(
                transport,
                schema,
                Duration::from_millis(config.ingest.request_delay_ms),
            ),
            report: IngestReport::default(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Walk the corpus in file-name order and process every regular file.
    ///
    /// Per-file problems are logged and counted. Network failures and, unless
    /// `continue_on_walk_error` is set, filesystem errors end the run.
    pub fn run(mut self, progress: Option<&dyn Fn(&IngestReport)>) -> Result<IngestReport> {
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "corpus root '{}' is not a directory",
                self.root.display()
            )));
        }
        info!(root = %self.root.display(), dry_run = self.dry_run, "Walking corpus");

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let result = match entry {
                Ok(entry) if !entry.file_type().is_file() => continue,
                Ok(entry) => self.process_file(entry.path()),
                Err(e) => Err(IndexerError::from(e)),
            };

            self.absorb(result)?;
            if let Some(cb) = progress {
                cb(&self.report);
            }
        }

        info!(
            files = self.report.files_seen,
            uploaded = self.report.uploaded,
            duplicates = self.report.duplicates,
            skipped = self.report.skipped(),
            "Corpus walk finished"
        );
        Ok(self.report)
    }

    /// Count one walk entry, applying the walk-error policy: filesystem
    /// errors end the run unless `continue_on_walk_error` is set.
    fn absorb(&mut self, result: Result<FileOutcome>) -> Result<()> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e @ (IndexerError::Io { .. } | IndexerError::Walk(_)))
                if self.continue_on_walk_error =>
            {
                warn!(error = %e, "Skipping unreadable entry");
                FileOutcome::Skipped(SkipKind::Walk)
            }
            Err(e) => return Err(e),
        };
        self.report.record(&outcome);
        Ok(())
    }

    /// Take one file from discovery to its terminal state.
    pub fn process_file(&mut self, path: &Path) -> Result<FileOutcome> {
        let classified = match classify(&self.root, path, &self.layout) {
            Ok(c) => c,
            Err(reason) => {
                warn!(path = %path.display(), reason = %reason, "Not uploaded");
                return Ok(FileOutcome::Skipped(SkipKind::Path(reason)));
            }
        };

        let raw = std::fs::read(path).map_err(|e| IndexerError::io(path, e))?;
        self.report.bytes_read += raw.len() as u64;

        let document = match MailMessage::parse(&raw)
            .and_then(|message| MailDocument::from_parts(classified, message))
        {
            Ok(document) => document,
            Err(e) => return skip_file(path, e),
        };

        if self.dry_run {
            return Ok(FileOutcome::Validated);
        }

        match self.uploader.upload(&document)? {
            UploadOutcome::Uploaded => Ok(FileOutcome::Uploaded),
            UploadOutcome::SkippedAsDuplicate => Ok(FileOutcome::Duplicate),
            UploadOutcome::Failed { status } => {
                warn!(path = %path.display(), status, "Upload rejected by index");
                Ok(FileOutcome::UploadFailed { status })
            }
        }
    }
}

/// Turn a recoverable per-message error into a skip; pass anything else up.
fn skip_file(path: &Path, error: IndexerError) -> Result<FileOutcome> {
    if !error.is_recoverable() {
        return Err(error);
    }
    let kind = match &error {
        IndexerError::Parse { .. } => SkipKind::Parse,
        IndexerError::BodyRead { .. } => SkipKind::BodyRead,
        _ => SkipKind::Date,
    };
    warn!(path = %path.display(), error = %error, "Skipping message");
    Ok(FileOutcome::Skipped(kind))
}
