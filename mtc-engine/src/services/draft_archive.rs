//! Draft archive assembly
//!
//! Packages the generated draft text of every applicable book into one
//! downloadable zip archive, reporting incremental progress through a
//! watch channel.
//!
//! Per-book fetch failures are logged and the book is skipped; only the
//! aggregate "zero files" case is an error. A partial archive trades
//! completeness for robustness against per-book transient failures.

use crate::api::MachineApi;
use crate::notify::ConnectivityProbe;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mtc_common::models::{BookRef, BuildJob};
use mtc_common::{Error, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Identity of the project whose draft is being packaged
#[derive(Debug, Clone)]
pub struct ProjectRef {
    pub id: String,
    pub short_name: String,
}

/// Books-packaged-so-far counter; `(0, 0)` outside an assembly run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DraftProgress {
    pub current: usize,
    pub total: usize,
}

/// Fallback book discovery when build provenance records no ranges:
/// scans the target project's structure for books with any generated
/// chapter
#[async_trait]
pub trait DraftBookSource: Send + Sync {
    async fn books_with_drafts(&self, project_id: &str) -> Result<Vec<BookRef>>;
}

/// Book source for hosts without project-structure access
#[derive(Debug, Default)]
pub struct EmptyBookSource;

#[async_trait]
impl DraftBookSource for EmptyBookSource {
    async fn books_with_drafts(&self, _project_id: &str) -> Result<Vec<BookRef>> {
        Ok(Vec::new())
    }
}

/// Client-side file save primitive for the finished archive
pub trait FileSaver: Send + Sync {
    fn save_file(&self, file_name: &str, contents: &[u8]) -> Result<()>;
}

/// Saves archives into a fixed directory
#[derive(Debug)]
pub struct DiskFileSaver {
    directory: PathBuf,
}

impl DiskFileSaver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl FileSaver for DiskFileSaver {
    fn save_file(&self, file_name: &str, contents: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(file_name);
        std::fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), "draft archive saved");
        Ok(())
    }
}

/// Fan-out per-book fetch of generated text, packaged into one archive
pub struct DraftArchiveAssembler {
    api: Arc<MachineApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    book_source: Arc<dyn DraftBookSource>,
    saver: Arc<dyn FileSaver>,
    progress: watch::Sender<DraftProgress>,
}

impl DraftArchiveAssembler {
    pub fn new(
        api: Arc<MachineApi>,
        connectivity: Arc<dyn ConnectivityProbe>,
        book_source: Arc<dyn DraftBookSource>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let (progress, _) = watch::channel(DraftProgress::default());
        Self {
            api,
            connectivity,
            book_source,
            saver,
            progress,
        }
    }

    /// Subscribe to `(current, total)` packaging progress
    pub fn progress(&self) -> watch::Receiver<DraftProgress> {
        self.progress.subscribe()
    }

    /// Assemble and save the draft archive for a project
    ///
    /// `last_completed` supplies the book set and the generation timestamp
    /// when known. Once started, every per-book fetch settles before the
    /// aggregate decision; there is no mid-flight cancellation.
    pub async fn download_generated_draft(
        &self,
        project: &ProjectRef,
        last_completed: Option<&BuildJob>,
    ) -> Result<()> {
        if !self.connectivity.is_online() {
            return Err(Error::Network("client is offline".to_string()));
        }
        self.progress.send_replace(DraftProgress::default());

        let mut books = last_completed.map(books_from_provenance).unwrap_or_default();
        if books.is_empty() {
            books = match self.book_source.books_with_drafts(&project.id).await {
                Ok(books) => books,
                Err(e) => {
                    tracing::warn!(project_id = %project.id, error = %e, "book scan failed");
                    Vec::new()
                }
            };
        }

        let timestamp = last_completed
            .and_then(|build| build.additional_info.as_ref())
            .and_then(|info| info.date_finished);

        let total = books.len();
        let completed = AtomicUsize::new(0);
        let fetches = books.iter().map(|book| {
            let completed = &completed;
            let progress = &self.progress;
            let api = &self.api;
            async move {
                match api
                    .get_pretranslation_text(&project.id, &book.code, 0, timestamp)
                    .await
                {
                    Ok(text) => {
                        let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        progress.send_replace(DraftProgress { current, total });
                        Some((draft_file_name(book, &project.short_name), text))
                    }
                    Err(e) => {
                        tracing::warn!(book = %book.code, error = %e, "draft fetch failed; book skipped");
                        None
                    }
                }
            }
        });

        let mut files: Vec<(String, String)> =
            join_all(fetches).await.into_iter().flatten().collect();

        if files.is_empty() {
            self.progress.send_replace(DraftProgress::default());
            return Err(Error::NothingToDownload);
        }

        // Fetches complete in arbitrary order; the archive lists books in
        // canon order
        files.sort();
        let bytes = build_zip(&files)?;
        self.saver
            .save_file(&archive_file_name(&project.short_name, timestamp), &bytes)?;

        self.progress.send_replace(DraftProgress::default());
        Ok(())
    }
}

/// Book set recorded on a build's provenance metadata, de-duplicated and
/// in canon order; unknown codes are dropped
fn books_from_provenance(build: &BuildJob) -> Vec<BookRef> {
    let Some(info) = &build.additional_info else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut books = Vec::new();
    for range in &info.translation_ranges {
        for code in range.scripture_range.split(';').filter(|c| !c.is_empty()) {
            if !seen.insert(code.to_ascii_uppercase()) {
                continue;
            }
            match BookRef::from_code(code) {
                Some(book) => books.push(book),
                None => tracing::warn!(code, "unknown book code in build provenance"),
            }
        }
    }
    books.sort_by_key(|book| book.number);
    books
}

/// Deterministic per-book filename: zero-padded canon ordinal + book code
/// + project short name
fn draft_file_name(book: &BookRef, short_name: &str) -> String {
    format!("{:02}{}{}.txt", book.number, book.code, short_name)
}

fn archive_file_name(short_name: &str, timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => format!("{} draft {}.zip", short_name, ts.format("%Y-%m-%d")),
        None => "Translation Draft.zip".to_string(),
    }
}

fn build_zip(files: &[(String, String)]) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, text) in files {
        writer
            .start_file(name, options)
            .map_err(|e| Error::Archive(e.to_string()))?;
        writer.write_all(text.as_bytes())?;
    }
    let cursor = writer.finish().map_err(|e| Error::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
