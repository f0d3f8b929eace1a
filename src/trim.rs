//! Trimming operations on a single file.

use crate::config::Config;
use crate::files;
use crate::page_spec::{
    compute_before_after, compute_indices_to_delete, indices_after_page, indices_before_page,
    DeleteSpec,
};
use crate::pdf::blank::remove_blank_pages;
use crate::pdf::text::{extract_layout, find_text};
use crate::pdf::{PdfDocument, Rect};
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EMPTY_OUTPUT: &str = "Deletion would remove all pages; refusing to create an empty PDF.";
const ALL_BLANK: &str = "Every remaining page is blank; refusing to create an empty PDF.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Search,
    Delete,
    BeforeAfter,
}

/// What a successful operation did to one file.
#[derive(Debug, Clone, Serialize)]
pub struct TrimReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub operation: OperationKind,
    pub invert: bool,
    /// 1-based, ascending.
    pub deleted_pages: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept_pages: Option<Vec<u32>>,
    pub blank_pages_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_found: Option<bool>,
    pub message: String,
}

impl fmt::Display for TrimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed: {} -> {} {}",
            file_name(&self.input),
            file_name(&self.output),
            self.message
        )
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn selection_message(deleted: usize, kept: Option<usize>, blank: usize) -> String {
    match kept {
        Some(kept) => format!(
            "(kept {} page(s), deleted {} page(s), removed {} blank page(s))",
            kept, deleted, blank
        ),
        None => format!(
            "(deleted {} page(s), removed {} blank page(s))",
            deleted, blank
        ),
    }
}

/// Input, output, and the opened document for one operation.
struct Job {
    input: PathBuf,
    output: PathBuf,
    doc: PdfDocument,
}

impl Job {
    fn open(input: &Path, config: &Config) -> Result<Self> {
        let input = files::validate_input_file(input)?;
        let output_dir = files::ensure_output_dir(&config.output_dir)?;
        let output = files::output_path(&input, &output_dir, &config.output_suffix);
        let doc = PdfDocument::open(&input)?;
        Ok(Job { input, output, doc })
    }

    fn delete(&mut self, pages: &DeleteSpec) -> Result<()> {
        let page_count = self.doc.page_count();
        if page_count > 0 && pages.count() >= page_count as usize {
            bail!(EMPTY_OUTPUT);
        }
        self.doc.delete_pages_desc(pages.indices())
    }

    /// Strip blank pages and write the output. Returns the number of blank
    /// pages removed.
    fn finish(&mut self, clipped: Option<(u32, Rect)>) -> Result<usize> {
        let blank = remove_blank_pages(&mut self.doc, clipped)?;
        if self.doc.page_count() == 0 {
            bail!(ALL_BLANK);
        }
        self.doc.save(&self.output)?;
        info!(
            input = %self.input.display(),
            output = %self.output.display(),
            blank,
            "wrote trimmed document"
        );
        Ok(blank)
    }

    fn report(self, operation: OperationKind, invert: bool, message: String) -> TrimReport {
        TrimReport {
            input: self.input,
            output: self.output,
            operation,
            invert,
            deleted_pages: Vec::new(),
            kept_pages: None,
            blank_pages_removed: 0,
            trim_page: None,
            search_found: None,
            message,
        }
    }
}

/// Cut the document at the first occurrence of `needle`.
///
/// Normally everything from the match down is removed: later pages are
/// deleted and the match page is clipped just above the match. With `invert`
/// the opposite part is kept: the match page from the match down, plus all
/// later pages. Without a match the document is only cleaned of blank pages.
pub fn trim_at_text(input: &Path, needle: &str, invert: bool, config: &Config) -> Result<TrimReport> {
    let mut job = Job::open(input, config)?;
    let layouts = extract_layout(&job.doc.doc)?;

    let Some(hit) = find_text(&layouts, needle)? else {
        debug!("search string not found, only removing blank pages");
        let blank = job.finish(None)?;
        let message = if blank > 0 {
            format!("(no trim needed, removed {} blank page(s))", blank)
        } else {
            "(no changes needed)".to_string()
        };
        let mut report = job.report(OperationKind::Search, invert, message);
        report.blank_pages_removed = blank;
        report.search_found = Some(false);
        return Ok(report);
    };

    let page_count = job.doc.page_count();
    let trim_page = hit.page_index + 1;
    let media_box = job.doc.media_box(hit.page_index)?;
    debug!(page = trim_page, top = hit.top, invert, "trimming at search hit");

    let (region, to_delete, clipped_index) = if invert {
        (
            media_box.below(hit.top),
            indices_before_page(trim_page, page_count)?,
            0,
        )
    } else {
        (
            media_box.above(hit.top),
            indices_after_page(trim_page, page_count)?,
            hit.page_index,
        )
    };

    let to_delete = DeleteSpec::from_indices(to_delete);
    job.doc.clip_page(hit.page_index, region)?;
    job.doc.delete_pages_desc(to_delete.indices())?;
    let blank = job.finish(Some((clipped_index, region)))?;

    let message = if invert {
        format!("(trimmed (inverted) at page {}, blank pages removed)", trim_page)
    } else {
        format!("(trimmed at page {}, blank pages removed)", trim_page)
    };
    let mut report = job.report(OperationKind::Search, invert, message);
    report.deleted_pages = to_delete.as_one_based_sorted();
    report.blank_pages_removed = blank;
    report.trim_page = Some(trim_page);
    report.search_found = Some(true);
    Ok(report)
}

/// Delete `to_delete`, strip blanks, and save. `kept` is set when the
/// selection was a keep set.
fn apply_selection(
    mut job: Job,
    operation: OperationKind,
    invert: bool,
    to_delete: Vec<u32>,
    kept: Option<Vec<u32>>,
) -> Result<TrimReport> {
    let to_delete = DeleteSpec::from_indices(to_delete);
    let kept = kept.map(DeleteSpec::from_indices);
    job.delete(&to_delete)?;
    let blank = job.finish(None)?;

    let message = selection_message(to_delete.count(), kept.as_ref().map(DeleteSpec::count), blank);
    let mut report = job.report(operation, invert, message);
    report.deleted_pages = to_delete.as_one_based_sorted();
    report.kept_pages = kept.as_ref().map(DeleteSpec::as_one_based_sorted);
    report.blank_pages_removed = blank;
    Ok(report)
}

/// Delete the pages named by `spec` ("1-4,7"), or keep only them when
/// `invert` is set.
pub fn delete_pages(input: &Path, spec: &str, invert: bool, config: &Config) -> Result<TrimReport> {
    let job = Job::open(input, config)?;
    let (to_delete, kept) = compute_indices_to_delete(spec, job.doc.page_count(), invert)?;
    apply_selection(job, OperationKind::Delete, invert, to_delete, kept)
}

/// Delete the pages before `before` and/or after `after`, or keep only those
/// pages when `invert` is set.
pub fn cut_pages(
    input: &Path,
    before: Option<u32>,
    after: Option<u32>,
    invert: bool,
    config: &Config,
) -> Result<TrimReport> {
    let job = Job::open(input, config)?;
    let (to_delete, kept) = compute_before_after(before, after, job.doc.page_count(), invert)?;
    apply_selection(job, OperationKind::BeforeAfter, invert, to_delete, kept)
}
