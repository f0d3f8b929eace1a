use crate::config::Config;
use crate::files;
use crate::trim::{self, TrimReport};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Cut at the first occurrence of `text`.
    Search { text: String },
    /// Delete (or keep, when inverted) the pages in `spec`.
    Delete { spec: String },
    /// Delete the pages before `before` and/or after `after`.
    Cut {
        before: Option<u32>,
        after: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub operation: Operation,
    pub invert: bool,
    /// Files or directories. Empty means every PDF in the current directory.
    pub inputs: Vec<PathBuf>,
}

impl Request {
    /// Reject arguments that can never succeed, before any file is opened.
    pub fn validate(&self) -> Result<()> {
        match &self.operation {
            Operation::Search { text } if text.trim().is_empty() => {
                bail!("Search string cannot be empty")
            }
            Operation::Delete { spec } if spec.trim().is_empty() => {
                let kind = if self.invert { "Keep" } else { "Delete" };
                bail!("{} specification cannot be empty", kind)
            }
            Operation::Cut {
                before: None,
                after: None,
            } => bail!("At least one of before page or after page must be provided"),
            Operation::Cut { before, after } => {
                if before.is_some_and(|p| p < 1) || after.is_some_and(|p| p < 1) {
                    bail!("Page numbers must be >= 1");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn describe(&self) -> String {
        match (&self.operation, self.invert) {
            (Operation::Search { text }, false) => {
                format!("Trimming at '{}' (keeping content above it)", text)
            }
            (Operation::Search { text }, true) => {
                format!("Trimming at '{}' (keeping content from it onwards)", text)
            }
            (Operation::Delete { spec }, false) => format!("Deleting pages {}", spec),
            (Operation::Delete { spec }, true) => format!("Keeping only pages {}", spec),
            (Operation::Cut { before, after }, invert) => {
                let mut bounds = Vec::new();
                if let Some(before) = before {
                    bounds.push(format!("before page {}", before));
                }
                if let Some(after) = after {
                    bounds.push(format!("after page {}", after));
                }
                let verb = if invert { "Keeping only" } else { "Deleting" };
                format!("{} pages {}", verb, bounds.join(" and "))
            }
        }
    }
}

/// Apply the requested operation to one file.
pub fn process_file(request: &Request, input: &Path, config: &Config) -> Result<TrimReport> {
    debug!(input = %input.display(), operation = ?request.operation, "processing file");
    match &request.operation {
        Operation::Search { text } => trim::trim_at_text(input, text, request.invert, config),
        Operation::Delete { spec } => trim::delete_pages(input, spec, request.invert, config),
        Operation::Cut { before, after } => {
            trim::cut_pages(input, *before, *after, request.invert, config)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub successful: usize,
    pub failed: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Expand the request's inputs into the files to process. Directories (and
/// an empty input list, meaning the current directory) contribute the PDFs
/// directly inside them; explicit files are passed through for validation.
pub fn collect_inputs(inputs: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let processed = config.processed_suffix();
    if inputs.is_empty() {
        return files::find_pdf_files(Path::new("."), &processed);
    }

    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(files::find_pdf_files(input, &processed)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn no_files_message(inputs: &[PathBuf]) -> String {
    if inputs.is_empty() {
        return "No PDF files found in current directory.".to_string();
    }
    let searched: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
    format!("No PDF files found in: {}", searched.join(", "))
}

/// Process every input, reporting each result as it happens. A failing file
/// is reported and skipped; it does not stop the run.
pub fn run(request: &Request, config: &Config) -> Result<Summary> {
    request.validate()?;
    let inputs = collect_inputs(&request.inputs, config)?;

    if inputs.is_empty() {
        println!("{}", no_files_message(&request.inputs));
        return Ok(Summary::default());
    }

    println!("{}", request.describe());
    if inputs.len() > 1 {
        println!("Found {} PDF file(s) to process", inputs.len());
    }

    let mut summary = Summary::default();
    for input in &inputs {
        match process_file(request, input, config) {
            Ok(report) => {
                println!("{}", report);
                summary.successful += 1;
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "file failed");
                eprintln!("Failed to process {}: {:#}", input.display(), e);
                summary.failed += 1;
            }
        }
    }

    println!(
        "Processing complete: {} successful, {} failed",
        summary.successful, summary.failed
    );
    Ok(summary)
}
