use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::pdf::text::{extract_layout, find_text};
use crate::pdf::PdfDocument;
use crate::workflow::{process_file, Operation, Request};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindTextRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Text to search for (case and spacing are ignored)")]
    pub text: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TrimAtTextRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Text to cut at (case and spacing are ignored)")]
    pub text: String,
    #[schemars(
        description = "Keep the part from the match onwards instead of the part above it (default: false)"
    )]
    #[serde(default)]
    pub invert: bool,
    #[schemars(description = "Directory for the output file (default: server setting)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PagesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "1-based page list (e.g., '1-3,7')")]
    pub pages: String,
    #[schemars(description = "Directory for the output file (default: server setting)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CutPagesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Delete every page before this 1-based page")]
    pub before: Option<u32>,
    #[schemars(description = "Delete every page after this 1-based page")]
    pub after: Option<u32>,
    #[schemars(description = "Keep the selected pages and delete the rest instead (default: false)")]
    #[serde(default)]
    pub invert: bool,
    #[schemars(description = "Directory for the output file (default: server setting)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    config: Config,
}

impl PdfServer {
    pub fn new(config: Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    fn trim(&self, path: String, output_dir: Option<String>, operation: Operation, invert: bool) -> String {
        let request = Request {
            operation,
            invert,
            inputs: vec![PathBuf::from(&path)],
        };
        if let Err(e) = request.validate() {
            return format!("Error: {}", e);
        }

        let config = self.config.with_output_dir(output_dir.map(PathBuf::from));
        match process_file(&request, &request.inputs[0], &config) {
            Ok(report) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Find the first page containing a text, without modifying the PDF")]
    fn pdf_find_text(&self, Parameters(req): Parameters<FindTextRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };
        let hit = match extract_layout(&doc.doc).and_then(|layouts| find_text(&layouts, &req.text)) {
            Ok(hit) => hit,
            Err(e) => return format!("Error: {:#}", e),
        };

        let result = FindTextResult {
            path: req.path,
            found: hit.is_some(),
            page: hit.map(|h| h.page_index + 1),
            page_count: doc.page_count(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(
        description = "Cut a PDF at the first occurrence of a text: remove everything from the match on (or, inverted, everything above it), then drop blank pages. Writes <stem>_edit.pdf into the output directory."
    )]
    fn pdf_trim_at_text(&self, Parameters(req): Parameters<TrimAtTextRequest>) -> String {
        self.trim(
            req.path,
            req.output_dir,
            Operation::Search { text: req.text },
            req.invert,
        )
    }

    #[tool(description = "Delete pages from a PDF using a page list like '1-3,7', then drop blank pages")]
    fn pdf_delete_pages(&self, Parameters(req): Parameters<PagesRequest>) -> String {
        self.trim(
            req.path,
            req.output_dir,
            Operation::Delete { spec: req.pages },
            false,
        )
    }

    #[tool(description = "Keep only the pages in a page list like '1-3,7', deleting the rest, then drop blank pages")]
    fn pdf_keep_pages(&self, Parameters(req): Parameters<PagesRequest>) -> String {
        self.trim(
            req.path,
            req.output_dir,
            Operation::Delete { spec: req.pages },
            true,
        )
    }

    #[tool(description = "Delete all pages before and/or after a given page (or keep only those when inverted), then drop blank pages")]
    fn pdf_cut_pages(&self, Parameters(req): Parameters<CutPagesRequest>) -> String {
        self.trim(
            req.path,
            req.output_dir,
            Operation::Cut {
                before: req.before,
                after: req.after,
            },
            req.invert,
        )
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FindTextResult {
    pub path: String,
    pub found: bool,
    pub page: Option<u32>,
    pub page_count: u32,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF trimming tools. Use pdf_find_text to locate a heading, pdf_trim_at_text to \
                 cut a document there, pdf_delete_pages or pdf_keep_pages with page lists like \
                 '1-3,7', and pdf_cut_pages to drop everything before or after a page. Every \
                 trim writes a new file and never modifies the input."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    info!(output_dir = %config.output_dir.display(), "starting MCP server");
    let server = PdfServer::new(config);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
