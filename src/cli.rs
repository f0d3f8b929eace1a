use crate::config::{Config, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_SUFFIX};
use crate::workflow::{Operation, Request};
use clap::builder::{FalseyValueParser, NonEmptyStringValueParser};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdftrim")]
#[command(about = "Trim PDFs at a search string, by page list, or before/after a page")]
#[command(version)]
pub struct Cli {
    /// Directory for processed files
    #[arg(
        short,
        long,
        global = true,
        env = "PDF_TRIMMER_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR
    )]
    pub output_dir: PathBuf,

    /// Suffix appended to output file names
    #[arg(
        long,
        global = true,
        env = "PDF_TRIMMER_OUTPUT_SUFFIX",
        default_value = DEFAULT_OUTPUT_SUFFIX
    )]
    pub suffix: String,

    /// Verbose logging on stderr
    #[arg(
        short,
        long,
        global = true,
        env = "PDF_TRIMMER_DEBUG",
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            output_dir: self.output_dir.clone(),
            output_suffix: self.suffix.clone(),
            debug: self.debug,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Cut each PDF at the first occurrence of a text
    Search {
        /// Text to search for (case and spacing are ignored)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        text: String,

        /// PDF files or directories (default: current directory)
        files: Vec<PathBuf>,

        /// Keep the part from the match onwards instead
        #[arg(short, long)]
        invert: bool,
    },

    /// Delete pages (e.g., "1-3,7")
    Delete {
        /// Page list (e.g., "1-3,7")
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        pages: String,

        /// PDF files or directories (default: current directory)
        files: Vec<PathBuf>,
    },

    /// Keep only the given pages, deleting the rest
    Keep {
        /// Page list (e.g., "1-3,7")
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        pages: String,

        /// PDF files or directories (default: current directory)
        files: Vec<PathBuf>,
    },

    /// Delete pages before and/or after a page
    #[command(group(ArgGroup::new("bound").args(["before", "after"]).required(true).multiple(true)))]
    Cut {
        /// Delete every page before this one
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        before: Option<u32>,

        /// Delete every page after this one
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        after: Option<u32>,

        /// Keep the selected pages and delete the rest instead
        #[arg(short, long)]
        invert: bool,

        /// PDF files or directories (default: current directory)
        files: Vec<PathBuf>,
    },
}

impl Commands {
    /// The trimming request for this command, or `None` for `mcp`.
    pub fn into_request(self) -> Option<Request> {
        let (operation, invert, inputs) = match self {
            Commands::Mcp => return None,
            Commands::Search {
                text,
                files,
                invert,
            } => (Operation::Search { text }, invert, files),
            Commands::Delete { pages, files } => (Operation::Delete { spec: pages }, false, files),
            Commands::Keep { pages, files } => (Operation::Delete { spec: pages }, true, files),
            Commands::Cut {
                before,
                after,
                invert,
                files,
            } => (Operation::Cut { before, after }, invert, files),
        };
        Some(Request {
            operation,
            invert,
            inputs,
        })
    }
}
