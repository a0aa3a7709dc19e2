//! # libxml-xsd
//!
//! Compile W3C XML Schemas and validate XML documents with libxml2, either
//! inline on the calling thread or on a bounded pool of Tokio blocking workers.
//!
//! Every engine message raised during an operation is captured as a structured
//! [`Diagnostic`] and returned with that operation's result; nothing is printed.
//!
//! ```no_run
//! use libxml_xsd::{Document, Schema};
//!
//! # fn main() -> libxml_xsd::Result<()> {
//! let schema = Schema::parse_file("order.xsd")?;
//! let document = Document::parse_file("order.xml")?;
//! for diagnostic in &schema.validate(&document)? {
//!     println!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod async_runner;
pub mod cli;
pub mod collector;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod libxml2;
pub mod output;
pub mod runner;
pub mod schema;

pub use async_runner::{AsyncRunner, RunnerConfig};
pub use cli::{Cli, ExecutionMode, OutputFormat, VerbosityLevel};
pub use collector::{CollectPolicy, CollectorScope, DiagnosticCollector};
pub use config::{Config, ConfigError, ConfigManager};
pub use diagnostic::{Diagnostic, DiagnosticList, Severity};
pub use document::Document;
pub use error::{DocumentError, DocumentResult, Result, SetupFailure, SetupResult, XsdError};
pub use output::{FileReport, FileStatus, Output, RunSummary};
pub use runner::{Outcome, compile_schema, validate};
pub use schema::Schema;
