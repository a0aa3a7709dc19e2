//! Synchronous operation runner.
//!
//! Compile and validate run inline on the calling thread. The work itself is a
//! [`Task`] whose [`execute`](Task::execute) is shared with the
//! [`AsyncRunner`](crate::AsyncRunner), so both flavours report setup failures
//! and diagnostics identically.

use std::ptr::NonNull;

use tracing::{debug, debug_span, warn};

use crate::collector::{CollectPolicy, CollectorScope};
use crate::diagnostic::DiagnosticList;
use crate::document::Document;
use crate::error::{SetupFailure, SetupResult};
use crate::libxml2::{SchemaParserContext, ValidationContext};
use crate::schema::Schema;

/// Compile a schema from a caller-owned document.
///
/// Warnings reported while compiling are dropped; errors are kept and returned
/// in [`SetupFailure::InvalidSchema`] when no schema comes out.
pub fn compile_schema(document: &Document) -> SetupResult<Schema> {
    Task::compile(document.clone()).execute().into_schema()
}

/// Validate `document` against `schema`.
///
/// A non-conforming document is not an error of this call: its problems come
/// back as a non-empty [`DiagnosticList`].
pub fn validate(schema: &Schema, document: &Document) -> SetupResult<DiagnosticList> {
    Task::validate(schema.clone(), document.clone())
        .execute()
        .into_diagnostics()
}

/// Result of exactly one completed operation
#[derive(Debug)]
pub enum Outcome {
    SchemaCreated(Schema),
    DiagnosticsProduced(DiagnosticList),
    SetupFailed(SetupFailure),
}

impl Outcome {
    pub fn into_schema(self) -> SetupResult<Schema> {
        match self {
            Outcome::SchemaCreated(schema) => Ok(schema),
            Outcome::SetupFailed(failure) => Err(failure),
            Outcome::DiagnosticsProduced(_) => Err(SetupFailure::Worker {
                details: "compile task produced a diagnostic list".to_string(),
            }),
        }
    }

    pub fn into_diagnostics(self) -> SetupResult<DiagnosticList> {
        match self {
            Outcome::DiagnosticsProduced(diagnostics) => Ok(diagnostics),
            Outcome::SetupFailed(failure) => Err(failure),
            Outcome::SchemaCreated(_) => Err(SetupFailure::Worker {
                details: "validate task produced a schema".to_string(),
            }),
        }
    }
}

/// One unit of engine work with its inputs captured by owning handles
#[derive(Debug)]
pub(crate) enum Task {
    Compile { document: Document },
    Validate { schema: Schema, document: Document },
}

impl Task {
    pub(crate) fn compile(document: Document) -> Self {
        Task::Compile { document }
    }

    pub(crate) fn validate(schema: Schema, document: Document) -> Self {
        Task::Validate { schema, document }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Task::Compile { .. } => "compile",
            Task::Validate { .. } => "validate",
        }
    }

    /// Run on the current thread. Always yields exactly one outcome.
    pub(crate) fn execute(self) -> Outcome {
        let _span = debug_span!("xsd_task", kind = self.kind()).entered();
        match self {
            Task::Compile { document } => match compile_document(&document) {
                Ok(schema) => Outcome::SchemaCreated(schema),
                Err(failure) => Outcome::SetupFailed(failure),
            },
            Task::Validate { schema, document } => match validate_document(&schema, &document) {
                Ok(diagnostics) => Outcome::DiagnosticsProduced(diagnostics),
                Err(failure) => Outcome::SetupFailed(failure),
            },
        }
    }
}

fn compile_document(document: &Document) -> SetupResult<Schema> {
    let scope = CollectorScope::install(CollectPolicy::ErrorsOnly);

    let Some(parser) = (unsafe { SchemaParserContext::from_document(document.as_ptr()) }) else {
        drop(scope);
        warn!(document = ?document.name(), "could not create schema parser context");
        return Err(SetupFailure::ParserContext);
    };
    let raw = parser.parse();
    drop(parser);
    let diagnostics = scope.finish();

    match NonNull::new(raw) {
        Some(ptr) => {
            debug!(document = ?document.name(), "schema compiled");
            Ok(Schema::from_raw(ptr, document.clone()))
        }
        None => {
            debug!(
                document = ?document.name(),
                errors = diagnostics.len(),
                "document is not a usable schema"
            );
            Err(SetupFailure::InvalidSchema { diagnostics })
        }
    }
}

fn validate_document(schema: &Schema, document: &Document) -> SetupResult<DiagnosticList> {
    let scope = CollectorScope::install(CollectPolicy::KeepAll);

    let Some(context) = (unsafe { ValidationContext::new(schema.as_ptr()) }) else {
        drop(scope);
        warn!("unable to create schema validation context");
        return Err(SetupFailure::ValidationContext);
    };
    let status = unsafe { context.validate_document(document.as_ptr()) };
    drop(context);
    let diagnostics = scope.finish();

    debug!(
        document = ?document.name(),
        status,
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "validation finished"
    );
    Ok(diagnostics)
}
