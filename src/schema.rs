//! Compiled XSD schemas.
//!
//! A libxml2 schema compiled from a document keeps pointers into that document,
//! so a [`Schema`] holds a handle to its source [`Document`]. The document can
//! never be freed while the schema is reachable, whatever the caller does with
//! its own handle.

use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::diagnostic::DiagnosticList;
use crate::document::Document;
use crate::error::{Result, SetupResult};
use crate::libxml2::{XmlSchema, xmlSchemaFree};
use crate::runner;

/// Immutable compiled schema; cheap to clone and safe to share across threads
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    ptr: NonNull<XmlSchema>,
    // Declared after `ptr` and only released once `Drop::drop` has freed the
    // schema, so the document always outlives it.
    source: Document,
}

// Safety: libxml2 schema structures are read-only after parsing, and every
// validation against them runs under the engine lock.
unsafe impl Send for SchemaInner {}
unsafe impl Sync for SchemaInner {}

impl Drop for SchemaInner {
    fn drop(&mut self) {
        // Frees only the schema's own structures. libxml2 marks a caller-supplied
        // source document as preserved, so its tree stays with `source`.
        unsafe { xmlSchemaFree(self.ptr.as_ptr()) }
    }
}

impl Schema {
    pub(crate) fn from_raw(ptr: NonNull<XmlSchema>, source: Document) -> Self {
        Self {
            inner: Arc::new(SchemaInner { ptr, source }),
        }
    }

    /// Compile a schema from an already parsed document
    pub fn compile(document: &Document) -> SetupResult<Self> {
        runner::compile_schema(document)
    }

    /// Parse and compile a schema held in a string
    pub fn parse_str(source: &str) -> Result<Self> {
        let document = Document::parse_str(source)?;
        Ok(Self::compile(&document)?)
    }

    /// Read, parse and compile a schema file.
    ///
    /// Relative includes and imports resolve against the file's location.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let document = Document::parse_file(path)?;
        Ok(Self::compile(&document)?)
    }

    /// Validate a document, returning every diagnostic the engine reported
    pub fn validate(&self, document: &Document) -> SetupResult<DiagnosticList> {
        runner::validate(self, document)
    }

    /// Parse a string and validate it
    pub fn validate_str(&self, source: &str) -> Result<DiagnosticList> {
        let document = Document::parse_str(source)?;
        Ok(self.validate(&document)?)
    }

    /// Read, parse and validate a file
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<DiagnosticList> {
        let document = Document::parse_file(path)?;
        Ok(self.validate(&document)?)
    }

    /// The document this schema was compiled from
    pub fn source_document(&self) -> &Document {
        &self.inner.source
    }

    pub(crate) fn as_ptr(&self) -> *mut XmlSchema {
        self.inner.ptr.as_ptr()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("source", &self.inner.source)
            .finish_non_exhaustive()
    }
}
