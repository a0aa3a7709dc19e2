//! Structured diagnostics reported by libxml2 during a single operation.

use std::ffi::CStr;
use std::fmt;

use libc::c_char;
use serde::{Deserialize, Serialize};

use crate::libxml2::{XML_ERR_ERROR, XML_ERR_FATAL, XML_ERR_WARNING, XmlError};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Map a libxml2 `xmlErrorLevel`. Fatal errors are reported as errors.
    fn from_level(level: libc::c_int) -> Option<Self> {
        match level {
            XML_ERR_WARNING => Some(Severity::Warning),
            XML_ERR_ERROR | XML_ERR_FATAL => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One error or warning record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// libxml2 error domain (`xmlErrorDomain`)
    pub domain: i32,
    /// libxml2 error code (`xmlParserErrors`)
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            domain: 0,
            code: 0,
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn with_location(mut self, file: Option<String>, line: u32, column: u32) -> Self {
        self.file = file;
        self.line = (line > 0).then_some(line);
        self.column = (column > 0).then_some(column);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Copy an engine error record into an owned diagnostic.
    ///
    /// Returns `None` for records that carry no severity (`XML_ERR_NONE`).
    ///
    /// # Safety
    ///
    /// `error` must be a record handed to a structured error callback; its
    /// string fields are only read for the duration of this call.
    pub(crate) unsafe fn from_raw(error: &XmlError) -> Option<Self> {
        let severity = Severity::from_level(error.level)?;
        let message = unsafe { owned_string(error.message) }
            .map(|m| m.trim_end().to_string())
            .unwrap_or_default();
        let file = unsafe { owned_string(error.file) };

        Some(Self {
            severity,
            message,
            domain: error.domain,
            code: error.code,
            file,
            line: u32::try_from(error.line).ok().filter(|&l| l > 0),
            // libxml2 stores the column in `int2`
            column: u32::try_from(error.int2).ok().filter(|&c| c > 0),
        })
    }
}

unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Some(c_str.to_string_lossy().into_owned())
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        if let Some(line) = self.line {
            write!(f, "{}:", line)?;
            if let Some(column) = self.column {
                write!(f, "{}:", column)?;
            }
        }
        if self.file.is_some() || self.line.is_some() {
            f.write_str(" ")?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Ordered diagnostics produced by exactly one operation.
///
/// Empty means the operation finished without any issue. Entries keep the
/// order the engine emitted them in and are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// True when at least one error-severity diagnostic is present
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Keep only error-severity diagnostics
    pub fn without_warnings(mut self) -> Self {
        self.diagnostics.retain(Diagnostic::is_error);
        self
    }
}

impl From<Vec<Diagnostic>> for DiagnosticList {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl FromIterator<Diagnostic> for DiagnosticList {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
