//! Caller-owned XML documents.
//!
//! A [`Document`] is a reference-counted handle to a libxml2 tree. Runners and
//! schemas borrow a document by cloning the handle, which extends its lifetime
//! to theirs; the tree is freed when the last handle goes away.

use std::ffi::CString;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use libc::{c_char, c_int};
use tracing::debug;

use crate::collector::{CollectPolicy, CollectorScope};
use crate::error::{DocumentError, DocumentResult, Result, XsdError};
use crate::libxml2::{XmlDoc, xmlFreeDoc, xmlReadMemory};

const IN_MEMORY_NAME: &str = "<memory>";

/// Parsed XML document
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    ptr: NonNull<XmlDoc>,
    name: Option<String>,
}

// Safety: the tree is never mutated after parsing. The engine only reads it,
// and every engine call runs under the collector's engine lock.
unsafe impl Send for DocumentInner {}
unsafe impl Sync for DocumentInner {}

impl Drop for DocumentInner {
    fn drop(&mut self) {
        unsafe { xmlFreeDoc(self.ptr.as_ptr()) }
    }
}

impl Document {
    /// Parse a document held in a string
    pub fn parse_str(source: &str) -> DocumentResult<Self> {
        Self::parse_bytes(source.as_bytes())
    }

    /// Parse a document from raw bytes; the encoding is taken from the XML declaration
    pub fn parse_bytes(source: &[u8]) -> DocumentResult<Self> {
        Self::parse_impl(source, None)
    }

    /// Parse raw bytes under a name (usually a path or URL).
    ///
    /// The name becomes the document URL: diagnostics carry it, and relative
    /// `xs:include`/`xs:import` locations resolve against it.
    pub fn parse_bytes_named(source: &[u8], name: &str) -> DocumentResult<Self> {
        Self::parse_impl(source, Some(name))
    }

    /// Read and parse a file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| XsdError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse_bytes_named(&bytes, &path.to_string_lossy())?)
    }

    fn parse_impl(source: &[u8], name: Option<&str>) -> DocumentResult<Self> {
        let size =
            c_int::try_from(source.len()).map_err(|_| DocumentError::TooLarge { size: source.len() })?;
        let url = name
            .map(|n| {
                CString::new(n).map_err(|_| DocumentError::InvalidName {
                    name: n.to_string(),
                })
            })
            .transpose()?;
        let url_ptr = url.as_ref().map_or(std::ptr::null(), |u| u.as_ptr());

        let scope = CollectorScope::install(CollectPolicy::KeepAll);
        let raw = unsafe {
            xmlReadMemory(
                source.as_ptr() as *const c_char,
                size,
                url_ptr,
                std::ptr::null(),
                0,
            )
        };
        let diagnostics = scope.finish();

        let display_name = name.unwrap_or(IN_MEMORY_NAME).to_string();
        match NonNull::new(raw) {
            Some(ptr) => {
                if !diagnostics.is_empty() {
                    debug!(
                        document = %display_name,
                        count = diagnostics.len(),
                        "document parsed with recoverable diagnostics"
                    );
                }
                Ok(Self {
                    inner: Arc::new(DocumentInner {
                        ptr,
                        name: name.map(str::to_string),
                    }),
                })
            }
            None => Err(DocumentError::Malformed {
                name: display_name,
                diagnostics,
            }),
        }
    }

    /// Name given at parse time, if any
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Whether two handles refer to the same underlying tree
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this tree, including schemas compiled from it
    /// and in-flight tasks that captured it.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub(crate) fn as_ptr(&self) -> *mut XmlDoc {
        self.inner.ptr.as_ptr()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name().unwrap_or(IN_MEMORY_NAME))
            .field("handles", &self.handle_count())
            .finish()
    }
}
