//! LibXML2 FFI layer
//!
//! Raw declarations for the parts of libxml2 this crate drives, plus small RAII
//! wrappers for the short-lived parser and validation contexts.
//!
//! ## Thread Safety Strategy
//!
//! libxml2 reports errors through a single process-wide structured error
//! callback (`xmlSetStructuredErrorFunc`). That slot is not scoped to a call and
//! is not safe to swap concurrently, so every engine call that can report
//! diagnostics runs inside a [`CollectorScope`](crate::collector::CollectorScope),
//! which holds the engine lock for the whole "create context → run → teardown"
//! window. Documents and compiled schemas are immutable once built and are only
//! read by the engine.
//!
//! Global initialization (`xmlInitParser`) is NOT thread-safe and happens
//! exactly once through [`initialize`].

use std::ptr::NonNull;
use std::sync::Once;

use libc::{c_char, c_int, c_void};

static LIBXML2_INIT: Once = Once::new();

/// `xmlErrorLevel` values
pub const XML_ERR_WARNING: c_int = 1;
pub const XML_ERR_ERROR: c_int = 2;
pub const XML_ERR_FATAL: c_int = 3;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

/// Mirror of libxml2's `xmlError`
#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlError)>;

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();

    // Error reporting
    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);
    pub fn xmlResetLastError();

    // Documents
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    // Schema parsing functions
    pub fn xmlSchemaNewDocParserCtxt(doc: *mut XmlDoc) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaParse(ctxt: *mut XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *mut XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
}

/// Initialize libxml2's parser globals exactly once, in a thread-safe manner.
pub fn initialize() {
    LIBXML2_INIT.call_once(|| unsafe {
        xmlInitParser();
    });
}

/// Owned schema parser context, freed on drop.
///
/// A context created from a document is marked "preserve" by libxml2, so
/// freeing it never frees the document.
pub(crate) struct SchemaParserContext {
    ptr: NonNull<XmlSchemaParserCtxt>,
}

impl SchemaParserContext {
    /// # Safety
    ///
    /// `doc` must point to a live document for the lifetime of the context and
    /// of any schema it produces.
    pub(crate) unsafe fn from_document(doc: *mut XmlDoc) -> Option<Self> {
        let ptr = unsafe { xmlSchemaNewDocParserCtxt(doc) };
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Run the schema parser; null when the document is not a usable schema.
    pub(crate) fn parse(&self) -> *mut XmlSchema {
        unsafe { xmlSchemaParse(self.ptr.as_ptr()) }
    }
}

impl Drop for SchemaParserContext {
    fn drop(&mut self) {
        unsafe { xmlSchemaFreeParserCtxt(self.ptr.as_ptr()) }
    }
}

/// Owned validation context, freed on drop
pub(crate) struct ValidationContext {
    ptr: NonNull<XmlSchemaValidCtxt>,
}

impl ValidationContext {
    /// # Safety
    ///
    /// `schema` must stay alive for the lifetime of the context.
    pub(crate) unsafe fn new(schema: *mut XmlSchema) -> Option<Self> {
        let ptr = unsafe { xmlSchemaNewValidCtxt(schema) };
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Validate a whole document.
    ///
    /// Returns libxml2's status: 0 when valid, a positive error code when the
    /// document does not conform, -1 on internal error.
    ///
    /// # Safety
    ///
    /// `doc` must point to a live document.
    pub(crate) unsafe fn validate_document(&self, doc: *mut XmlDoc) -> c_int {
        unsafe { xmlSchemaValidateDoc(self.ptr.as_ptr(), doc) }
    }
}

impl Drop for ValidationContext {
    fn drop(&mut self) {
        unsafe { xmlSchemaFreeValidCtxt(self.ptr.as_ptr()) }
    }
}
