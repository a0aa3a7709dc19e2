//! Scoped capture of libxml2's process-wide structured error stream.
//!
//! libxml2 exposes one global error callback slot. A [`CollectorScope`] takes the
//! engine lock, points that slot at a fresh [`DiagnosticCollector`], and restores
//! the slot to null when it is finished or dropped, on every exit path. Holding
//! the lock for the whole scope means two operations on different threads never
//! have their collectors installed at the same time, so diagnostics cannot leak
//! from one call into another.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

use libc::c_void;
use tracing::trace;

use crate::diagnostic::{Diagnostic, DiagnosticList};
use crate::libxml2::{self, XmlError, xmlResetLastError, xmlSetStructuredErrorFunc};

/// Serializes every install → engine call → restore window in the process.
static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Which records a collector keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectPolicy {
    /// Keep errors and warnings
    KeepAll,
    /// Drop warnings; used while compiling schemas
    ErrorsOnly,
}

/// Accumulates diagnostics pushed by the engine during one call
#[derive(Debug)]
pub struct DiagnosticCollector {
    policy: CollectPolicy,
    diagnostics: DiagnosticList,
    suppressed: usize,
}

impl DiagnosticCollector {
    pub fn new(policy: CollectPolicy) -> Self {
        Self {
            policy,
            diagnostics: DiagnosticList::new(),
            suppressed: 0,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.policy == CollectPolicy::ErrorsOnly && diagnostic.is_warning() {
            self.suppressed += 1;
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of warnings dropped by the policy
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_diagnostics(self) -> DiagnosticList {
        self.diagnostics
    }
}

/// Structured error callback handed to libxml2.
///
/// `user_data` is the collector installed by the active [`CollectorScope`].
unsafe extern "C" fn collect_structured_error(user_data: *mut c_void, error: *const XmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let collector = unsafe { &mut *(user_data as *mut DiagnosticCollector) };
    // The record is only valid during this call, so copy it out right away.
    if let Some(diagnostic) = unsafe { Diagnostic::from_raw(&*error) } {
        collector.push(diagnostic);
    }
}

/// RAII installation of a [`DiagnosticCollector`] as the engine's error sink.
///
/// The scope is `!Send`: it must be finished on the thread that installed it,
/// which is also the thread the engine reports on.
pub struct CollectorScope {
    collector: Option<NonNull<DiagnosticCollector>>,
    _lock: MutexGuard<'static, ()>,
    _not_send: PhantomData<*const ()>,
}

impl CollectorScope {
    /// Take the engine lock, clear stale engine error state and install a new collector.
    ///
    /// Blocks while another thread holds a scope. Not re-entrant: opening a
    /// second scope on a thread that already holds one deadlocks.
    pub fn install(policy: CollectPolicy) -> Self {
        libxml2::initialize();

        // A panic inside another scope still restored the callback slot on
        // unwind, so a poisoned lock carries no broken state.
        let lock = ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let collector = NonNull::from(Box::leak(Box::new(DiagnosticCollector::new(policy))));
        unsafe {
            xmlResetLastError();
            xmlSetStructuredErrorFunc(
                collector.as_ptr() as *mut c_void,
                Some(collect_structured_error),
            );
        }
        trace!(?policy, "diagnostic collector installed");

        Self {
            collector: Some(collector),
            _lock: lock,
            _not_send: PhantomData,
        }
    }

    /// Restore the callback slot and return what was collected, in emission order.
    pub fn finish(mut self) -> DiagnosticList {
        self.uninstall()
            .map(DiagnosticCollector::into_diagnostics)
            .unwrap_or_default()
    }

    fn uninstall(&mut self) -> Option<DiagnosticCollector> {
        let collector = self.collector.take()?;
        unsafe {
            xmlSetStructuredErrorFunc(std::ptr::null_mut(), None);
        }
        // The engine no longer references the collector once the slot is cleared.
        let collector = unsafe { Box::from_raw(collector.as_ptr()) };
        trace!(
            collected = collector.diagnostics.len(),
            suppressed = collector.suppressed(),
            "diagnostic collector removed"
        );
        Some(*collector)
    }
}

impl Drop for CollectorScope {
    fn drop(&mut self) {
        self.uninstall();
    }
}
