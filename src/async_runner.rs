//! Asynchronous operation runner
//!
//! Offloads compile and validate to Tokio's blocking worker pool:
//! - **Submission**: inputs are captured by cloning their `Arc` handles, so a
//!   document or schema the caller drops mid-flight stays alive until the task
//!   finishes.
//! - **Execution**: exactly once on a blocking worker, through the same
//!   [`Task::execute`] the synchronous runner uses. Diagnostics land in a
//!   collector private to that worker.
//! - **Completion**: the worker's [`Outcome`] is converted into the caller's
//!   result on the submitting task, never on the worker thread.
//!
//! Concurrency is bounded by a semaphore. Engine calls themselves are still
//! serialized by the collector's engine lock.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::{Config, ConfigManager};
use crate::diagnostic::DiagnosticList;
use crate::document::Document;
use crate::error::{Result, SetupFailure, SetupResult, XsdError};
use crate::runner::{Outcome, Task};
use crate::schema::Schema;

/// Async runner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Maximum number of operations executing on workers at once
    pub max_concurrent_operations: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: num_cpus::get(),
        }
    }
}

impl From<&Config> for RunnerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent_operations: ConfigManager::get_thread_count(config),
        }
    }
}

/// Runs compile and validate off the caller's thread.
///
/// Cloning is cheap; clones share the same concurrency bound. Must be used
/// from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct AsyncRunner {
    permits: Arc<Semaphore>,
    config: RunnerConfig,
}

impl Default for AsyncRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl AsyncRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_operations.max(1)));
        Self { permits, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Compile a schema on a worker
    pub async fn compile_schema(&self, document: &Document) -> SetupResult<Schema> {
        self.run(Task::compile(document.clone()))
            .await
            .into_schema()
    }

    /// Validate a document on a worker
    pub async fn validate(
        &self,
        schema: &Schema,
        document: &Document,
    ) -> SetupResult<DiagnosticList> {
        self.run(Task::validate(schema.clone(), document.clone()))
            .await
            .into_diagnostics()
    }

    /// Submit a compile and return immediately.
    ///
    /// `handler` is invoked exactly once, with either the schema or the setup
    /// failure, from a runtime task rather than the worker thread. The work runs
    /// to completion even if the returned handle is dropped. Aborting the handle
    /// or shutting the runtime down before completion still invokes `handler`,
    /// with [`SetupFailure::Worker`].
    pub fn submit_compile<F>(&self, document: &Document, handler: F) -> JoinHandle<()>
    where
        F: FnOnce(SetupResult<Schema>) + Send + 'static,
    {
        let runner = self.clone();
        let task = Task::compile(document.clone());
        let completion = Completion::new(handler);
        tokio::spawn(async move {
            let result = runner.run(task).await.into_schema();
            completion.complete(result);
        })
    }

    /// Submit a validation and return immediately.
    ///
    /// Same completion contract as [`submit_compile`](Self::submit_compile).
    pub fn submit_validate<F>(
        &self,
        schema: &Schema,
        document: &Document,
        handler: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(SetupResult<DiagnosticList>) + Send + 'static,
    {
        let runner = self.clone();
        let task = Task::validate(schema.clone(), document.clone());
        let completion = Completion::new(handler);
        tokio::spawn(async move {
            let result = runner.run(task).await.into_diagnostics();
            completion.complete(result);
        })
    }

    /// Read a schema file asynchronously, then parse and compile it on a worker
    pub async fn compile_schema_file(&self, path: impl AsRef<Path>) -> Result<Schema> {
        let document = self.load_document(path.as_ref()).await?;
        Ok(self.compile_schema(&document).await?)
    }

    /// Read a document file asynchronously, then parse and validate it on a worker
    pub async fn validate_file(
        &self,
        schema: &Schema,
        path: impl AsRef<Path>,
    ) -> Result<DiagnosticList> {
        let document = self.load_document(path.as_ref()).await?;
        Ok(self.validate(schema, &document).await?)
    }

    async fn load_document(&self, path: &Path) -> Result<Document> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| XsdError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path.to_string_lossy().into_owned();
        let document = self
            .offload(move || Document::parse_bytes_named(&bytes, &name))
            .await??;
        Ok(document)
    }

    async fn run(&self, task: Task) -> Outcome {
        let kind = task.kind();
        trace!(kind, "task submitted");
        match self.offload(move || task.execute()).await {
            Ok(outcome) => {
                debug!(kind, outcome = outcome_label(&outcome), "task completed");
                outcome
            }
            Err(failure) => Outcome::SetupFailed(failure),
        }
    }

    /// Run `work` on a blocking worker once a permit is available
    async fn offload<T, F>(&self, work: F) -> SetupResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SetupFailure::Worker {
                details: "worker pool is closed".to_string(),
            })?;

        // Held by the worker so abandoned calls still count against the bound.
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| SetupFailure::Worker {
            details: e.to_string(),
        })
    }
}

/// Owns a completion handler and guarantees it runs exactly once.
///
/// If the owning task is dropped before [`complete`](Self::complete) is called,
/// the handler receives a worker failure instead.
struct Completion<T, F>
where
    F: FnOnce(SetupResult<T>),
{
    handler: Option<F>,
    _result: PhantomData<fn(T)>,
}

impl<T, F> Completion<T, F>
where
    F: FnOnce(SetupResult<T>),
{
    fn new(handler: F) -> Self {
        Self {
            handler: Some(handler),
            _result: PhantomData,
        }
    }

    fn complete(mut self, result: SetupResult<T>) {
        if let Some(handler) = self.handler.take() {
            handler(result);
        }
    }
}

impl<T, F> Drop for Completion<T, F>
where
    F: FnOnce(SetupResult<T>),
{
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            debug!("submitted task dropped before completion");
            handler(Err(SetupFailure::Worker {
                details: "task cancelled before completion".to_string(),
            }));
        }
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::SchemaCreated(_) => "schema_created",
        Outcome::DiagnosticsProduced(_) => "diagnostics_produced",
        Outcome::SetupFailed(_) => "setup_failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root" type="xs:string"/>
</xs:schema>"#;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(config.max_concurrent_operations >= 1);
    }

    #[test]
    fn test_config_from_app_config() {
        let mut config = Config::default();
        config.runner.max_concurrent_operations = Some(3);
        assert_eq!(RunnerConfig::from(&config).max_concurrent_operations, 3);
    }

    #[tokio::test]
    async fn test_zero_bound_is_clamped() {
        let runner = AsyncRunner::new(RunnerConfig {
            max_concurrent_operations: 0,
        });
        let doc = Document::parse_str(SIMPLE_XSD).unwrap();
        assert!(runner.compile_schema(&doc).await.is_ok());
    }

    #[tokio::test]
    async fn test_compile_and_validate() {
        let runner = AsyncRunner::default();
        let doc = Document::parse_str(SIMPLE_XSD).unwrap();
        let schema = runner.compile_schema(&doc).await.unwrap();

        let valid = Document::parse_str("<root>Hello</root>").unwrap();
        assert!(runner.validate(&schema, &valid).await.unwrap().is_empty());

        let invalid = Document::parse_str("<root><invalid/></root>").unwrap();
        assert_eq!(
            runner
                .validate(&schema, &invalid)
                .await
                .unwrap()
                .error_count(),
            1
        );
    }

    #[tokio::test]
    async fn test_submit_compile_invokes_handler_once() {
        let runner = AsyncRunner::default();
        let doc = Document::parse_str("<invalid>not a schema</invalid>").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let counter = Arc::clone(&calls);
        let handle = runner.submit_compile(&doc, move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        });

        let result = rx.await.unwrap();
        handle.await.unwrap();
        assert!(matches!(result, Err(SetupFailure::InvalidSchema { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_completion_reports_cancellation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = std::sync::mpsc::channel();

        let counter = Arc::clone(&calls);
        let completion = Completion::new(move |result: SetupResult<DiagnosticList>| {
            counter.fetch_add(1, Ordering::SeqCst);
            tx.send(result).unwrap();
        });
        drop(completion);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            rx.recv().unwrap(),
            Err(SetupFailure::Worker { details }) if details.contains("cancelled")
        ));
    }

    #[test]
    fn test_completed_handler_is_not_called_again_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let completion = Completion::new(move |result: SetupResult<DiagnosticList>| {
            assert!(result.is_ok());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        completion.complete(Ok(DiagnosticList::new()));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submitted_task_keeps_document_alive() {
        let runner = AsyncRunner::default();
        let doc = Document::parse_str(SIMPLE_XSD).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = runner.submit_compile(&doc, move |result| {
            let _ = tx.send(result);
        });
        // The caller releases its handle right after submission.
        drop(doc);

        let schema = rx.await.unwrap().unwrap();
        handle.await.unwrap();
        assert_eq!(schema.source_document().handle_count(), 1);
    }
}
