//! The audit logger.

use crate::error::AuditError;
use crate::sink::AuditSink;
use longbox_audit_types::{AuditEntry, AuditFilter, AuditPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Query limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLoggerConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Upper bound for [`AuditHandle::wait_for`] callers that must not stall.
    pub write_timeout: Duration,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Handle for recording and querying audit entries.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    config: AuditLoggerConfig,
}

/// A write in flight.
///
/// Awaiting [`wait`](Self::wait) returns once the write has finished, whether
/// it succeeded or not. Dropping the handle detaches the write, which still
/// runs to completion.
#[derive(Debug)]
#[must_use = "drop the handle to detach the write, or call `wait`"]
pub struct AuditHandle(Option<JoinHandle<()>>);

impl AuditHandle {
    pub async fn wait(self) {
        if let Some(task) = self.0 {
            if let Err(e) = task.await {
                warn!(event = "audit_write_failed", error = %e, "Audit task did not complete");
            }
        }
    }

    /// Wait at most `limit` for the write. Returns false if it was still
    /// pending; the write then carries on detached.
    pub async fn wait_for(self, limit: Duration) -> bool {
        let Some(task) = self.0 else {
            return true;
        };
        match tokio::time::timeout(limit, task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(event = "audit_write_failed", error = %e, "Audit task did not complete");
                true
            }
            Err(_) => {
                warn!(
                    event = "audit_write_failed",
                    timeout_ms = limit.as_millis() as u64,
                    "Audit write still pending, continuing without it"
                );
                false
            }
        }
    }

    /// Let the write finish in the background.
    pub fn detach(self) {}
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self::with_config(sink, AuditLoggerConfig::default())
    }

    pub fn with_config(sink: Arc<dyn AuditSink>, config: AuditLoggerConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> AuditLoggerConfig {
        self.config
    }

    /// Append an entry without blocking the caller.
    ///
    /// The write runs on its own task, so it completes even if the calling
    /// request is cancelled. Failures are logged at `warn` and swallowed.
    pub fn record(&self, entry: AuditEntry) -> AuditHandle {
        let sink = Arc::clone(&self.sink);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => AuditHandle(Some(runtime.spawn(write(sink, entry)))),
            Err(_) => {
                warn!(
                    event = "audit_write_failed",
                    action = %entry.action,
                    "No async runtime, audit entry dropped"
                );
                AuditHandle(None)
            }
        }
    }

    /// Append an entry and wait for the write attempt to finish.
    pub async fn record_and_wait(&self, entry: AuditEntry) {
        self.record(entry).wait().await;
    }

    /// Entries matching `filter`, newest first, with the total match count.
    #[instrument(skip(self))]
    pub async fn get_audit_logs(&self, filter: &AuditFilter) -> Result<AuditPage, AuditError> {
        let limit = filter.effective_limit(self.config.default_page_size, self.config.max_page_size);
        let offset = filter.effective_offset();
        self.sink.query(filter, limit, offset).await
    }
}

async fn write(sink: Arc<dyn AuditSink>, entry: AuditEntry) {
    match sink.append(&entry).await {
        Ok(()) => debug!(id = %entry.id, action = %entry.action, "Audit entry written"),
        Err(e) => warn!(
            event = "audit_write_failed",
            sink = sink.name(),
            id = %entry.id,
            action = %entry.action,
            error = %e,
            "Failed to persist audit entry"
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sink::MemoryAuditSink;
    use async_trait::async_trait;
    use longbox_audit_types::{AuditAction, AuditOutcome};
    use std::time::Duration;

    /// A sink whose backend is down.
    pub(crate) struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn append(&self, _: &AuditEntry) -> Result<(), AuditError> {
            Err(AuditError::Unavailable("disk full".into()))
        }

        async fn query(&self, _: &AuditFilter, _: u32, _: u32) -> Result<AuditPage, AuditError> {
            Err(AuditError::Unavailable("disk full".into()))
        }
    }

    /// A sink that takes a while to write.
    struct SlowSink {
        inner: MemoryAuditSink,
    }

    #[async_trait]
    impl AuditSink for SlowSink {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.inner.append(entry).await
        }

        async fn query(&self, filter: &AuditFilter, limit: u32, offset: u32) -> Result<AuditPage, AuditError> {
            self.inner.query(filter, limit, offset).await
        }
    }

    fn denied() -> AuditEntry {
        AuditEntry::builder(AuditAction::AccessDenied, "comics")
            .outcome(AuditOutcome::Denied)
            .build()
    }

    #[tokio::test]
    async fn test_record_and_wait_persists() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = AuditLogger::new(sink.clone());

        logger.record_and_wait(denied()).await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let logger = AuditLogger::new(Arc::new(BrokenSink));
        logger.record_and_wait(denied()).await;
        logger.record(denied()).detach();
    }

    #[tokio::test]
    async fn test_detached_write_outlives_caller() {
        let inner = MemoryAuditSink::new();
        let sink = Arc::new(SlowSink { inner: inner.clone() });
        let logger = AuditLogger::new(sink);

        let caller = tokio::spawn({
            let logger = logger.clone();
            async move {
                let handle = logger.record(denied());
                tokio::time::sleep(Duration::from_secs(60)).await;
                handle.wait().await;
            }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        caller.abort();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(inner.len(), 1);
    }

    #[tokio::test]
    async fn test_bounded_wait_gives_up_but_write_lands() {
        let inner = MemoryAuditSink::new();
        let logger = AuditLogger::new(Arc::new(SlowSink { inner: inner.clone() }));

        let finished = logger.record(denied()).wait_for(Duration::from_millis(1)).await;
        assert!(!finished);
        assert!(inner.is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(inner.len(), 1);

        let finished = logger.record(denied()).wait_for(Duration::from_secs(5)).await;
        assert!(finished);
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_record_without_runtime_is_dropped() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = AuditLogger::new(sink.clone());
        logger.record(denied()).detach();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_query_clamps_limit() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = AuditLogger::with_config(
            sink.clone(),
            AuditLoggerConfig {
                default_page_size: 2,
                max_page_size: 3,
                ..AuditLoggerConfig::default()
            },
        );
        for _ in 0..5 {
            logger.record_and_wait(denied()).await;
        }

        let page = logger.get_audit_logs(&AuditFilter::new()).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.count, 5);

        let page = logger
            .get_audit_logs(&AuditFilter::new().page(100, 0))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 3);
    }

    #[tokio::test]
    async fn test_query_error_surfaces() {
        let logger = AuditLogger::new(Arc::new(BrokenSink));
        assert!(logger.get_audit_logs(&AuditFilter::new()).await.is_err());
    }
}
