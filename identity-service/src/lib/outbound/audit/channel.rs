use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::audit::events::BusinessAuditEvent;
use crate::domain::audit::events::SecurityAuditEvent;
use crate::domain::audit::ports::AuditError;
use crate::domain::audit::ports::AuditSink;

enum AuditRecord {
    Business(BusinessAuditEvent),
    Security(SecurityAuditEvent),
}

/// Audit sink that hands events to a background worker.
///
/// Writes only enqueue, so callers never wait on the downstream sink. The worker
/// forwards events in order and logs delivery failures. It stops once every
/// `ChannelAuditSink` handle has been dropped and the queue is drained.
#[derive(Clone)]
pub struct ChannelAuditSink {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl ChannelAuditSink {
    /// Start a worker delivering to `inner`.
    ///
    /// # Returns
    /// The sink and the worker's join handle
    pub fn spawn<S: AuditSink>(inner: Arc<S>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuditRecord>();

        let worker = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                let result = match &record {
                    AuditRecord::Business(event) => inner.write_business(event).await,
                    AuditRecord::Security(event) => inner.write_security(event).await,
                };
                if let Err(e) = result {
                    tracing::error!("Failed to deliver audit event: {}", e);
                }
            }
            tracing::debug!("Audit worker stopped");
        });

        (Self { sender }, worker)
    }

    fn enqueue(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.sender
            .send(record)
            .map_err(|_| AuditError::Unavailable("audit worker has stopped".to_string()))
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn write_business(&self, event: &BusinessAuditEvent) -> Result<(), AuditError> {
        self.enqueue(AuditRecord::Business(event.clone()))
    }

    async fn write_security(&self, event: &SecurityAuditEvent) -> Result<(), AuditError> {
        self.enqueue(AuditRecord::Security(event.clone()))
    }
}
