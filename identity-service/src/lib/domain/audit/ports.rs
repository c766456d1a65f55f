use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audit::events::BusinessAuditEvent;
use crate::domain::audit::events::SecurityAuditEvent;

/// Error for audit delivery.
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize audit event: {0}")]
    SerializationFailed(String),
}

/// Destination for audit records.
///
/// Writes are best effort: callers log failures and carry on with their response.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Record a business decision.
    ///
    /// # Errors
    /// * `Unavailable` - The sink cannot accept events
    /// * `SerializationFailed` - The event could not be encoded
    async fn write_business(&self, event: &BusinessAuditEvent) -> Result<(), AuditError>;

    /// Record a completed HTTP request.
    ///
    /// # Errors
    /// * `Unavailable` - The sink cannot accept events
    /// * `SerializationFailed` - The event could not be encoded
    async fn write_security(&self, event: &SecurityAuditEvent) -> Result<(), AuditError>;
}
