use async_trait::async_trait;
use serde::Serialize;

use crate::domain::audit::events::BusinessAuditEvent;
use crate::domain::audit::events::SecurityAuditEvent;
use crate::domain::audit::ports::AuditError;
use crate::domain::audit::ports::AuditSink;

/// Audit sink emitting each event as a JSON line on the `audit` tracing target.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

fn to_json<T: Serialize>(event: &T) -> Result<String, AuditError> {
    serde_json::to_string(event).map_err(|e| AuditError::SerializationFailed(e.to_string()))
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn write_business(&self, event: &BusinessAuditEvent) -> Result<(), AuditError> {
        let payload = to_json(event)?;
        tracing::info!(
            target: "audit",
            kind = "business",
            event_type = %event.event_type,
            correlation_id = %event.correlation_id,
            "{}",
            payload
        );
        Ok(())
    }

    async fn write_security(&self, event: &SecurityAuditEvent) -> Result<(), AuditError> {
        let payload = to_json(event)?;
        tracing::info!(
            target: "audit",
            kind = "security",
            status_code = event.status_code,
            correlation_id = %event.correlation_id,
            "{}",
            payload
        );
        Ok(())
    }
}
