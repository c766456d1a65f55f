use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::audit::events::BusinessAuditEvent;
use crate::domain::audit::events::SecurityAuditEvent;
use crate::domain::audit::ports::AuditError;
use crate::domain::audit::ports::AuditSink;

/// Audit sink keeping every event in memory, in write order.
#[derive(Default)]
pub struct InMemoryAuditSink {
    business: RwLock<Vec<BusinessAuditEvent>>,
    security: RwLock<Vec<SecurityAuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn business_events(&self) -> Vec<BusinessAuditEvent> {
        self.business.read().await.clone()
    }

    pub async fn security_events(&self) -> Vec<SecurityAuditEvent> {
        self.security.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn write_business(&self, event: &BusinessAuditEvent) -> Result<(), AuditError> {
        self.business.write().await.push(event.clone());
        Ok(())
    }

    async fn write_security(&self, event: &SecurityAuditEvent) -> Result<(), AuditError> {
        self.security.write().await.push(event.clone());
        Ok(())
    }
}
