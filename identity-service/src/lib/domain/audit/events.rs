use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

/// Named outcome recorded by a business audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuditEventType {
    UserCreated,
    UserCreationFailed,
    UserLoginSucceeded,
    UserLoginFailed,
    UserIsDeleted,
    TokenRefreshed,
    TokenRefreshFailed,
    RefreshTokenReuseDetected,
    UserLoggedOut,
    LogoutFailed,
    UserDeleted,
    UserDeletionFailed,
    UserRestored,
    UserRestorationFailed,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::UserCreated => "UserCreated",
            AuditEventType::UserCreationFailed => "UserCreationFailed",
            AuditEventType::UserLoginSucceeded => "UserLoginSucceeded",
            AuditEventType::UserLoginFailed => "UserLoginFailed",
            AuditEventType::UserIsDeleted => "UserIsDeleted",
            AuditEventType::TokenRefreshed => "TokenRefreshed",
            AuditEventType::TokenRefreshFailed => "TokenRefreshFailed",
            AuditEventType::RefreshTokenReuseDetected => "RefreshTokenReuseDetected",
            AuditEventType::UserLoggedOut => "UserLoggedOut",
            AuditEventType::LogoutFailed => "LogoutFailed",
            AuditEventType::UserDeleted => "UserDeleted",
            AuditEventType::UserDeletionFailed => "UserDeletionFailed",
            AuditEventType::UserRestored => "UserRestored",
            AuditEventType::UserRestorationFailed => "UserRestorationFailed",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one authentication or account decision.
///
/// Metadata keys are unique per event. Raw passwords and raw refresh tokens are never
/// placed in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessAuditEvent {
    pub event_type: AuditEventType,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<UserId>,
    pub metadata: BTreeMap<String, String>,
    pub correlation_id: String,
}

impl BusinessAuditEvent {
    /// Create an event stamped with the current time and no metadata.
    ///
    /// # Arguments
    /// * `event_type` - Outcome being recorded
    /// * `actor` - User the decision concerns or who performed it, when known
    /// * `correlation_id` - Identifier of the originating request
    pub fn new(event_type: AuditEventType, actor: Option<UserId>, correlation_id: impl Into<String>) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            actor,
            metadata: BTreeMap::new(),
            correlation_id: correlation_id.into(),
        }
    }

    /// Add a metadata entry, replacing any previous value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    /// Record the failing error code under `reason`.
    pub fn with_reason(self, error: DomainError) -> Self {
        self.with("reason", error.code())
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Security audit record for one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityAuditEvent {
    pub timestamp: DateTime<Utc>,
    pub actor: Option<UserId>,
    pub role: Option<Role>,
    pub permissions: Vec<String>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub correlation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keys_are_unique() {
        let event = BusinessAuditEvent::new(AuditEventType::UserCreated, None, "corr-1")
            .with("email", "old@x.com")
            .with("email", "ann@x.com")
            .with("role", Role::User);

        assert_eq!(event.metadata.len(), 2);
        assert_eq!(event.metadata_value("email"), Some("ann@x.com"));
        assert_eq!(event.metadata_value("role"), Some("User"));
        assert_eq!(event.correlation_id, "corr-1");
    }

    #[test]
    fn test_reason_uses_error_code() {
        let event = BusinessAuditEvent::new(AuditEventType::UserLoginFailed, None, "corr-2")
            .with_reason(DomainError::InvalidCredentials);

        assert_eq!(event.metadata_value("reason"), Some("user.invalidcredentials"));
    }

    #[test]
    fn test_serializes_event_type_by_name() {
        let event = BusinessAuditEvent::new(AuditEventType::TokenRefreshed, None, "corr-3");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "TokenRefreshed");
        assert_eq!(json["correlation_id"], "corr-3");
    }
}
