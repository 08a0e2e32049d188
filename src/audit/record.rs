// Canonical audit event record.
//
// A flat struct carrying identity, timing, origin, actor and module
// context for a single submitted event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A structured audit event submitted by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_id: String,
    pub event_name: String,
    pub event_type: String,
    pub action_time_stamp: DateTime<Utc>,
    pub host_name: String,
    pub host_ip: String,
    pub application_id: String,
    pub application_name: String,
    pub session_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_user_name: Option<String>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set by the store on insert; `None` until persisted. Carried on the
    /// wire so that `AuditStore::update_audits` and the Retention Sweeper
    /// can round-trip it, but never set by the engine itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A well-formed sample record, used by this crate's unit tests and by
/// downstream integration tests/admin tooling exercising the engine
/// without fabricating a full `AuditRecord` by hand every time.
#[cfg(any(test, feature = "testing"))]
pub fn sample(event_id: &str) -> AuditRecord {
    AuditRecord {
        event_id: event_id.to_string(),
        event_name: "LOGIN".to_string(),
        event_type: "AUTHENTICATION".to_string(),
        action_time_stamp: Utc::now(),
        host_name: "host-1".to_string(),
        host_ip: "10.0.0.1".to_string(),
        application_id: "app-1".to_string(),
        application_name: "Example App".to_string(),
        session_user_id: "user-1".to_string(),
        session_user_name: Some("Jordan".to_string()),
        created_by: "svc-ingest".to_string(),
        id: None,
        id_type: None,
        module_name: None,
        module_id: None,
        description: None,
        created_at: None,
    }
}
