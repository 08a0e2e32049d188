// Field-presence and length validation for inbound audit records.
//
// Many small per-field checks, each producing its own message, collected
// into a single error rather than stopping at the first violation.

use std::fmt;

use super::record::AuditRecord;

/// All rules violated by a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Stateless validator for `AuditRecord`s.
pub struct Validator;

impl Validator {
    pub fn validate(record: &AuditRecord) -> Result<(), ValidationError> {
        let mut messages = Vec::new();

        check_required(&mut messages, "eventId", &record.event_id, 1, 64);
        check_required(&mut messages, "eventName", &record.event_name, 1, 128);
        check_required(&mut messages, "eventType", &record.event_type, 1, 64);
        check_required(&mut messages, "hostName", &record.host_name, 1, 128);
        check_required(&mut messages, "hostIp", &record.host_ip, 1, 256);
        check_required(&mut messages, "applicationId", &record.application_id, 1, 64);
        check_required(&mut messages, "applicationName", &record.application_name, 1, 128);
        check_required(&mut messages, "sessionUserId", &record.session_user_id, 1, 256);
        check_required(&mut messages, "createdBy", &record.created_by, 1, 256);

        check_optional(&mut messages, "sessionUserName", record.session_user_name.as_deref(), 128);
        check_optional(&mut messages, "id", record.id.as_deref(), 64);
        check_optional(&mut messages, "idType", record.id_type.as_deref(), 64);
        check_optional(&mut messages, "moduleName", record.module_name.as_deref(), 128);
        check_optional(&mut messages, "moduleId", record.module_id.as_deref(), 64);
        check_optional(&mut messages, "description", record.description.as_deref(), 2048);

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { messages })
        }
    }
}

fn check_required(messages: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min {
        messages.push(format!("{field} is required"));
    } else if len > max {
        messages.push(format!("{field} exceeds maximum length of {max}"));
    }
}

fn check_optional(messages: &mut Vec<String>, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            messages.push(format!("{field} exceeds maximum length of {max}"));
        }
    }
}
