use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Supplies the identity recorded as the author of a change.
pub trait AuditorAware: Send + Sync {
    fn current_auditor(&self) -> Option<String>;
}

/// Always reports the same principal. Used for batch jobs and the binary.
#[derive(Debug, Clone)]
pub struct FixedAuditor(pub String);

impl AuditorAware for FixedAuditor {
    fn current_auditor(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Who changed something, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub by: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditStamp {
    pub(crate) fn now(auditor: Option<&Arc<dyn AuditorAware>>) -> Self {
        Self {
            by: auditor.and_then(|a| a.current_auditor()),
            at: Utc::now(),
        }
    }
}
