//! Role-scoped feedback accumulation.
//!
//! Each reviewer role owns an independent feedback entry. Appending never
//! overwrites: later text is added below the existing entry with a timestamp
//! prefix, so the full per-role history is preserved.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::role::ActorRole;

/// Accumulated feedback keyed by reviewer role.
///
/// A `BTreeMap` keeps serialization order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLog {
    entries: BTreeMap<String, String>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append feedback from the given role.
    ///
    /// The first entry for a role is stored as-is; subsequent entries are
    /// appended with a timestamp prefix. Blank text is rejected.
    pub fn append(
        &mut self,
        role: ActorRole,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyFeedback);
        }

        let key = role.as_str().to_string();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.push_str(&format!(
                    "\n[{}] {}",
                    at.format("%Y-%m-%d %H:%M UTC"),
                    text
                ));
            }
            None => {
                self.entries.insert(key, text.to_string());
            }
        }
        Ok(())
    }

    /// The accumulated feedback text for a role, if any.
    pub fn for_role(&self, role: ActorRole) -> Option<&str> {
        self.entries.get(role.as_str()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_append_preserves_history_in_order() {
        let mut log = FeedbackLog::new();
        log.append(ActorRole::Advisor, "A", at()).unwrap();
        log.append(ActorRole::Advisor, "B", at()).unwrap();

        let text = log.for_role(ActorRole::Advisor).unwrap();
        let a = text.find('A').unwrap();
        let b = text.find('B').unwrap();
        assert!(a < b, "earlier feedback must come first: {:?}", text);
        assert!(text.contains("2024-05-10"));
    }

    #[test]
    fn test_roles_are_independent() {
        let mut log = FeedbackLog::new();
        log.append(ActorRole::Advisor, "needs work", at()).unwrap();
        log.append(ActorRole::Coordinator, "formatting", at())
            .unwrap();

        assert_eq!(log.for_role(ActorRole::Advisor), Some("needs work"));
        assert_eq!(log.for_role(ActorRole::Coordinator), Some("formatting"));
    }

    #[test]
    fn test_blank_feedback_rejected() {
        let mut log = FeedbackLog::new();
        assert_eq!(
            log.append(ActorRole::Advisor, "   ", at()),
            Err(DomainError::EmptyFeedback)
        );
        assert!(log.is_empty());
    }
}
