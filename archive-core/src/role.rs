//! Actor roles and identities.
//!
//! Roles are asserted by the external auth service; the lifecycle engine
//! trusts the verified claims and enforces what each role may do.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of the actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Student,
    Advisor,
    Coordinator,
}

impl ActorRole {
    /// Whether this role may review (approve/deny, grade, give feedback).
    pub fn can_review(&self) -> bool {
        matches!(self, Self::Advisor | Self::Coordinator)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "advisor" => Some(Self::Advisor),
            "coordinator" => Some(Self::Coordinator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Advisor => "advisor",
            Self::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A verified actor: identity (email) plus asserted role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Identity as known to the archive: the actor's email address.
    pub identity: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(identity: impl Into<String>, role: ActorRole) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }
}
