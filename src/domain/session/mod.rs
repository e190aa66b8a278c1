//! Interview session domain module

mod question;

pub use question::{time_limit_secs, Difficulty, Question, QuestionCategory};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::InvalidSeniorityError;

/// Seniority level of the rehearsed role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    #[default]
    Mid,
    Senior,
    Staff,
}

impl Seniority {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Seniority {
    type Err = InvalidSeniorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(Self::Junior),
            "mid" => Ok(Self::Mid),
            "senior" => Ok(Self::Senior),
            "staff" => Ok(Self::Staff),
            _ => Err(InvalidSeniorityError { input: s.to_string() }),
        }
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Created,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One interview attempt. The server owns the authoritative record;
/// this is the client's cached copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub role: String,
    pub seniority: Seniority,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Mint a new session in the created state
    pub fn new(role: impl Into<String>, seniority: Seniority) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.into(),
            seniority,
            status: SessionStatus::Created,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark the session in progress
    pub fn begin(&mut self) {
        self.status = SessionStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    /// Mark the session completed
    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the session cancelled
    pub fn cancel(&mut self) {
        self.status = SessionStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seniority_parses() {
        assert_eq!("junior".parse::<Seniority>().unwrap(), Seniority::Junior);
        assert_eq!("  Senior ".parse::<Seniority>().unwrap(), Seniority::Senior);
        assert_eq!("STAFF".parse::<Seniority>().unwrap(), Seniority::Staff);
    }

    #[test]
    fn seniority_rejects_unknown() {
        let err = "principal".parse::<Seniority>().unwrap_err();
        assert!(err.to_string().contains("principal"));
    }

    #[test]
    fn new_session_is_created() {
        let session = Session::new("Backend Engineer", Seniority::Senior);
        assert_eq!(session.status, SessionStatus::Created);
        assert!(session.started_at.is_none());
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn begin_and_complete_set_timestamps() {
        let mut session = Session::new("Backend Engineer", Seniority::Mid);
        session.begin();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.started_at.is_some());

        session.complete();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn status_strings_are_kebab_case() {
        assert_eq!(SessionStatus::InProgress.to_string(), "in-progress");
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
