//! Interview question entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question categories. Each carries its own answer-time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionCategory {
    Technical,
    SystemDesign,
    Behavioral,
    ProblemSolving,
}

impl QuestionCategory {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::SystemDesign => "system-design",
            Self::Behavioral => "behavioral",
            Self::ProblemSolving => "problem-solving",
        }
    }

    /// Minimum and maximum answer time in seconds for this category
    pub const fn time_limit_bounds(&self) -> (u32, u32) {
        match self {
            Self::Technical => (60, 240),
            Self::SystemDesign => (300, 600),
            Self::Behavioral => (120, 300),
            Self::ProblemSolving => (120, 360),
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Question difficulty, used to place the time limit inside the
/// category bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer time limit for a category/difficulty pair.
/// Easy gets the category floor, hard the ceiling, medium the midpoint.
pub const fn time_limit_secs(category: QuestionCategory, difficulty: Difficulty) -> u32 {
    let (min, max) = category.time_limit_bounds();
    match difficulty {
        Difficulty::Easy => min,
        Difficulty::Medium => (min + max) / 2,
        Difficulty::Hard => max,
    }
}

/// Interview question entity. Immutable once generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    /// 1-based ordinal within the session
    pub number: u32,
    pub prompt: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Create a question with its time limit derived from category
    /// and difficulty.
    pub fn new(
        session_id: Uuid,
        number: u32,
        prompt: impl Into<String>,
        category: QuestionCategory,
        difficulty: Difficulty,
        topic: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            number,
            prompt: prompt.into(),
            category,
            difficulty,
            time_limit_secs: time_limit_secs(category, difficulty),
            topic,
            created_at: Utc::now(),
        }
    }
}
