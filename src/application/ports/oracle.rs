//! Question and scoring oracle port interface

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::session::{Question, Seniority};

/// Oracle errors
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Question generation failed: {0}")]
    GenerationFailed(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Score for one evaluation criterion
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionScore {
    pub criterion: String,
    /// 0.0 to 10.0
    pub score: f32,
}

/// Evaluation of one answered question
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub scores: Vec<CriterionScore>,
    /// 0.0 to 10.0
    pub overall: f32,
    pub feedback: String,
}

/// Port for the question-generation and scoring collaborator.
/// How questions are produced and answers scored is opaque to the
/// caller.
#[async_trait]
pub trait InterviewOracle: Send + Sync {
    /// Generate the question set for one session.
    async fn generate_questions(
        &self,
        session_id: Uuid,
        role: &str,
        description: &str,
        seniority: Seniority,
        count: u32,
    ) -> Result<Vec<Question>, OracleError>;

    /// Score one transcribed answer.
    async fn evaluate(
        &self,
        question: &Question,
        transcript: &str,
    ) -> Result<Evaluation, OracleError>;
}
