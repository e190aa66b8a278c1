//! Built-in question bank oracle
//!
//! Works fully offline. Question choice is deterministic per session
//! so a crashed run can regenerate the same set, and the evaluation
//! is a rough local heuristic; authoritative scoring happens on the
//! server once answers sync.

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{CriterionScore, Evaluation, InterviewOracle, OracleError};
use crate::domain::session::{Difficulty, Question, QuestionCategory, Seniority};

const TECHNICAL: &[&str] = &[
    "Walk me through how you would debug a memory leak in a long-running {role} service.",
    "Describe a race condition you have encountered and how you tracked it down.",
    "How do you decide when a system needs caching, and what risks does it introduce?",
    "Tell me about a piece of code you recently refactored. What made it worth the risk?",
    "What does code quality mean in your day-to-day work as a {role}?",
    "How do you approach reviewing a large pull request you disagree with?",
];

const BEHAVIORAL: &[&str] = &[
    "Tell me about a time you disagreed with a teammate on a technical decision. How was it resolved?",
    "Describe a project that slipped badly. What did you learn from it?",
    "Tell me about a time you had to deliver under a hard deadline. What did you cut?",
    "Describe a situation where you received difficult feedback. How did you respond?",
    "Tell me about onboarding or mentoring someone. What made it work?",
];

const PROBLEM_SOLVING: &[&str] = &[
    "A deploy doubles your error rate at 3am and you are paged. Walk me through your first fifteen minutes.",
    "You inherit a service with no tests and weekly regressions. Where do you start?",
    "Your team's build takes forty minutes. How do you approach making it faster?",
    "A dependency you rely on announces end-of-life in six months. What is your plan?",
    "Two services disagree about the same record after a partial outage. How do you reconcile them?",
];

const SYSTEM_DESIGN: &[&str] = &[
    "Design a rate limiter for a public API. Cover its data structures and failure modes.",
    "Design the offline sync layer for a note-taking app used on flaky connections.",
    "Design a URL shortener that has to survive a viral traffic spike.",
    "Design a job scheduler that runs millions of small tasks a day.",
];

/// Category mix for one pass of the rotation: weighted toward
/// technical, with one long-form design question per cycle
const CATEGORY_ROTATION: [QuestionCategory; 5] = [
    QuestionCategory::Technical,
    QuestionCategory::Behavioral,
    QuestionCategory::ProblemSolving,
    QuestionCategory::Technical,
    QuestionCategory::SystemDesign,
];

/// Signposting terms that mark a structured answer
const STRUCTURE_MARKERS: [&str; 8] = [
    "first",
    "second",
    "then",
    "because",
    "for example",
    "in practice",
    "finally",
    "trade",
];

/// Oracle backed by the bundled question bank
pub struct CannedOracle;

impl CannedOracle {
    pub fn new() -> Self {
        Self
    }

    fn bank_for(category: QuestionCategory) -> &'static [&'static str] {
        match category {
            QuestionCategory::Technical => TECHNICAL,
            QuestionCategory::Behavioral => BEHAVIORAL,
            QuestionCategory::ProblemSolving => PROBLEM_SOLVING,
            QuestionCategory::SystemDesign => SYSTEM_DESIGN,
        }
    }

    fn bank_slot(category: QuestionCategory) -> usize {
        match category {
            QuestionCategory::Technical => 0,
            QuestionCategory::Behavioral => 1,
            QuestionCategory::ProblemSolving => 2,
            QuestionCategory::SystemDesign => 3,
        }
    }

    fn base_difficulty(seniority: Seniority) -> Difficulty {
        match seniority {
            Seniority::Junior => Difficulty::Easy,
            Seniority::Mid => Difficulty::Medium,
            Seniority::Senior | Seniority::Staff => Difficulty::Hard,
        }
    }

    /// The opening question sits one step below the session's level
    fn warmup(difficulty: Difficulty) -> Difficulty {
        match difficulty {
            Difficulty::Hard => Difficulty::Medium,
            _ => Difficulty::Easy,
        }
    }
}

impl Default for CannedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterviewOracle for CannedOracle {
    async fn generate_questions(
        &self,
        session_id: Uuid,
        role: &str,
        _description: &str,
        seniority: Seniority,
        count: u32,
    ) -> Result<Vec<Question>, OracleError> {
        if count == 0 {
            return Err(OracleError::GenerationFailed(
                "at least one question is required".to_string(),
            ));
        }

        let base = Self::base_difficulty(seniority);
        let mut seen_per_bank = [0usize; 4];
        let mut questions = Vec::with_capacity(count as usize);

        for i in 0..count as usize {
            let category = CATEGORY_ROTATION[i % CATEGORY_ROTATION.len()];
            let bank = Self::bank_for(category);
            let seen = &mut seen_per_bank[Self::bank_slot(category)];

            // Session id picks where each bank's rotation starts, so
            // two sessions rarely open with the same question
            let offset = (session_id.as_u128() % bank.len() as u128) as usize;
            let prompt = bank[(offset + *seen) % bank.len()].replace("{role}", role);
            *seen += 1;

            let difficulty = if i == 0 { Self::warmup(base) } else { base };
            questions.push(Question::new(
                session_id,
                (i + 1) as u32,
                prompt,
                category,
                difficulty,
                None,
            ));
        }

        Ok(questions)
    }

    async fn evaluate(
        &self,
        question: &Question,
        transcript: &str,
    ) -> Result<Evaluation, OracleError> {
        let words = transcript.split_whitespace().count();
        if words == 0 {
            return Ok(Evaluation {
                scores: Vec::new(),
                overall: 0.0,
                feedback: "No answer was captured for this question.".to_string(),
            });
        }

        // Depth: how much of the available time was actually used,
        // assuming a speaking pace of about 120 words per minute
        let expected_words = question.time_limit_secs as f32 * 2.0;
        let depth = (words as f32 / expected_words).min(1.0) * 10.0;

        let lower = transcript.to_lowercase();
        let hits = STRUCTURE_MARKERS
            .iter()
            .filter(|marker| lower.contains(*marker))
            .count();
        let structure = hits.min(5) as f32 * 2.0;

        let overall = (depth + structure) / 2.0;
        let feedback = if overall < 4.0 {
            format!(
                "Thin answer for a {} question. Aim to fill more of the {}s limit with concrete detail.",
                question.category, question.time_limit_secs
            )
        } else if overall < 7.0 {
            "Reasonable coverage. Signpost your reasoning (context, decision, result) to score higher."
                .to_string()
        } else {
            "Well-developed answer with clear structure.".to_string()
        };

        Ok(Evaluation {
            scores: vec![
                CriterionScore {
                    criterion: "depth".to_string(),
                    score: depth,
                },
                CriterionScore {
                    criterion: "structure".to_string(),
                    score: structure,
                },
            ],
            overall,
            feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_the_requested_count_with_ordinals() {
        let oracle = CannedOracle::new();
        let session_id = Uuid::new_v4();
        let questions = oracle
            .generate_questions(session_id, "Backend Engineer", "", Seniority::Mid, 5)
            .await
            .unwrap();

        assert_eq!(questions.len(), 5);
        for (i, question) in questions.iter().enumerate() {
            assert_eq!(question.number, (i + 1) as u32);
            assert_eq!(question.session_id, session_id);
            assert!(!question.prompt.is_empty());
            assert!(!question.prompt.contains("{role}"));
        }
    }

    #[tokio::test]
    async fn question_choice_is_deterministic_per_session() {
        let oracle = CannedOracle::new();
        let session_id = Uuid::new_v4();

        let first = oracle
            .generate_questions(session_id, "SRE", "", Seniority::Senior, 5)
            .await
            .unwrap();
        let second = oracle
            .generate_questions(session_id, "SRE", "", Seniority::Senior, 5)
            .await
            .unwrap();

        let prompts: Vec<_> = first.iter().map(|q| &q.prompt).collect();
        let again: Vec<_> = second.iter().map(|q| &q.prompt).collect();
        assert_eq!(prompts, again);
    }

    #[tokio::test]
    async fn seniority_sets_difficulty_after_a_warmup() {
        let oracle = CannedOracle::new();
        let questions = oracle
            .generate_questions(Uuid::new_v4(), "Platform Engineer", "", Seniority::Senior, 4)
            .await
            .unwrap();

        assert_eq!(questions[0].difficulty, Difficulty::Medium);
        for question in &questions[1..] {
            assert_eq!(question.difficulty, Difficulty::Hard);
        }
    }

    #[tokio::test]
    async fn rotation_includes_one_design_question_per_cycle() {
        let oracle = CannedOracle::new();
        let questions = oracle
            .generate_questions(Uuid::new_v4(), "Engineer", "", Seniority::Mid, 5)
            .await
            .unwrap();

        let designs = questions
            .iter()
            .filter(|q| q.category == QuestionCategory::SystemDesign)
            .count();
        assert_eq!(designs, 1);
    }

    #[tokio::test]
    async fn zero_count_is_rejected() {
        let oracle = CannedOracle::new();
        let err = oracle
            .generate_questions(Uuid::new_v4(), "Engineer", "", Seniority::Mid, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn empty_transcript_scores_zero() {
        let oracle = CannedOracle::new();
        let question = Question::new(
            Uuid::new_v4(),
            1,
            "Anything",
            QuestionCategory::Technical,
            Difficulty::Easy,
            None,
        );

        let evaluation = oracle.evaluate(&question, "   ").await.unwrap();
        assert_eq!(evaluation.overall, 0.0);
        assert!(evaluation.scores.is_empty());
    }

    #[tokio::test]
    async fn structured_answers_outscore_rambling_ones() {
        let oracle = CannedOracle::new();
        let question = Question::new(
            Uuid::new_v4(),
            1,
            "Anything",
            QuestionCategory::Technical,
            Difficulty::Easy,
            None,
        );

        let structured = "First I reproduced the bug, then I bisected the deploys, \
                          because the regression window was small. For example the \
                          cache layer was stale. Finally I added a regression test.";
        let rambling = "stuff ".repeat(structured.split_whitespace().count());

        let good = oracle.evaluate(&question, structured).await.unwrap();
        let bad = oracle.evaluate(&question, &rambling).await.unwrap();
        assert!(good.overall > bad.overall);
    }
}
