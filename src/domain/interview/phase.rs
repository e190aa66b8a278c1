//! Interview phase state machine

use std::fmt;

/// Interview phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterviewPhase {
    #[default]
    Intro,
    Question,
    Recording,
    Review,
    Complete,
}

impl InterviewPhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Question => "question",
            Self::Recording => "recording",
            Self::Review => "review",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a recording stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    Timeout,
}

impl StopReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a skip or advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index
    NextQuestion(usize),
    /// No questions remain; the interview is complete
    Completed,
    /// Request arrived in a phase where it does not apply
    Ignored,
}

/// Interview progress entity.
/// Tracks the phase machine and per-question outcomes for one session.
///
/// State machine:
///   INTRO -> QUESTION (start)
///   QUESTION -> RECORDING (begin_recording, after playback finished)
///   RECORDING -> REVIEW (stop_recording)
///   REVIEW -> QUESTION (advance: next question, or redo: same question)
///   REVIEW -> COMPLETE (advance past the last question)
///   QUESTION | RECORDING -> QUESTION | COMPLETE (skip)
///
/// Mutating calls from any other phase are no-ops, so duplicate UI
/// events cannot corrupt the machine.
#[derive(Debug)]
pub struct InterviewProgress {
    phase: InterviewPhase,
    current_index: usize,
    total_questions: usize,
    playback_finished: bool,
    answered: Vec<bool>,
    skipped: Vec<bool>,
}

impl InterviewProgress {
    /// Create progress for a session with the given question count
    pub fn new(total_questions: usize) -> Self {
        Self {
            phase: InterviewPhase::Intro,
            current_index: 0,
            total_questions,
            playback_finished: false,
            answered: vec![false; total_questions],
            skipped: vec![false; total_questions],
        }
    }

    /// Get the current phase
    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    /// Get the current question index (0-based)
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Get the total question count
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    /// Check whether the current question is the last one
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.total_questions
    }

    /// Check whether playback of the current question has finished
    pub fn playback_finished(&self) -> bool {
        self.playback_finished
    }

    /// Number of questions with a recorded answer
    pub fn answered_count(&self) -> usize {
        self.answered.iter().filter(|a| **a).count()
    }

    /// Number of questions skipped without an answer
    pub fn skipped_count(&self) -> usize {
        self.skipped.iter().filter(|s| **s).count()
    }

    /// INTRO -> QUESTION. Returns false when not in intro.
    pub fn start(&mut self) -> bool {
        if self.phase != InterviewPhase::Intro || self.total_questions == 0 {
            return false;
        }
        self.phase = InterviewPhase::Question;
        self.current_index = 0;
        self.playback_finished = false;
        true
    }

    /// Record that question playback has finished.
    /// Only meaningful while presenting a question.
    pub fn mark_playback_finished(&mut self) -> bool {
        if self.phase != InterviewPhase::Question {
            return false;
        }
        self.playback_finished = true;
        true
    }

    /// Check whether recording may begin now
    pub fn can_begin_recording(&self) -> bool {
        self.phase == InterviewPhase::Question && self.playback_finished
    }

    /// QUESTION -> RECORDING. Requires finished playback.
    pub fn begin_recording(&mut self) -> bool {
        if !self.can_begin_recording() {
            return false;
        }
        self.phase = InterviewPhase::Recording;
        true
    }

    /// RECORDING -> REVIEW. Returns false when not recording.
    pub fn stop_recording(&mut self) -> bool {
        if self.phase != InterviewPhase::Recording {
            return false;
        }
        self.phase = InterviewPhase::Review;
        true
    }

    /// Skip the current question from QUESTION or RECORDING.
    /// Marks it unanswered and moves on.
    pub fn skip(&mut self) -> Advance {
        if self.phase != InterviewPhase::Question && self.phase != InterviewPhase::Recording {
            return Advance::Ignored;
        }
        self.skipped[self.current_index] = true;
        self.move_on()
    }

    /// Leave REVIEW: count the answer and move to the next question
    /// or complete the session.
    pub fn advance(&mut self) -> Advance {
        if self.phase != InterviewPhase::Review {
            return Advance::Ignored;
        }
        self.answered[self.current_index] = true;
        self.skipped[self.current_index] = false;
        self.move_on()
    }

    /// REVIEW -> QUESTION for the same question (re-record).
    /// Playback is not repeated; recording may begin immediately.
    pub fn redo(&mut self) -> bool {
        if self.phase != InterviewPhase::Review {
            return false;
        }
        self.phase = InterviewPhase::Question;
        self.playback_finished = true;
        true
    }

    fn move_on(&mut self) -> Advance {
        if self.is_last_question() {
            self.phase = InterviewPhase::Complete;
            Advance::Completed
        } else {
            self.current_index += 1;
            self.phase = InterviewPhase::Question;
            self.playback_finished = false;
            Advance::NextQuestion(self.current_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(total: usize) -> InterviewProgress {
        let mut progress = InterviewProgress::new(total);
        assert!(progress.start());
        progress
    }

    #[test]
    fn new_progress_is_intro() {
        let progress = InterviewProgress::new(3);
        assert_eq!(progress.phase(), InterviewPhase::Intro);
        assert_eq!(progress.current_index(), 0);
        assert_eq!(progress.total_questions(), 3);
    }

    #[test]
    fn start_moves_to_question() {
        let mut progress = InterviewProgress::new(3);
        assert!(progress.start());
        assert_eq!(progress.phase(), InterviewPhase::Question);
    }

    #[test]
    fn start_twice_is_noop() {
        let mut progress = started(3);
        assert!(!progress.start());
        assert_eq!(progress.phase(), InterviewPhase::Question);
    }

    #[test]
    fn start_with_no_questions_is_noop() {
        let mut progress = InterviewProgress::new(0);
        assert!(!progress.start());
        assert_eq!(progress.phase(), InterviewPhase::Intro);
    }

    #[test]
    fn begin_recording_requires_playback_finished() {
        let mut progress = started(3);
        assert!(!progress.begin_recording());
        assert_eq!(progress.phase(), InterviewPhase::Question);

        progress.mark_playback_finished();
        assert!(progress.begin_recording());
        assert_eq!(progress.phase(), InterviewPhase::Recording);
    }

    #[test]
    fn begin_recording_from_intro_is_noop() {
        let mut progress = InterviewProgress::new(3);
        assert!(!progress.begin_recording());
        assert_eq!(progress.phase(), InterviewPhase::Intro);
    }

    #[test]
    fn stop_recording_moves_to_review() {
        let mut progress = started(3);
        progress.mark_playback_finished();
        progress.begin_recording();

        assert!(progress.stop_recording());
        assert_eq!(progress.phase(), InterviewPhase::Review);
    }

    #[test]
    fn stop_recording_outside_recording_is_noop() {
        let mut progress = started(3);
        assert!(!progress.stop_recording());
        assert_eq!(progress.phase(), InterviewPhase::Question);

        // Duplicate stop after the first one landed
        progress.mark_playback_finished();
        progress.begin_recording();
        assert!(progress.stop_recording());
        assert!(!progress.stop_recording());
        assert_eq!(progress.phase(), InterviewPhase::Review);
    }

    #[test]
    fn advance_moves_to_next_question() {
        let mut progress = started(3);
        progress.mark_playback_finished();
        progress.begin_recording();
        progress.stop_recording();

        assert_eq!(progress.advance(), Advance::NextQuestion(1));
        assert_eq!(progress.phase(), InterviewPhase::Question);
        assert!(!progress.playback_finished());
        assert_eq!(progress.answered_count(), 1);
    }

    #[test]
    fn advance_past_last_question_completes() {
        let mut progress = started(1);
        progress.mark_playback_finished();
        progress.begin_recording();
        progress.stop_recording();

        assert_eq!(progress.advance(), Advance::Completed);
        assert_eq!(progress.phase(), InterviewPhase::Complete);
        assert_eq!(progress.answered_count(), 1);
    }

    #[test]
    fn advance_outside_review_is_ignored() {
        let mut progress = started(2);
        assert_eq!(progress.advance(), Advance::Ignored);
        assert_eq!(progress.phase(), InterviewPhase::Question);
    }

    #[test]
    fn skip_from_question_advances() {
        let mut progress = started(3);
        assert_eq!(progress.skip(), Advance::NextQuestion(1));
        assert_eq!(progress.skipped_count(), 1);
        assert_eq!(progress.answered_count(), 0);
    }

    #[test]
    fn skip_from_recording_advances() {
        let mut progress = started(3);
        progress.mark_playback_finished();
        progress.begin_recording();

        assert_eq!(progress.skip(), Advance::NextQuestion(1));
        assert_eq!(progress.phase(), InterviewPhase::Question);
        assert_eq!(progress.skipped_count(), 1);
    }

    #[test]
    fn skip_last_question_completes() {
        let mut progress = started(1);
        assert_eq!(progress.skip(), Advance::Completed);
        assert_eq!(progress.phase(), InterviewPhase::Complete);
    }

    #[test]
    fn skip_from_review_is_ignored() {
        let mut progress = started(2);
        progress.mark_playback_finished();
        progress.begin_recording();
        progress.stop_recording();

        assert_eq!(progress.skip(), Advance::Ignored);
        assert_eq!(progress.phase(), InterviewPhase::Review);
    }

    #[test]
    fn redo_returns_to_same_question() {
        let mut progress = started(2);
        progress.mark_playback_finished();
        progress.begin_recording();
        progress.stop_recording();

        assert!(progress.redo());
        assert_eq!(progress.phase(), InterviewPhase::Question);
        assert_eq!(progress.current_index(), 0);
        // No replay needed; recording may begin again right away
        assert!(progress.can_begin_recording());
    }

    #[test]
    fn redo_outside_review_is_noop() {
        let mut progress = started(2);
        assert!(!progress.redo());
    }

    #[test]
    fn redo_then_advance_counts_answer_once() {
        let mut progress = started(1);
        progress.mark_playback_finished();
        progress.begin_recording();
        progress.stop_recording();
        progress.redo();
        progress.begin_recording();
        progress.stop_recording();

        assert_eq!(progress.advance(), Advance::Completed);
        assert_eq!(progress.answered_count(), 1);
    }

    #[test]
    fn full_cycle_through_all_questions() {
        let mut progress = started(2);
        for expected in [Advance::NextQuestion(1), Advance::Completed] {
            progress.mark_playback_finished();
            assert!(progress.begin_recording());
            assert!(progress.stop_recording());
            assert_eq!(progress.advance(), expected);
        }
        assert_eq!(progress.phase(), InterviewPhase::Complete);
        assert_eq!(progress.answered_count(), 2);
        assert_eq!(progress.skipped_count(), 0);
    }

    #[test]
    fn mutations_after_complete_are_noops() {
        let mut progress = started(1);
        progress.skip();
        assert_eq!(progress.phase(), InterviewPhase::Complete);

        assert!(!progress.start());
        assert!(!progress.begin_recording());
        assert!(!progress.stop_recording());
        assert_eq!(progress.skip(), Advance::Ignored);
        assert_eq!(progress.advance(), Advance::Ignored);
    }

    #[test]
    fn phase_display() {
        assert_eq!(InterviewPhase::Intro.to_string(), "intro");
        assert_eq!(InterviewPhase::Question.to_string(), "question");
        assert_eq!(InterviewPhase::Recording.to_string(), "recording");
        assert_eq!(InterviewPhase::Review.to_string(), "review");
        assert_eq!(InterviewPhase::Complete.to_string(), "complete");
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::Manual.to_string(), "manual");
        assert_eq!(StopReason::Timeout.to_string(), "timeout");
    }
}
