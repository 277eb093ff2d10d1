// src/engine/session.rs

//! The per-attempt lesson session state machine.
//!
//! A session is ephemeral: it lives in server memory for one lesson attempt
//! and never touches the database itself. Answer submission emits events
//! (`HeartLost`, `XpAwarded`) that the caller routes to the ledger or to the
//! client as optimistic UI deltas; only a finished session produces a
//! `LessonResult` for the ledger, guarded so it is applied at most once.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::{PERFECT_LESSON_BONUS, XP_PER_CORRECT_ANSWER};
use crate::engine::evaluator;
use crate::models::lesson::{Lesson, LessonResult};
use crate::models::question::{Question, SubmittedAnswer};

/// Invalid transition attempted by the caller. These are UI bugs; the
/// session state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    AlreadyAnswered,
    NotAnswered,
    LessonComplete,
    NotComplete,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SessionError::AlreadyAnswered => "Current question has already been answered",
            SessionError::NotAnswered => "Current question has not been answered yet",
            SessionError::LessonComplete => "Lesson is already complete",
            SessionError::NotComplete => "Lesson is not complete yet",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for SessionError {}

/// Side effects the caller must carry out after an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Optimistic per-question XP for immediate UI feedback; the
    /// authoritative award happens when the finished result is applied.
    XpAwarded(i64),
    /// The caller deducts one heart through the ledger.
    HeartLost,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub explanation: String,
    pub fun_fact: Option<String>,
    /// Per-blank verdicts for story-completion questions.
    pub blank_results: Option<Vec<bool>>,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Complete,
}

#[derive(Debug, Clone)]
pub struct LessonSession {
    lesson: Lesson,
    current_index: usize,
    answers: Vec<Option<SubmittedAnswer>>,
    is_correct: Option<bool>,
    show_explanation: bool,
    correct_count: i64,
    started_at: DateTime<Utc>,
    complete: bool,
    /// Set once a finish submission has been claimed; cleared again if the
    /// ledger write fails so the client can retry.
    submitted: bool,
}

impl LessonSession {
    pub fn start(lesson: Lesson, now: DateTime<Utc>) -> Self {
        let answers = vec![None; lesson.questions.len()];
        Self {
            lesson,
            current_index: 0,
            answers,
            is_correct: None,
            show_explanation: false,
            correct_count: 0,
            started_at: now,
            complete: false,
            submitted: false,
        }
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.lesson.questions.len()
    }

    pub fn correct_count(&self) -> i64 {
        self.correct_count
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    pub fn show_explanation(&self) -> bool {
        self.show_explanation
    }

    pub fn answered(&self) -> Vec<bool> {
        self.answers.iter().map(Option::is_some).collect()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.complete {
            None
        } else {
            self.lesson.questions.get(self.current_index)
        }
    }

    /// Evaluates and records an answer for the current question.
    ///
    /// Valid only while the lesson is in progress and the current question
    /// is unanswered; the session then waits in the explanation state until
    /// `advance` is called.
    pub fn submit_answer(
        &mut self,
        answer: SubmittedAnswer,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.complete {
            return Err(SessionError::LessonComplete);
        }
        if self.answers[self.current_index].is_some() {
            return Err(SessionError::AlreadyAnswered);
        }

        let question = &self.lesson.questions[self.current_index];
        let correct = evaluator::evaluate(question, &answer);
        let blank_results = match (question, &answer) {
            (Question::StoryCompletion(q), SubmittedAnswer::Blanks(values)) => {
                Some(evaluator::blank_results(q, values))
            }
            _ => None,
        };
        let explanation = question.explanation().to_string();

        self.answers[self.current_index] = Some(answer);
        self.is_correct = Some(correct);
        self.show_explanation = true;
        if correct {
            self.correct_count += 1;
        }

        let events = if correct {
            vec![SessionEvent::XpAwarded(XP_PER_CORRECT_ANSWER)]
        } else {
            vec![SessionEvent::HeartLost]
        };

        let fun_fact = if self.lesson.fun_facts.is_empty() {
            None
        } else {
            let idx = self.current_index % self.lesson.fun_facts.len();
            Some(self.lesson.fun_facts[idx].clone())
        };

        Ok(AnswerOutcome {
            correct,
            explanation,
            fun_fact,
            blank_results,
            events,
        })
    }

    /// Moves past an answered question, either to the next question or into
    /// the terminal complete state.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.complete {
            return Err(SessionError::LessonComplete);
        }
        if self.answers[self.current_index].is_none() {
            return Err(SessionError::NotAnswered);
        }

        self.is_correct = None;
        self.show_explanation = false;

        if self.current_index + 1 >= self.lesson.questions.len() {
            self.complete = true;
            Ok(Advance::Complete)
        } else {
            self.current_index += 1;
            Ok(Advance::Next {
                index: self.current_index,
            })
        }
    }

    /// The result of a completed session. Pure and repeatable; the ledger
    /// submission guard is separate (`begin_submit`).
    pub fn result(&self, now: DateTime<Utc>) -> Result<LessonResult, SessionError> {
        if !self.complete {
            return Err(SessionError::NotComplete);
        }

        let total = self.lesson.questions.len() as i64;
        let correct = self.correct_count;
        let perfect = correct == total;
        let score = ((correct as f64 / total as f64) * 100.0).round() as i64;
        let xp_earned =
            correct * XP_PER_CORRECT_ANSWER + if perfect { PERFECT_LESSON_BONUS } else { 0 };
        let time_spent_seconds = (now - self.started_at).num_seconds().max(0);

        Ok(LessonResult {
            lesson_id: self.lesson.id.clone(),
            topic_id: self.lesson.topic_id.clone(),
            score,
            total_questions: total,
            correct_answers: correct,
            xp_earned,
            perfect_lesson: perfect,
            time_spent_seconds,
        })
    }

    /// Claims the one-shot ledger submission. Returns false when a
    /// submission has already been claimed (duplicate finish call).
    pub fn begin_submit(&mut self) -> bool {
        if self.submitted {
            false
        } else {
            self.submitted = true;
            true
        }
    }

    /// Releases the submission claim after a failed ledger write so that
    /// `finish` can be retried.
    pub fn abort_submit(&mut self) {
        self.submitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lesson::{AgeCategory, Difficulty};
    use crate::models::question::{MultipleChoiceQuestion, TrueFalseQuestion};

    fn lesson(question_count: usize) -> Lesson {
        let questions = (0..question_count)
            .map(|i| {
                Question::MultipleChoice(MultipleChoiceQuestion {
                    prompt: format!("Question {i}"),
                    options: vec![
                        "a".to_string(),
                        "b".to_string(),
                        "c".to_string(),
                        "d".to_string(),
                    ],
                    correct_index: 0,
                    explanation: "Because.".to_string(),
                    image_url: None,
                })
            })
            .collect();
        Lesson {
            id: "lesson-1".to_string(),
            topic_id: "ancient-egypt".to_string(),
            title: "Test lesson".to_string(),
            description: "".to_string(),
            difficulty: Difficulty::Beginner,
            age_group: AgeCategory::Adult,
            order: 1,
            xp_reward: 100,
            estimated_minutes: 4,
            questions,
            fun_facts: vec!["Fact one.".to_string(), "Fact two.".to_string()],
            reviewed: true,
        }
    }

    fn answer_all(session: &mut LessonSession, correct_answers: usize) {
        let total = session.total_questions();
        for i in 0..total {
            let answer = if i < correct_answers {
                SubmittedAnswer::Choice(0)
            } else {
                SubmittedAnswer::Choice(1)
            };
            session.submit_answer(answer).unwrap();
            session.advance().unwrap();
        }
    }

    #[test]
    fn happy_path_counts_correct_answers() {
        let mut s = LessonSession::start(lesson(3), Utc::now());
        assert_eq!(s.total_questions(), 3);

        let outcome = s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.events, vec![SessionEvent::XpAwarded(10)]);
        assert_eq!(s.advance().unwrap(), Advance::Next { index: 1 });

        let outcome = s.submit_answer(SubmittedAnswer::Choice(2)).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.events, vec![SessionEvent::HeartLost]);
        assert_eq!(s.advance().unwrap(), Advance::Next { index: 2 });

        s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        assert_eq!(s.advance().unwrap(), Advance::Complete);
        assert!(s.is_complete());
        assert_eq!(s.correct_count(), 2);
    }

    #[test]
    fn double_submit_is_rejected_without_mutation() {
        let mut s = LessonSession::start(lesson(2), Utc::now());
        s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        let err = s.submit_answer(SubmittedAnswer::Choice(0)).unwrap_err();
        assert_eq!(err, SessionError::AlreadyAnswered);
        assert_eq!(s.correct_count(), 1);
    }

    #[test]
    fn advance_before_answer_is_rejected() {
        let mut s = LessonSession::start(lesson(2), Utc::now());
        assert_eq!(s.advance().unwrap_err(), SessionError::NotAnswered);
    }

    #[test]
    fn submit_after_complete_is_rejected() {
        let mut s = LessonSession::start(lesson(1), Utc::now());
        s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        s.advance().unwrap();
        assert_eq!(
            s.submit_answer(SubmittedAnswer::Choice(0)).unwrap_err(),
            SessionError::LessonComplete
        );
        assert_eq!(s.advance().unwrap_err(), SessionError::LessonComplete);
    }

    #[test]
    fn result_before_complete_is_rejected() {
        let s = LessonSession::start(lesson(2), Utc::now());
        assert_eq!(
            s.result(Utc::now()).unwrap_err(),
            SessionError::NotComplete
        );
    }

    #[test]
    fn six_of_eight_scores_seventy_five() {
        let started = Utc::now();
        let mut s = LessonSession::start(lesson(8), started);
        answer_all(&mut s, 6);

        let result = s.result(started + chrono::Duration::seconds(90)).unwrap();
        assert_eq!(result.score, 75);
        assert_eq!(result.correct_answers, 6);
        assert_eq!(result.xp_earned, 60);
        assert!(!result.perfect_lesson);
        assert_eq!(result.time_spent_seconds, 90);
    }

    #[test]
    fn perfect_lesson_earns_bonus() {
        let mut s = LessonSession::start(lesson(8), Utc::now());
        answer_all(&mut s, 8);

        let result = s.result(Utc::now()).unwrap();
        assert_eq!(result.score, 100);
        assert!(result.perfect_lesson);
        assert_eq!(result.xp_earned, 8 * 10 + 50);
    }

    #[test]
    fn submission_claim_is_one_shot_until_aborted() {
        let mut s = LessonSession::start(lesson(1), Utc::now());
        s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        s.advance().unwrap();

        assert!(s.begin_submit());
        assert!(!s.begin_submit());
        s.abort_submit();
        assert!(s.begin_submit());
    }

    #[test]
    fn result_is_repeatable() {
        let started = Utc::now();
        let mut s = LessonSession::start(lesson(2), started);
        answer_all(&mut s, 1);

        let now = started + chrono::Duration::seconds(30);
        let a = s.result(now).unwrap();
        let b = s.result(now).unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.xp_earned, b.xp_earned);
    }

    #[test]
    fn fun_facts_rotate_by_question_index() {
        let mut s = LessonSession::start(lesson(3), Utc::now());
        let o = s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        assert_eq!(o.fun_fact.as_deref(), Some("Fact one."));
        s.advance().unwrap();
        let o = s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        assert_eq!(o.fun_fact.as_deref(), Some("Fact two."));
        s.advance().unwrap();
        let o = s.submit_answer(SubmittedAnswer::Choice(0)).unwrap();
        assert_eq!(o.fun_fact.as_deref(), Some("Fact one."));
    }

    #[test]
    fn wrong_answer_shape_counts_as_incorrect() {
        let mut s = LessonSession::start(lesson(1), Utc::now());
        let o = s
            .submit_answer(SubmittedAnswer::Text("Khufu".to_string()))
            .unwrap();
        assert!(!o.correct);
        assert_eq!(s.correct_count(), 0);
    }

    #[test]
    fn true_false_lesson_round_trip() {
        let questions = vec![Question::TrueFalse(TrueFalseQuestion {
            statement: "Rome fell in 476 AD.".to_string(),
            correct: true,
            explanation: "The Western Empire did.".to_string(),
        })];
        let mut template = lesson(1);
        template.questions = questions;
        let mut s = LessonSession::start(template, Utc::now());
        let o = s.submit_answer(SubmittedAnswer::Bool(true)).unwrap();
        assert!(o.correct);
    }
}
