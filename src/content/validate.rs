// src/content/validate.rs

//! Schema validation for provider-generated lessons. Generated content is
//! untrusted: everything is checked before it reaches storage, and a
//! rejected lesson is reported upstream rather than patched up.

use regex::Regex;
use std::sync::OnceLock;

use crate::content::provider::{ContentError, GeneratedLesson};
use crate::models::question::Question;

const MIN_QUESTIONS: usize = 8;
const MAX_QUESTIONS: usize = 12;
const MIN_FUN_FACTS: usize = 3;
const MAX_FUN_FACTS: usize = 8;
const OPTION_COUNT: usize = 4;
const MIN_TIMELINE_EVENTS: usize = 3;
const MAX_TIMELINE_EVENTS: usize = 6;

fn story_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").unwrap())
}

pub fn validate_generated(lesson: &GeneratedLesson) -> Result<(), ContentError> {
    if lesson.title.trim().is_empty() {
        return Err(invalid("empty title"));
    }
    if lesson.description.trim().is_empty() {
        return Err(invalid("empty description"));
    }
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&lesson.questions.len()) {
        return Err(invalid(&format!(
            "expected {MIN_QUESTIONS}-{MAX_QUESTIONS} questions, got {}",
            lesson.questions.len()
        )));
    }
    if !(MIN_FUN_FACTS..=MAX_FUN_FACTS).contains(&lesson.fun_facts.len()) {
        return Err(invalid(&format!(
            "expected {MIN_FUN_FACTS}-{MAX_FUN_FACTS} fun facts, got {}",
            lesson.fun_facts.len()
        )));
    }

    for (i, question) in lesson.questions.iter().enumerate() {
        validate_question(question).map_err(|e| invalid(&format!("question {i}: {e}")))?;
    }

    Ok(())
}

fn validate_question(question: &Question) -> Result<(), String> {
    match question {
        Question::MultipleChoice(q) => {
            if q.options.len() != OPTION_COUNT {
                return Err(format!("expected {OPTION_COUNT} options, got {}", q.options.len()));
            }
            if q.correct_index >= q.options.len() {
                return Err(format!("correctIndex {} out of range", q.correct_index));
            }
        }
        Question::WhoSaidIt(q) => {
            if q.options.len() != OPTION_COUNT {
                return Err(format!("expected {OPTION_COUNT} options, got {}", q.options.len()));
            }
            if q.correct_index >= q.options.len() {
                return Err(format!("correctIndex {} out of range", q.correct_index));
            }
        }
        Question::TrueFalse(q) => {
            if q.statement.trim().is_empty() {
                return Err("empty statement".to_string());
            }
        }
        Question::FillBlank(q) => {
            let placeholders = q.template.matches("___").count();
            if placeholders != 1 {
                return Err(format!(
                    "template must contain exactly one ___ placeholder, found {placeholders}"
                ));
            }
            if q.answer.trim().is_empty() {
                return Err("empty answer".to_string());
            }
        }
        Question::TimelineOrder(q) => {
            if !(MIN_TIMELINE_EVENTS..=MAX_TIMELINE_EVENTS).contains(&q.events.len()) {
                return Err(format!(
                    "expected {MIN_TIMELINE_EVENTS}-{MAX_TIMELINE_EVENTS} events, got {}",
                    q.events.len()
                ));
            }
        }
        Question::StoryCompletion(q) => {
            if q.blanks.is_empty() {
                return Err("no blanks".to_string());
            }
            // Every numbered marker must reference an existing blank, and
            // every blank must be referenced at least once.
            let mut referenced = vec![false; q.blanks.len()];
            for cap in story_marker_re().captures_iter(&q.narrative) {
                let number: usize = cap[1].parse().map_err(|_| "bad marker".to_string())?;
                if number == 0 || number > q.blanks.len() {
                    return Err(format!("marker [{number}] has no matching blank"));
                }
                referenced[number - 1] = true;
            }
            if let Some(missing) = referenced.iter().position(|r| !r) {
                return Err(format!("blank {} is never referenced", missing + 1));
            }
            if q.blanks.iter().any(|b| b.answer.trim().is_empty()) {
                return Err("empty blank answer".to_string());
            }
        }
    }
    Ok(())
}

fn invalid(msg: &str) -> ContentError {
    ContentError::Invalid(msg.to_string())
}
