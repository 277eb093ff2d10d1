// src/models/lesson.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::question::{PublicQuestion, Question};

/// Lesson difficulty, also the XP multiplier tier for generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// XP reward multiplier applied per generated question.
    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Beginner => 1.0,
            Difficulty::Intermediate => 1.5,
            Difficulty::Advanced => 2.0,
        }
    }
}

/// Audience bracket lessons are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeCategory {
    Child,
    Teen,
    Adult,
}

impl AgeCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "child" => Some(AgeCategory::Child),
            "teen" => Some(AgeCategory::Teen),
            "adult" => Some(AgeCategory::Adult),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Child => "child",
            AgeCategory::Teen => "teen",
            AgeCategory::Adult => "adult",
        }
    }

    /// Maps a raw age band from onboarding to the lesson audience bracket.
    pub fn from_age_band(band: &str) -> Self {
        match band {
            "under13" => AgeCategory::Child,
            "13-17" => AgeCategory::Teen,
            _ => AgeCategory::Adult,
        }
    }
}

/// A complete lesson as authored by the content provider. Immutable once
/// generated; `order` is the slot in the topic sequence, -1 for daily
/// challenges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub age_group: AgeCategory,
    pub order: i64,
    pub xp_reward: i64,
    pub estimated_minutes: i64,
    pub questions: Vec<Question>,
    pub fun_facts: Vec<String>,
    pub reviewed: bool,
}

/// Database row for the 'lessons' table; questions and fun facts live in
/// JSONB columns.
#[derive(Debug, FromRow)]
pub struct LessonRow {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub age_group: String,
    pub sort_order: i64,
    pub xp_reward: i64,
    pub estimated_minutes: i64,
    pub questions: Json<Vec<Question>>,
    pub fun_facts: Json<Vec<String>>,
    pub reviewed: bool,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Lesson {
            id: row.id,
            topic_id: row.topic_id,
            title: row.title,
            description: row.description,
            difficulty: Difficulty::parse(&row.difficulty).unwrap_or(Difficulty::Beginner),
            age_group: AgeCategory::parse(&row.age_group).unwrap_or(AgeCategory::Adult),
            order: row.sort_order,
            xp_reward: row.xp_reward,
            estimated_minutes: row.estimated_minutes,
            questions: row.questions.0,
            fun_facts: row.fun_facts.0,
            reviewed: row.reviewed,
        }
    }
}

/// Listing DTO: lesson metadata without the question payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub age_group: AgeCategory,
    pub order: i64,
    pub xp_reward: i64,
    pub estimated_minutes: i64,
    pub question_count: usize,
}

/// Playable DTO: full lesson with answers stripped from every question.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicLesson {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub age_group: AgeCategory,
    pub order: i64,
    pub xp_reward: i64,
    pub estimated_minutes: i64,
    pub questions: Vec<PublicQuestion>,
}

impl Lesson {
    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            id: self.id.clone(),
            topic_id: self.topic_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            difficulty: self.difficulty,
            age_group: self.age_group,
            order: self.order,
            xp_reward: self.xp_reward,
            estimated_minutes: self.estimated_minutes,
            question_count: self.questions.len(),
        }
    }

    pub fn public(&self) -> PublicLesson {
        PublicLesson {
            id: self.id.clone(),
            topic_id: self.topic_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            difficulty: self.difficulty,
            age_group: self.age_group,
            order: self.order,
            xp_reward: self.xp_reward,
            estimated_minutes: self.estimated_minutes,
            questions: self.questions.iter().map(Question::public).collect(),
        }
    }
}

/// Outcome of one completed lesson attempt, submitted to the ledger once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResult {
    pub lesson_id: String,
    pub topic_id: String,
    /// Percentage, rounded.
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub xp_earned: i64,
    pub perfect_lesson: bool,
    pub time_spent_seconds: i64,
}
