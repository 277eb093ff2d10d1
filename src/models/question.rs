// src/models/question.rs

use serde::{Deserialize, Serialize};

/// One event inside a timeline-ordering question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub text: String,
    pub year: i32,
}

/// One blank inside a story-completion narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBlank {
    pub answer: String,
    pub acceptable_answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineOrderQuestion {
    pub prompt: String,
    pub events: Vec<TimelineEvent>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseQuestion {
    pub statement: String,
    pub correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlankQuestion {
    /// Sentence containing exactly one `___` placeholder.
    pub template: String,
    pub answer: String,
    pub acceptable_answers: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoSaidItQuestion {
    pub quote: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCompletionQuestion {
    /// Narrative paragraph with numbered `[1]`, `[2]`, ... blank markers.
    pub narrative: String,
    pub blanks: Vec<StoryBlank>,
    pub explanation: String,
}

/// The six authored question variants, discriminated by a `type` tag on the
/// wire and in storage. Adding a seventh variant means one entry here plus
/// one evaluator branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice(MultipleChoiceQuestion),
    TimelineOrder(TimelineOrderQuestion),
    TrueFalse(TrueFalseQuestion),
    FillBlank(FillInBlankQuestion),
    WhoSaidIt(WhoSaidItQuestion),
    StoryCompletion(StoryCompletionQuestion),
}

impl Question {
    /// Explanation (or context, for quotes) revealed after answering.
    pub fn explanation(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.explanation,
            Question::TimelineOrder(q) => &q.explanation,
            Question::TrueFalse(q) => &q.explanation,
            Question::FillBlank(q) => &q.explanation,
            Question::WhoSaidIt(q) => &q.context,
            Question::StoryCompletion(q) => &q.explanation,
        }
    }

    /// Projection for clients: the same variant with every answer field
    /// stripped, so lesson payloads never leak correct answers.
    pub fn public(&self) -> PublicQuestion {
        match self {
            Question::MultipleChoice(q) => PublicQuestion::MultipleChoice {
                prompt: q.prompt.clone(),
                options: q.options.clone(),
            },
            Question::TimelineOrder(q) => PublicQuestion::TimelineOrder {
                prompt: q.prompt.clone(),
                events: q.events.iter().map(|e| e.text.clone()).collect(),
            },
            Question::TrueFalse(q) => PublicQuestion::TrueFalse {
                statement: q.statement.clone(),
            },
            Question::FillBlank(q) => PublicQuestion::FillBlank {
                template: q.template.clone(),
            },
            Question::WhoSaidIt(q) => PublicQuestion::WhoSaidIt {
                quote: q.quote.clone(),
                options: q.options.clone(),
            },
            Question::StoryCompletion(q) => PublicQuestion::StoryCompletion {
                narrative: q.narrative.clone(),
                blank_count: q.blanks.len(),
            },
        }
    }
}

/// Answer-free view of a question, safe to hand to the UI before the user
/// has answered. Timeline events are listed in authored order with their
/// years withheld; the submission is a permutation of these indices.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicQuestion {
    #[serde(rename_all = "camelCase")]
    MultipleChoice { prompt: String, options: Vec<String> },
    #[serde(rename_all = "camelCase")]
    TimelineOrder { prompt: String, events: Vec<String> },
    #[serde(rename_all = "camelCase")]
    TrueFalse { statement: String },
    #[serde(rename_all = "camelCase")]
    FillBlank { template: String },
    #[serde(rename_all = "camelCase")]
    WhoSaidIt { quote: String, options: Vec<String> },
    #[serde(rename_all = "camelCase")]
    StoryCompletion {
        narrative: String,
        blank_count: usize,
    },
}

/// A submitted answer value. Untagged on the wire: a bare bool, an option
/// index, a text answer, an index permutation or a list of blank answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Bool(bool),
    Choice(usize),
    Text(String),
    Order(Vec<usize>),
    Blanks(Vec<String>),
}
