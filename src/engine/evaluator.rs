// src/engine/evaluator.rs

//! Pure answer evaluation for the six question variants. No state, no side
//! effects; the session state machine is the only caller.

use crate::models::question::{
    Question, StoryBlank, StoryCompletionQuestion, SubmittedAnswer, TimelineEvent,
};

/// Decides whether a submitted answer is correct for the given question.
///
/// An answer whose shape does not match the question variant (e.g. a text
/// answer for a multiple-choice question) is simply incorrect; malformed
/// questions are the content provider's bug and are not tolerated here.
pub fn evaluate(question: &Question, answer: &SubmittedAnswer) -> bool {
    match (question, answer) {
        (Question::MultipleChoice(q), SubmittedAnswer::Choice(idx)) => *idx == q.correct_index,
        (Question::WhoSaidIt(q), SubmittedAnswer::Choice(idx)) => *idx == q.correct_index,
        (Question::TrueFalse(q), SubmittedAnswer::Bool(value)) => *value == q.correct,
        (Question::FillBlank(q), SubmittedAnswer::Text(text)) => {
            text_matches(text, &q.answer, &q.acceptable_answers)
        }
        (Question::TimelineOrder(q), SubmittedAnswer::Order(order)) => {
            *order == reference_order(&q.events)
        }
        (Question::StoryCompletion(q), SubmittedAnswer::Blanks(answers)) => {
            answers.len() == q.blanks.len()
                && blank_results(q, answers).into_iter().all(|correct| correct)
        }
        _ => false,
    }
}

/// Per-blank correctness of a story-completion submission, for display.
/// The question as a whole only counts as correct when every blank matches.
pub fn blank_results(question: &StoryCompletionQuestion, answers: &[String]) -> Vec<bool> {
    question
        .blanks
        .iter()
        .enumerate()
        .map(|(i, blank)| match answers.get(i) {
            Some(answer) => blank_matches(answer, blank),
            None => false,
        })
        .collect()
}

/// The correct ordering of a timeline question, as authored-event indices
/// sorted ascending by year. The sort is stable, so events sharing a year
/// keep their authored order.
pub fn reference_order(events: &[TimelineEvent]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| events[i].year);
    order
}

fn blank_matches(submitted: &str, blank: &StoryBlank) -> bool {
    text_matches(submitted, &blank.answer, &blank.acceptable_answers)
}

fn text_matches(submitted: &str, answer: &str, acceptable: &[String]) -> bool {
    let normalized = normalize(submitted);
    normalized == normalize(answer) || acceptable.iter().any(|a| normalize(a) == normalized)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{
        FillInBlankQuestion, MultipleChoiceQuestion, TimelineOrderQuestion, TrueFalseQuestion,
        WhoSaidItQuestion,
    };

    fn multiple_choice(correct_index: usize) -> Question {
        Question::MultipleChoice(MultipleChoiceQuestion {
            prompt: "Which river runs through Egypt?".to_string(),
            options: vec![
                "Tigris".to_string(),
                "Nile".to_string(),
                "Danube".to_string(),
                "Indus".to_string(),
            ],
            correct_index,
            explanation: "The Nile.".to_string(),
            image_url: None,
        })
    }

    fn fill_blank() -> Question {
        Question::FillBlank(FillInBlankQuestion {
            template: "The ___ limited the power of King John.".to_string(),
            answer: "Magna Carta".to_string(),
            acceptable_answers: vec!["the magna carta".to_string()],
            explanation: "Sealed in 1215.".to_string(),
        })
    }

    fn timeline(years: &[i32]) -> Question {
        Question::TimelineOrder(TimelineOrderQuestion {
            prompt: "Order these events.".to_string(),
            events: years
                .iter()
                .map(|&year| TimelineEvent {
                    text: format!("event in {year}"),
                    year,
                })
                .collect(),
            explanation: "Chronology matters.".to_string(),
        })
    }

    #[test]
    fn multiple_choice_matches_index() {
        let q = multiple_choice(1);
        assert!(evaluate(&q, &SubmittedAnswer::Choice(1)));
        assert!(!evaluate(&q, &SubmittedAnswer::Choice(0)));
    }

    #[test]
    fn who_said_it_matches_index() {
        let q = Question::WhoSaidIt(WhoSaidItQuestion {
            quote: "Veni, vidi, vici.".to_string(),
            options: vec![
                "Augustus".to_string(),
                "Julius Caesar".to_string(),
                "Cicero".to_string(),
                "Nero".to_string(),
            ],
            correct_index: 1,
            context: "After the battle of Zela, 47 BC.".to_string(),
        });
        assert!(evaluate(&q, &SubmittedAnswer::Choice(1)));
        assert!(!evaluate(&q, &SubmittedAnswer::Choice(3)));
    }

    #[test]
    fn true_false_matches_bool() {
        let q = Question::TrueFalse(TrueFalseQuestion {
            statement: "The Colosseum is in Rome.".to_string(),
            correct: true,
            explanation: "It is.".to_string(),
        });
        assert!(evaluate(&q, &SubmittedAnswer::Bool(true)));
        assert!(!evaluate(&q, &SubmittedAnswer::Bool(false)));
    }

    #[test]
    fn fill_blank_is_case_insensitive_and_trims() {
        let q = fill_blank();
        assert!(evaluate(&q, &SubmittedAnswer::Text(" Magna carta ".to_string())));
        assert!(evaluate(&q, &SubmittedAnswer::Text("THE MAGNA CARTA".to_string())));
        assert!(!evaluate(&q, &SubmittedAnswer::Text("magna".to_string())));
    }

    #[test]
    fn timeline_reference_is_ascending_by_year() {
        let q = timeline(&[1215, 1066, 1453]);
        // Ascending years 1066, 1215, 1453 live at authored indices 1, 0, 2.
        assert!(evaluate(&q, &SubmittedAnswer::Order(vec![1, 0, 2])));
        assert!(!evaluate(&q, &SubmittedAnswer::Order(vec![0, 1, 2])));
    }

    #[test]
    fn timeline_already_sorted_expects_identity() {
        let q = timeline(&[1066, 1215, 1453]);
        assert!(evaluate(&q, &SubmittedAnswer::Order(vec![0, 1, 2])));
        assert!(!evaluate(&q, &SubmittedAnswer::Order(vec![2, 0, 1])));
    }

    #[test]
    fn timeline_ties_keep_authored_order() {
        let q = timeline(&[1492, 1492, 1453]);
        assert!(evaluate(&q, &SubmittedAnswer::Order(vec![2, 0, 1])));
        assert!(!evaluate(&q, &SubmittedAnswer::Order(vec![2, 1, 0])));
    }

    #[test]
    fn timeline_partial_permutation_is_incorrect() {
        let q = timeline(&[1066, 1215, 1453]);
        assert!(!evaluate(&q, &SubmittedAnswer::Order(vec![0, 1])));
    }

    fn story() -> StoryCompletionQuestion {
        StoryCompletionQuestion {
            narrative: "In [1], Columbus sailed for [2].".to_string(),
            blanks: vec![
                StoryBlank {
                    answer: "1492".to_string(),
                    acceptable_answers: vec![],
                },
                StoryBlank {
                    answer: "Spain".to_string(),
                    acceptable_answers: vec!["the spanish crown".to_string()],
                },
            ],
            explanation: "Backed by Ferdinand and Isabella.".to_string(),
        }
    }

    #[test]
    fn story_requires_every_blank() {
        let q = Question::StoryCompletion(story());
        assert!(evaluate(
            &q,
            &SubmittedAnswer::Blanks(vec!["1492".to_string(), "spain".to_string()])
        ));
        assert!(!evaluate(
            &q,
            &SubmittedAnswer::Blanks(vec!["1492".to_string(), "portugal".to_string()])
        ));
        // Missing blanks are never correct.
        assert!(!evaluate(
            &q,
            &SubmittedAnswer::Blanks(vec!["1492".to_string()])
        ));
    }

    #[test]
    fn story_blank_results_are_per_blank() {
        let q = story();
        let results = blank_results(
            &q,
            &["1492".to_string(), "France".to_string()],
        );
        assert_eq!(results, vec![true, false]);
    }

    #[test]
    fn mismatched_answer_shape_is_incorrect() {
        let q = multiple_choice(0);
        assert!(!evaluate(&q, &SubmittedAnswer::Text("Nile".to_string())));
        assert!(!evaluate(&q, &SubmittedAnswer::Bool(true)));
    }
}
