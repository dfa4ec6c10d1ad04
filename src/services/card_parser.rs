//! Extraction of question/answer cards from free-form model output.
//!
//! Grammar, applied to each trimmed non-blank line:
//!
//! ```text
//! line     := prefix? marker ':' text
//! prefix   := list numbering ("1." / "1)" / "-" / "*") and/or "**" emphasis
//! marker   := "Q" | "Question" | "A" | "Answer"      (case-insensitive)
//! ```
//!
//! Lines without a marker are ignored. A question waits for the next answer
//! marker; a second question before that replaces it, and an answer with no
//! pending question is dropped. Only pairs with both sides non-empty become
//! cards.

use crate::models::card::Card;
use crate::services::synthesis::SynthesisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Question,
    Answer,
}

#[derive(Debug)]
enum State {
    AwaitingQuestion,
    AwaitingAnswer { question: String },
}

/// Parse every complete Q/A pair out of `response`.
///
/// Fails with [`SynthesisError::NoCardsParsed`] when nothing usable is found.
pub fn parse_cards(response: &str) -> Result<Vec<Card>, SynthesisError> {
    let mut cards = Vec::new();
    let mut state = State::AwaitingQuestion;

    for line in response.lines() {
        let Some((marker, text)) = split_marker(line) else {
            continue;
        };

        state = match (state, marker) {
            (_, Marker::Question) => State::AwaitingAnswer {
                question: text.to_string(),
            },
            (State::AwaitingAnswer { question }, Marker::Answer) => {
                if !question.is_empty() && !text.is_empty() {
                    cards.push(Card::new(question, text));
                }
                State::AwaitingQuestion
            }
            (State::AwaitingQuestion, Marker::Answer) => State::AwaitingQuestion,
        };
    }

    if cards.is_empty() {
        return Err(SynthesisError::NoCardsParsed);
    }
    Ok(cards)
}

fn split_marker(line: &str) -> Option<(Marker, &str)> {
    let line = strip_prefix_decoration(line.trim());
    let (label, rest) = line.split_once(':')?;
    let label = label.trim_end_matches('*').trim();

    let marker = if label.eq_ignore_ascii_case("q") || label.eq_ignore_ascii_case("question") {
        Marker::Question
    } else if label.eq_ignore_ascii_case("a") || label.eq_ignore_ascii_case("answer") {
        Marker::Answer
    } else {
        return None;
    };

    let text = rest.trim().trim_start_matches('*').trim();
    Some((marker, text))
}

fn strip_prefix_decoration(line: &str) -> &str {
    let mut s = line;
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let after = &s[digits..];
        if let Some(rest) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            s = rest.trim_start();
        }
    } else if let Some(rest) = s.strip_prefix("- ").or_else(|| s.strip_prefix("* ")) {
        s = rest.trim_start();
    }
    s.trim_start_matches('*').trim_start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_well_formed_pairs() {
        let response = "Here are your cards:\n\nQ: What is a convex set?\nA: A set containing every segment between its points.\n\nQ: What is a saddle point?\nA: A stationary point that is not an extremum.\n";
        let cards = parse_cards(response).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What is a convex set?");
        assert_eq!(
            cards[1].answer,
            "A stationary point that is not an extremum."
        );
    }

    #[test]
    fn test_dangling_question_yields_no_card() {
        let response = "Q: First?\nQ: Second?\nA: Second answer\n";
        let cards = parse_cards(response).unwrap();
        assert_eq!(cards, vec![Card::new("Second?", "Second answer")]);
    }

    #[test]
    fn test_trailing_question_is_discarded() {
        let response = "Q: One?\nA: Yes\nQ: Two?\n";
        let cards = parse_cards(response).unwrap();
        assert_eq!(cards, vec![Card::new("One?", "Yes")]);
    }

    #[test]
    fn test_orphan_answer_is_not_attached_to_next_question() {
        let response = "A: stray\nQ: Real?\nA: Real answer\nQ: Lonely?\n";
        let cards = parse_cards(response).unwrap();
        assert_eq!(cards, vec![Card::new("Real?", "Real answer")]);
    }

    #[test]
    fn test_empty_sides_are_skipped() {
        let response = "Q:\nA: nothing asked\nQ: Asked?\nA:   \nQ: Kept?\nA: kept";
        let cards = parse_cards(response).unwrap();
        assert_eq!(cards, vec![Card::new("Kept?", "kept")]);
    }

    #[test]
    fn test_tolerates_numbering_and_emphasis() {
        let response = "1. **Q:** What is duality?\n**A:** A pairing of problems.\n2) Question: Why?\nAnswer: Bounds.";
        let cards = parse_cards(response).unwrap();
        assert_eq!(
            cards,
            vec![
                Card::new("What is duality?", "A pairing of problems."),
                Card::new("Why?", "Bounds."),
            ]
        );
    }

    #[test]
    fn test_keeps_colons_inside_text() {
        let cards = parse_cards("Q: Ratio 1:2?\nA: Half: 0.5").unwrap();
        assert_eq!(cards, vec![Card::new("Ratio 1:2?", "Half: 0.5")]);
    }

    #[test]
    fn test_no_cards_is_an_error() {
        let err = parse_cards("I cannot help with that.").unwrap_err();
        assert!(matches!(err, SynthesisError::NoCardsParsed));
    }
}
