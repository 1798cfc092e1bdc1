//! Plain-text rendering of turns for the terminal client.

use std::fmt::Write;

use super::transcript::{Role, Transcript, Turn};
use crate::rag::RetrievedReview;

const RULE: &str = "---";

pub fn render_turn(turn: &Turn) -> String {
    let speaker = match turn.role() {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let mut out = format!("{}: {}\n", speaker, turn.text());
    if let Some(reviews) = turn.reviews() {
        out.push_str(&render_reviews(reviews));
    }
    out
}

pub fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .turns()
        .iter()
        .map(render_turn)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The grounding reviews shown under an answer.
pub fn render_reviews(reviews: &[RetrievedReview]) -> String {
    if reviews.is_empty() {
        return String::new();
    }

    let mut out = String::from("\nRelevant reviews used:\n");
    for (i, retrieved) in reviews.iter().enumerate() {
        let _ = writeln!(
            out,
            "Review {} (Rating: {})\n  {}\n{}",
            i + 1,
            retrieved.review.rating_label(),
            retrieved.review.content(),
            RULE
        );
    }
    out
}
