//! Help content shown by both surfaces.

use serde::Serialize;

pub const TITLE: &str = "Restaurant Review Chatbot";

pub const DESCRIPTION: &str = "Ask questions about the restaurant and get answers \
grounded in what customers actually wrote in their reviews.";

pub const HOW_IT_WORKS: [&str; 3] = [
    "Your question is used to search the indexed customer reviews.",
    "The most relevant reviews are handed to the language model with your question.",
    "The model answers from those reviews, and the reviews are shown alongside the answer.",
];

pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What do customers say about the pizza?",
    "Is the service good?",
    "What's the best pizza to order?",
    "Are there any complaints about delivery?",
];

#[derive(Debug, Clone, Serialize)]
pub struct About {
    pub title: &'static str,
    pub description: &'static str,
    pub how_it_works: Vec<&'static str>,
    pub example_questions: Vec<&'static str>,
}

pub fn about() -> About {
    About {
        title: TITLE,
        description: DESCRIPTION,
        how_it_works: HOW_IT_WORKS.to_vec(),
        example_questions: EXAMPLE_QUESTIONS.to_vec(),
    }
}

/// Banner printed by the terminal client at start-up.
pub fn banner() -> String {
    let mut out = format!("{}\n{}\n\nHow it works:\n", TITLE, DESCRIPTION);
    for (i, step) in HOW_IT_WORKS.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, step));
    }
    out.push_str("\nTry asking:\n");
    for question in EXAMPLE_QUESTIONS {
        out.push_str(&format!("  - {}\n", question));
    }
    out.push_str("\nType /clear to start over, Ctrl-D to quit.\n");
    out
}
