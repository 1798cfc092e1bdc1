//! Prompt composition for grounded answers.

use crate::rag::RetrievedReview;

pub const REVIEWS_PLACEHOLDER: &str = "{reviews}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";
pub const RESTAURANT_PLACEHOLDER: &str = "{restaurant}";

pub const DEFAULT_TEMPLATE: &str = "\
You are an expert in answering questions about {restaurant}.

Here are some relevant reviews: {reviews}

Here is the question: {question}

Answer using only the information in the reviews above. If they do not contain the answer, say so.
";

const NO_REVIEWS: &str = "(no relevant reviews found)";

/// Renders the question and its grounding reviews into a model prompt.
///
/// Composition is a pure function of its inputs. Placeholders are replaced
/// in a single pass over the template, so placeholder-like text inside a
/// question or a review is copied verbatim.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    template: String,
    restaurant: String,
}

impl PromptComposer {
    pub fn new(template: Option<String>, restaurant: impl Into<String>) -> Self {
        Self {
            template: template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            restaurant: restaurant.into(),
        }
    }

    pub fn compose(&self, question: &str, reviews: &[RetrievedReview]) -> String {
        let rendered_reviews = render_reviews(reviews);
        let substitutions = [
            (REVIEWS_PLACEHOLDER, rendered_reviews.as_str()),
            (QUESTION_PLACEHOLDER, question.trim()),
            (RESTAURANT_PLACEHOLDER, self.restaurant.as_str()),
        ];

        let mut out = String::with_capacity(self.template.len() + rendered_reviews.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos..];
            match substitutions
                .iter()
                .find(|(placeholder, _)| rest.starts_with(placeholder))
            {
                Some((placeholder, value)) => {
                    out.push_str(value);
                    rest = &rest[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(None, crate::core::config::defaults::DEFAULT_RESTAURANT)
    }
}

fn render_reviews(reviews: &[RetrievedReview]) -> String {
    if reviews.is_empty() {
        return NO_REVIEWS.to_string();
    }

    let lines: Vec<String> = reviews
        .iter()
        .enumerate()
        .map(|(i, retrieved)| {
            format!(
                "Review {} (Rating: {}): {}",
                i + 1,
                retrieved.review.rating_label(),
                retrieved.review.content()
            )
        })
        .collect();
    format!("\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::ReviewDocument;

    fn retrieved(title: &str, body: &str, rating: Option<u8>, score: f32) -> RetrievedReview {
        RetrievedReview {
            review: ReviewDocument::new(title, body, rating, None),
            score,
        }
    }

    fn sample() -> Vec<RetrievedReview> {
        vec![
            retrieved("Great", "Delicious crust.", Some(5), 0.9),
            retrieved("Bad", "Burnt pizza.", None, 0.7),
        ]
    }

    #[test]
    fn renders_default_template() {
        let prompt = PromptComposer::default().compose(" How is the pizza? ", &sample());

        assert!(prompt.starts_with(
            "You are an expert in answering questions about a pizza restaurant."
        ));
        assert!(prompt.contains("Review 1 (Rating: 5): Great Delicious crust."));
        assert!(prompt.contains("Review 2 (Rating: N/A): Bad Burnt pizza."));
        assert!(prompt.contains("Here is the question: How is the pizza?\n"));
        assert!(!prompt.contains("{reviews}"));
    }

    #[test]
    fn composition_is_deterministic() {
        let composer = PromptComposer::default();
        let first = composer.compose("Is the service good?", &sample());
        let second = composer.compose("Is the service good?", &sample());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn empty_reviews_render_a_marker() {
        let prompt = PromptComposer::default().compose("Anything?", &[]);
        assert!(prompt.contains("Here are some relevant reviews: (no relevant reviews found)"));
    }

    #[test]
    fn placeholders_in_inputs_are_not_expanded() {
        let reviews = vec![retrieved("", "I typed {question} here", Some(4), 0.5)];
        let prompt = PromptComposer::default().compose("What about {reviews}?", &reviews);

        assert!(prompt.contains("Here is the question: What about {reviews}?"));
        assert!(prompt.contains("I typed {question} here"));
    }

    #[test]
    fn custom_template_and_literal_braces() {
        let composer = PromptComposer::new(
            Some("Q={question} {json} R={reviews} @ {restaurant}".to_string()),
            "a taqueria",
        );
        let prompt = composer.compose("tacos?", &[]);
        assert_eq!(
            prompt,
            "Q=tacos? {json} R=(no relevant reviews found) @ a taqueria"
        );
    }
}
