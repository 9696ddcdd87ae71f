use async_graphql::SimpleObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One multiple-choice question as produced by the model and kept in a quiz.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject, JsonSchema)]
pub struct QuizQuestion {
    /// The question text shown to the learner.
    pub question: String,
    /// Answer choices, in display order.
    pub options: Vec<String>,
    /// Must be copied verbatim from one of the options.
    pub correct_answer: String,
    /// Why the correct answer is right and the others are wrong.
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
            explanation: explanation.into(),
        }
    }

    /// Exact string comparison; an unanswered question is never correct.
    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer.is_some_and(|a| a == self.correct_answer)
    }

    pub fn has_option(&self, answer: &str) -> bool {
        self.options.iter().any(|o| o == answer)
    }

    pub fn correct_answer_in_options(&self) -> bool {
        self.has_option(&self.correct_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuizQuestion {
        QuizQuestion::new(
            "Which gas do plants absorb?",
            vec!["Oxygen".to_string(), "Carbon dioxide".to_string()],
            "Carbon dioxide",
            "Plants take in CO2 for photosynthesis.",
        )
    }

    #[test]
    fn is_correct_requires_exact_match() {
        let question = sample();

        assert!(question.is_correct(Some("Carbon dioxide")));
        assert!(!question.is_correct(Some("carbon dioxide")));
        assert!(!question.is_correct(Some("Carbon dioxide ")));
        assert!(!question.is_correct(None));
    }

    #[test]
    fn missing_explanation_deserializes_to_empty() {
        let json = r#"{"question":"Q","options":["a","b"],"correct_answer":"a"}"#;
        let parsed: QuizQuestion = serde_json::from_str(json).expect("question should parse");

        assert_eq!(parsed.explanation, "");
        assert!(parsed.correct_answer_in_options());
    }

    #[test]
    fn correct_answer_outside_options_is_detectable() {
        let mut question = sample();
        question.correct_answer = "Nitrogen".to_string();

        assert!(!question.correct_answer_in_options());
    }
}
