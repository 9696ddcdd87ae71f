pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub use quiz::{Difficulty, Quiz, QuizSource};
pub use quiz_attempt::{AnswerMap, GradeSummary, PassFail, QuizAttempt};
pub use quiz_question::QuizQuestion;
