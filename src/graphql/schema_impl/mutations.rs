use async_graphql::{Context, Object, ID};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppResult,
    graphql::helpers::{parse_id, parse_index},
    models::dto::{
        request::{answers_from_inputs, AnswerInput, GenerateTopicQuizRequest},
        response::{SessionResponse, SubmissionResponse, TopicQuizResponse},
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn generate_quiz_from_topic(
        &self,
        ctx: &Context<'_>,
        input: GenerateTopicQuizRequest,
    ) -> AppResult<TopicQuizResponse> {
        let state = ctx.data::<AppState>()?;
        input.validate()?;

        let session = state
            .quiz_service
            .generate_from_topic(input.into_input()?)
            .await?;
        Ok(TopicQuizResponse::from(&session))
    }

    /// `answer: null` clears the selection.
    async fn record_answer(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        index: i32,
        answer: Option<String>,
    ) -> AppResult<SessionResponse> {
        let state = ctx.data::<AppState>()?;
        let session_id = parse_id(&session_id)?;

        let session = state
            .sessions
            .record_answer(&session_id, parse_index(index)?, answer)
            .await?;
        Ok(SessionResponse::from(&session))
    }

    async fn submit_quiz(
        &self,
        ctx: &Context<'_>,
        session_id: ID,
        answers: Option<Vec<AnswerInput>>,
    ) -> AppResult<SubmissionResponse> {
        let state = ctx.data::<AppState>()?;
        let session_id = parse_id(&session_id)?;
        let answers = answers.map(answers_from_inputs).transpose()?;

        let result = state
            .quiz_attempt_service
            .submit(&session_id, answers)
            .await?;
        Ok(SubmissionResponse::from(&result))
    }
}
