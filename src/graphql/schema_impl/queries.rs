use async_graphql::{Context, Object, ID};

use crate::{
    app_state::AppState,
    errors::AppResult,
    graphql::helpers::parse_id,
    models::dto::response::{AttemptReplay, AttemptSummary, GenerationJobView, SessionResponse},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Submission history, oldest first.
    async fn attempts(&self, ctx: &Context<'_>) -> AppResult<Vec<AttemptSummary>> {
        let state = ctx.data::<AppState>()?;
        let attempts = state.quiz_attempt_service.list_attempts().await?;
        Ok(attempts.iter().map(AttemptSummary::from).collect())
    }

    async fn attempt(&self, ctx: &Context<'_>, id: ID) -> AppResult<AttemptReplay> {
        let state = ctx.data::<AppState>()?;
        let id = parse_id(&id)?;
        let replay = state.quiz_attempt_service.reopen_attempt(&id).await?;
        Ok(AttemptReplay::from(&replay))
    }

    async fn session(&self, ctx: &Context<'_>, id: ID) -> AppResult<SessionResponse> {
        let state = ctx.data::<AppState>()?;
        let id = parse_id(&id)?;
        let session = state.sessions.get(&id).await?;
        Ok(SessionResponse::from(&session))
    }

    async fn generation_job(&self, ctx: &Context<'_>, id: ID) -> AppResult<GenerationJobView> {
        let state = ctx.data::<AppState>()?;
        let id = parse_id(&id)?;
        let job = state.jobs.get(&id).await?;
        Ok(GenerationJobView::from(&job))
    }
}
