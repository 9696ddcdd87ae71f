//! Drives one generation run: chunk, invoke, recover, validate, accumulate.
//!
//! Chunks are processed strictly one after another. A rate-limited call is
//! retried exactly once after the configured backoff; any other failure, or a
//! failed retry, leaves that chunk with zero records and the run continues.
//! A fixed pause separates consecutive chunk calls whatever their outcome.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    models::domain::QuizQuestion,
    services::{
        chunker::Chunker,
        model_service::{ModelError, ModelService, TopicParams},
        record_validator::{revalidate_questions, validate_records, ValidationReport},
        response_parser::{parse_records, ParseTier},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    pub inter_request_delay: Duration,
    pub rate_limit_backoff: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            inter_request_delay: Duration::from_secs(4),
            rate_limit_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    Pending,
    Invoking,
    RateLimited,
    Waiting,
    Parsing,
    Validating,
    Done,
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChunkState::Pending => "pending",
            ChunkState::Invoking => "invoking",
            ChunkState::RateLimited => "rate-limited",
            ChunkState::Waiting => "waiting",
            ChunkState::Parsing => "parsing",
            ChunkState::Validating => "validating",
            ChunkState::Done => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkOutcome {
    /// At least one record survived validation.
    Produced,
    /// The response parsed but nothing in it was a usable record.
    NoValidRecords,
    ModelFailed { error: String },
    Unparseable { error: String },
}

/// Diagnostics for one processed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub outcome: ChunkOutcome,
    pub tier: Option<ParseTier>,
    pub kept: usize,
    pub dropped: usize,
    /// Kept questions whose correct answer is not one of their options.
    pub answer_not_in_options: usize,
    pub attempts: u8,
}

impl ChunkReport {
    fn failed(index: usize, outcome: ChunkOutcome, attempts: u8) -> Self {
        Self {
            index,
            outcome,
            tier: None,
            kept: 0,
            dropped: 0,
            answer_not_in_options: 0,
            attempts,
        }
    }

    /// Human-readable note for chunks that contributed nothing.
    pub fn warning(&self) -> Option<String> {
        let chunk = self.index + 1;
        match &self.outcome {
            ChunkOutcome::Produced => None,
            ChunkOutcome::NoValidRecords => Some(format!(
                "Chunk {}: response contained no usable questions ({} dropped)",
                chunk, self.dropped
            )),
            ChunkOutcome::ModelFailed { error } => {
                Some(format!("Chunk {}: model call failed: {}", chunk, error))
            }
            ChunkOutcome::Unparseable { error } => {
                Some(format!("Chunk {}: response could not be parsed: {}", chunk, error))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkProgress {
    pub completed: usize,
    pub total: usize,
}

/// Receives progress after every chunk, successful or not.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn chunk_finished(&self, progress: ChunkProgress, report: &ChunkReport);
}

pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn chunk_finished(&self, _progress: ChunkProgress, _report: &ChunkReport) {}
}

/// The outcome of a run: validated questions grouped by chunk, in chunk order.
#[derive(Debug, Clone, Default)]
pub struct GenerationRun {
    pub batches: Vec<Vec<QuizQuestion>>,
    pub chunks: Vec<ChunkReport>,
    pub report: ValidationReport,
}

impl GenerationRun {
    pub fn question_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.question_count() == 0
    }

    pub fn warnings(&self) -> Vec<String> {
        self.chunks.iter().filter_map(ChunkReport::warning).collect()
    }
}

pub struct ChunkOrchestrator {
    model: Arc<ModelService>,
    settings: OrchestratorSettings,
}

impl ChunkOrchestrator {
    pub fn new(model: Arc<ModelService>, settings: OrchestratorSettings) -> Self {
        Self { model, settings }
    }

    pub fn chunker(&self) -> Chunker {
        Chunker::new(self.settings.chunk_size)
    }

    pub async fn run_document(&self, text: &str, progress: &dyn ProgressSink) -> GenerationRun {
        let chunker = self.chunker();
        let total = chunker.count(text);
        log::info!(
            "Starting generation run over {} chunk(s) of up to {} characters",
            total,
            chunker.size()
        );

        let mut batches = Vec::with_capacity(total);
        let mut reports = Vec::with_capacity(total);

        for (index, chunk) in chunker.chunks(text).enumerate() {
            log_state(index, total, ChunkState::Pending);
            let (questions, report) = self
                .run_step(index, total, || self.model.generate_for_chunk(chunk))
                .await;

            if let Some(warning) = report.warning() {
                log::warn!("{}", warning);
            }

            progress
                .chunk_finished(
                    ChunkProgress {
                        completed: index + 1,
                        total,
                    },
                    &report,
                )
                .await;

            batches.push(questions);
            reports.push(report);

            if index + 1 < total {
                pause(self.settings.inter_request_delay).await;
            }
        }

        let run = finish(batches, reports);
        log::info!(
            "Generation run finished: {} question(s) from {} chunk(s), {} record(s) dropped",
            run.question_count(),
            total,
            run.chunks.iter().map(|c| c.dropped).sum::<usize>()
        );
        log_terminal_report(&run.report);
        run
    }

    /// A topic request is a single step with the same retry and recovery rules.
    pub async fn run_topic(&self, params: &TopicParams) -> GenerationRun {
        let (questions, report) = self
            .run_step(0, 1, || self.model.generate_for_topic(params))
            .await;

        if let Some(warning) = report.warning() {
            log::warn!("{}", warning);
        }

        let run = finish(vec![questions], vec![report]);
        log_terminal_report(&run.report);
        run
    }

    async fn run_step<F, Fut>(
        &self,
        index: usize,
        total: usize,
        invoke: F,
    ) -> (Vec<QuizQuestion>, ChunkReport)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String, ModelError>>,
    {
        let (result, attempts) = self.invoke_with_retry(index, total, invoke).await;

        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                log_state(index, total, ChunkState::Done);
                let outcome = ChunkOutcome::ModelFailed {
                    error: err.to_string(),
                };
                return (Vec::new(), ChunkReport::failed(index, outcome, attempts));
            }
        };

        log_state(index, total, ChunkState::Parsing);
        let recovered = match parse_records(&raw) {
            Ok(recovered) => recovered,
            Err(err) => {
                log_state(index, total, ChunkState::Done);
                let outcome = ChunkOutcome::Unparseable {
                    error: err.to_string(),
                };
                return (Vec::new(), ChunkReport::failed(index, outcome, attempts));
            }
        };
        if recovered.tier != ParseTier::Direct {
            log::debug!("Chunk {} recovered via {:?} parse", index + 1, recovered.tier);
        }

        log_state(index, total, ChunkState::Validating);
        let (questions, validation) = validate_records(recovered.records);
        log_state(index, total, ChunkState::Done);
        if validation.answer_not_in_options > 0 {
            log::warn!(
                "Chunk {}/{}: {} question(s) have a correct answer that is not among their options",
                index + 1,
                total,
                validation.answer_not_in_options
            );
        }

        let outcome = if questions.is_empty() {
            ChunkOutcome::NoValidRecords
        } else {
            ChunkOutcome::Produced
        };

        let report = ChunkReport {
            index,
            outcome,
            tier: Some(recovered.tier),
            kept: validation.kept,
            dropped: validation.dropped,
            answer_not_in_options: validation.answer_not_in_options,
            attempts,
        };
        (questions, report)
    }

    async fn invoke_with_retry<F, Fut>(
        &self,
        index: usize,
        total: usize,
        invoke: F,
    ) -> (Result<String, ModelError>, u8)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String, ModelError>>,
    {
        log_state(index, total, ChunkState::Invoking);
        match invoke().await {
            Err(err) if err.is_rate_limit() => {
                log_state(index, total, ChunkState::RateLimited);
                log::warn!(
                    "Chunk {}/{} rate limited ({}); retrying once after {:?}",
                    index + 1,
                    total,
                    err,
                    self.settings.rate_limit_backoff
                );

                log_state(index, total, ChunkState::Waiting);
                pause(self.settings.rate_limit_backoff).await;

                log_state(index, total, ChunkState::Invoking);
                (invoke().await, 2)
            }
            result => (result, 1),
        }
    }
}

// Validation is per record, so re-validating each batch in order is the same
// as re-validating the concatenation.
fn finish(batches: Vec<Vec<QuizQuestion>>, chunks: Vec<ChunkReport>) -> GenerationRun {
    let mut report = ValidationReport::default();
    let batches = batches
        .into_iter()
        .map(|batch| {
            let (kept, batch_report) = revalidate_questions(batch);
            report.merge(batch_report);
            kept
        })
        .collect();

    GenerationRun {
        batches,
        chunks,
        report,
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn log_terminal_report(report: &ValidationReport) {
    log::debug!(
        "Final validation kept {} and dropped {} question(s)",
        report.kept,
        report.dropped
    );
    if report.answer_not_in_options > 0 {
        log::warn!(
            "{} question(s) in the assembled run can never be answered correctly",
            report.answer_not_in_options
        );
    }
}

fn log_state(index: usize, total: usize, state: ChunkState) {
    log::debug!("Chunk {}/{}: {}", index + 1, total, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::Difficulty,
        test_utils::fixtures::{question_array_json, RecordingProgress, ScriptedModel},
    };

    fn settings(chunk_size: usize) -> OrchestratorSettings {
        OrchestratorSettings {
            chunk_size,
            inter_request_delay: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
        }
    }

    fn orchestrator(model: Arc<ScriptedModel>, chunk_size: usize) -> ChunkOrchestrator {
        let service = Arc::new(ModelService::new(model, "English"));
        ChunkOrchestrator::new(service, settings(chunk_size))
    }

    fn three_chunk_text() -> String {
        format!("{}\n{}\n{}\n", "a".repeat(9), "b".repeat(9), "c".repeat(9))
    }

    #[tokio::test]
    async fn chunks_accumulate_in_order() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(question_array_json(&["A1", "A2"])),
            Ok(question_array_json(&["B1"])),
            Ok(question_array_json(&["C1"])),
        ]));
        let progress = RecordingProgress::default();

        let run = orchestrator(model.clone(), 10)
            .run_document(&three_chunk_text(), &progress)
            .await;

        let titles: Vec<&str> = run
            .batches
            .iter()
            .flatten()
            .map(|q| q.question.as_str())
            .collect();
        assert_eq!(titles, vec!["A1", "A2", "B1", "C1"]);
        assert_eq!(model.call_count(), 3);
        assert_eq!(
            progress.snapshots().await,
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }

    #[tokio::test]
    async fn rate_limited_chunk_is_retried_exactly_once() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::RateLimited("quota".into())),
            Ok(question_array_json(&["A1"])),
        ]));

        let run = orchestrator(model.clone(), 100)
            .run_document("short text", &NoProgress)
            .await;

        assert_eq!(model.call_count(), 2);
        assert_eq!(run.question_count(), 1);
        assert_eq!(run.chunks[0].attempts, 2);
    }

    #[tokio::test]
    async fn failed_retry_yields_no_records_and_run_continues() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::RateLimited("quota".into())),
            Err(ModelError::RateLimited("still quota".into())),
            Ok(question_array_json(&["B1"])),
            Ok(question_array_json(&["C1"])),
        ]));

        let run = orchestrator(model.clone(), 10)
            .run_document(&three_chunk_text(), &NoProgress)
            .await;

        assert_eq!(model.call_count(), 4);
        assert!(run.batches[0].is_empty());
        assert_eq!(run.question_count(), 2);
        assert!(matches!(
            run.chunks[0].outcome,
            ChunkOutcome::ModelFailed { .. }
        ));
        assert_eq!(run.warnings().len(), 1);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_is_not_retried() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::Timeout),
            Ok(question_array_json(&["B1"])),
            Ok(question_array_json(&["C1"])),
        ]));

        let run = orchestrator(model.clone(), 10)
            .run_document(&three_chunk_text(), &NoProgress)
            .await;

        assert_eq!(model.call_count(), 3);
        assert_eq!(run.chunks[0].attempts, 1);
        assert_eq!(run.question_count(), 2);
    }

    #[tokio::test]
    async fn unparseable_and_truncated_responses_are_handled_per_chunk() {
        let truncated = r#"[{"question": "B1", "options": ["a", "b"], "correct_answer": "a"}, {"question": "B2", "opt"#;
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("I cannot help with that.".to_string()),
            Ok(truncated.to_string()),
            Ok(format!("Here you go:\n```json\n{}\n```", question_array_json(&["C1"]))),
        ]));

        let run = orchestrator(model, 10)
            .run_document(&three_chunk_text(), &NoProgress)
            .await;

        assert!(matches!(
            run.chunks[0].outcome,
            ChunkOutcome::Unparseable { .. }
        ));
        assert_eq!(run.chunks[1].tier, Some(ParseTier::Repaired));
        assert_eq!(run.chunks[2].tier, Some(ParseTier::Sliced));
        assert_eq!(run.question_count(), 2);
    }

    #[tokio::test]
    async fn empty_text_makes_no_calls() {
        let model = Arc::new(ScriptedModel::new(vec![]));

        let run = orchestrator(model.clone(), 10)
            .run_document("", &NoProgress)
            .await;

        assert_eq!(model.call_count(), 0);
        assert!(run.is_empty());
    }

    #[tokio::test]
    async fn topic_run_uses_single_call() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(question_array_json(&[
            "T1", "T2", "T3",
        ]))]));
        let params = TopicParams {
            topic: "Photosynthesis".to_string(),
            question_count: 3,
            difficulty: Difficulty::Easy,
        };

        let run = orchestrator(model.clone(), 10).run_topic(&params).await;

        assert_eq!(run.question_count(), 3);
        assert_eq!(model.call_count(), 1);
        assert!(model.prompts().await[0].contains("Photosynthesis"));
    }

    #[tokio::test]
    async fn answer_outside_options_is_counted_per_chunk_and_per_run() {
        let response = serde_json::json!([
            {"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},
            {"question": "Q2", "options": ["c", "d"], "correct_answer": "e"}
        ])
        .to_string();
        let model = Arc::new(ScriptedModel::new(vec![Ok(response)]));

        let run = orchestrator(model, 100)
            .run_document("short text", &NoProgress)
            .await;

        assert_eq!(run.question_count(), 2);
        assert_eq!(run.chunks[0].kept, 2);
        assert_eq!(run.chunks[0].answer_not_in_options, 1);
        assert_eq!(run.report.answer_not_in_options, 1);
        assert_eq!(
            crate::models::dto::response::ChunkDiagnostic::from(&run.chunks[0]).answer_not_in_options,
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_chunks_and_backs_off_before_retry() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::RateLimited("quota".into())),
            Ok(question_array_json(&["A1"])),
            Ok(question_array_json(&["B1"])),
            Ok(question_array_json(&["C1"])),
        ]));
        let settings = OrchestratorSettings {
            chunk_size: 10,
            inter_request_delay: Duration::from_secs(4),
            rate_limit_backoff: Duration::from_secs(30),
        };
        let orchestrator =
            ChunkOrchestrator::new(Arc::new(ModelService::new(model.clone(), "English")), settings);

        let start = tokio::time::Instant::now();
        let run = orchestrator
            .run_document(&three_chunk_text(), &NoProgress)
            .await;

        assert_eq!(model.call_count(), 4);
        assert_eq!(run.question_count(), 3);
        assert_eq!(
            start.elapsed(),
            settings.inter_request_delay * 2 + settings.rate_limit_backoff
        );
    }

    #[tokio::test(start_paused = true)]
    async fn single_chunk_run_does_not_pause() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(question_array_json(&["A1"]))]));
        let settings = OrchestratorSettings {
            chunk_size: 100,
            inter_request_delay: Duration::from_secs(4),
            rate_limit_backoff: Duration::from_secs(30),
        };
        let orchestrator =
            ChunkOrchestrator::new(Arc::new(ModelService::new(model, "English")), settings);

        let start = tokio::time::Instant::now();
        orchestrator.run_document("short text", &NoProgress).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn warnings_only_for_unproductive_chunks() {
        let produced = ChunkReport {
            index: 0,
            outcome: ChunkOutcome::Produced,
            tier: Some(ParseTier::Direct),
            kept: 2,
            dropped: 0,
            answer_not_in_options: 0,
            attempts: 1,
        };
        let empty = ChunkReport {
            index: 1,
            outcome: ChunkOutcome::NoValidRecords,
            tier: Some(ParseTier::Direct),
            kept: 0,
            dropped: 3,
            answer_not_in_options: 0,
            attempts: 1,
        };

        assert_eq!(produced.warning(), None);
        assert_eq!(
            empty.warning().as_deref(),
            Some("Chunk 2: response contained no usable questions (3 dropped)")
        );
    }
}
