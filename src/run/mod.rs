//! Evaluation orchestrator — drives one run over a batch of questions.
//!
//! Per question the flow is a small state machine:
//!
//! 1. answers pending — both answer fetches run concurrently and both must
//!    settle (success or failure) before anything else happens;
//! 2. answers ready — the question and both answers are persisted, then the
//!    four-task comparison matrix is built;
//! 3. tasks dispatched — the four judging pipelines run concurrently;
//! 4. completed — each surviving judgment becomes one comparison record and
//!    feeds the aggregates; a failed task is logged and skipped without
//!    touching the other three.
//!
//! Questions are processed strictly sequentially — the barrier is global —
//! which is what lets the aggregates accumulator be a plain `&mut`.

use anyhow::Result;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::RunAggregates;
use crate::gateway::{Gateway, Provider};
use crate::judgment::ChosenSide;
use crate::matrix::{self, Answer};
use crate::storage::Storage;

/// Preferred-model sentinel for judgments that name neither side.
pub const UNKNOWN_PREFERENCE: &str = "Unknown";

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Per-model slice of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model: String,
    /// Judging tasks by this model that produced a judgment.
    pub judged: u64,
    /// Judging tasks by this model that failed outright.
    pub failed: u64,
    /// Average of all scores this model's answers received, if any.
    pub average_score: Option<f64>,
}

/// What one run produced, reported once at the end.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub questions: usize,
    pub comparisons: u64,
    pub models: Vec<ModelSummary>,
}

// ─── Run loop ────────────────────────────────────────────────────────────────

/// Evaluate a batch of questions and return the run summary.
///
/// The aggregates accumulator is owned by the caller and passed down
/// explicitly; nothing in here keeps global state.
pub async fn run(
    gateway: &Gateway,
    storage: &Storage,
    questions: &[String],
    aggregates: &mut RunAggregates,
) -> Result<RunSummary> {
    // Counted locally so a reused database's past records never bleed into
    // this run's summary.
    let mut comparisons = 0;
    for (index, question) in questions.iter().enumerate() {
        info!(question = index + 1, total = questions.len(), "evaluating question");
        comparisons += evaluate_question(gateway, storage, question, aggregates).await?;
    }

    let models = [Provider::OpenAi, Provider::Anthropic]
        .into_iter()
        .map(|provider| ModelSummary {
            model: gateway.display_name(provider).to_string(),
            judged: aggregates.judged(provider),
            failed: aggregates.failed(provider),
            average_score: aggregates.average(provider),
        })
        .collect();

    Ok(RunSummary {
        questions: questions.len(),
        comparisons,
        models,
    })
}

/// Run the full state machine for a single question and return the number
/// of comparison records it produced.
///
/// Only storage errors propagate — a backend or parse failure is contained
/// at the task that produced it.
async fn evaluate_question(
    gateway: &Gateway,
    storage: &Storage,
    question: &str,
    aggregates: &mut RunAggregates,
) -> Result<u64> {
    // Answers pending: strict barrier — both fetches settle before judging.
    let (first_reply, second_reply) = tokio::join!(
        gateway.fetch_answer(Provider::OpenAi, question),
        gateway.fetch_answer(Provider::Anthropic, question),
    );
    let first = settle_answer(gateway, Provider::OpenAi, first_reply);
    let second = settle_answer(gateway, Provider::Anthropic, second_reply);

    // Answers ready: persist, then build the matrix.  Answers are persisted
    // even when every downstream comparison later fails.
    let question_id = storage.insert_question(question).await?;
    storage
        .insert_answer(question_id, gateway.display_name(first.provider), &first.text)
        .await?;
    storage
        .insert_answer(question_id, gateway.display_name(second.provider), &second.text)
        .await?;

    let tasks = matrix::build_tasks(question, &first, &second);

    // Tasks dispatched: the four pipelines are independent of each other.
    let results = join_all(
        tasks
            .iter()
            .map(|task| gateway.fetch_judgment(task.evaluator, &task.prompt)),
    )
    .await;

    // Completed: one comparison record per surviving judgment.
    let mut recorded = 0;
    for (task, result) in tasks.iter().zip(results) {
        let judgment = match result {
            Ok(judgment) => judgment,
            Err(cause) => {
                warn!(
                    question_id,
                    evaluator = gateway.display_name(task.evaluator),
                    prompt = prompt_excerpt(&task.prompt),
                    %cause,
                    "judging task failed, skipping"
                );
                aggregates.record_failed(task.evaluator);
                continue;
            }
        };

        // Preference resolves through this task's own slot mapping — never
        // a fixed global ordering.
        let preferred = preferred_model(
            judgment.side,
            gateway.display_name(task.bot_a),
            gateway.display_name(task.bot_b),
        );

        storage
            .insert_comparison(
                question_id,
                gateway.display_name(task.evaluator),
                preferred,
                gateway.display_name(task.bot_a),
                gateway.display_name(task.bot_b),
                judgment.score_a,
                judgment.score_b,
                &judgment.explanation,
            )
            .await?;

        // Scores are keyed by the model actually occupying each slot.
        aggregates.accumulate(task.bot_a, judgment.score_a);
        aggregates.accumulate(task.bot_b, judgment.score_b);
        aggregates.record_judged(task.evaluator);
        recorded += 1;
    }

    Ok(recorded)
}

/// Resolve a chosen side to a model name through the task's slot mapping.
/// `Unknown` yields the explicit sentinel — never either slot by default.
fn preferred_model<'a>(side: ChosenSide, bot_a: &'a str, bot_b: &'a str) -> &'a str {
    match side {
        ChosenSide::A => bot_a,
        ChosenSide::B => bot_b,
        ChosenSide::Unknown => UNKNOWN_PREFERENCE,
    }
}

/// Turn an answer-fetch result into an [`Answer`], substituting the visible
/// failure placeholder when the call failed.
fn settle_answer(
    gateway: &Gateway,
    provider: Provider,
    reply: Result<String, crate::gateway::BackendFailure>,
) -> Answer {
    match reply {
        Ok(text) => Answer { provider, text },
        Err(cause) => {
            let name = gateway.display_name(provider);
            warn!(model = name, %cause, "answer fetch failed, using placeholder");
            Answer {
                provider,
                text: matrix::failure_placeholder(name),
            }
        }
    }
}

fn prompt_excerpt(prompt: &str) -> String {
    const MAX: usize = 120;
    if prompt.len() <= MAX {
        prompt.to_string()
    } else {
        let cut = prompt
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &prompt[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_resolves_through_the_slot_mapping() {
        assert_eq!(preferred_model(ChosenSide::A, "ModelX", "ModelY"), "ModelX");
        assert_eq!(preferred_model(ChosenSide::B, "ModelX", "ModelY"), "ModelY");
    }

    #[test]
    fn unknown_side_resolves_to_the_sentinel() {
        assert_eq!(
            preferred_model(ChosenSide::Unknown, "ModelX", "ModelY"),
            UNKNOWN_PREFERENCE
        );
    }

    #[test]
    fn prompt_excerpt_truncates() {
        let long = "q".repeat(500);
        assert!(prompt_excerpt(&long).len() < long.len());
        assert_eq!(prompt_excerpt("short"), "short");
    }
}
