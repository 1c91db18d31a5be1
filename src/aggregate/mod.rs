//! Run aggregates — per-model score totals and task outcome counters.
//!
//! An explicit accumulator owned by the run loop and passed by `&mut`.
//! Questions are processed sequentially (see the orchestrator), so no
//! locking is needed; a concurrent-questions variant would have to guard
//! `accumulate` with per-model atomics.

use std::collections::HashMap;

use crate::gateway::Provider;

/// Running statistics for one evaluation run.
#[derive(Debug, Default)]
pub struct RunAggregates {
    /// Per-model (score sum, score count), keyed by the model that actually
    /// occupied a slot — never by the evaluator.
    scores: HashMap<Provider, (i64, u64)>,
    /// Judging tasks that produced a judgment, keyed by evaluator.
    judged: HashMap<Provider, u64>,
    /// Judging tasks that failed outright (backend or parse), keyed by evaluator.
    failed: HashMap<Provider, u64>,
}

impl RunAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one slot score into a model's running total.
    pub fn accumulate(&mut self, provider: Provider, score: i64) {
        let entry = self.scores.entry(provider).or_insert((0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    /// Average score for a model, or `None` if nothing was accumulated.
    /// A model that never received a score has no average — not a zero one.
    pub fn average(&self, provider: Provider) -> Option<f64> {
        let (sum, count) = self.scores.get(&provider).copied()?;
        if count == 0 {
            return None;
        }
        Some(sum as f64 / count as f64)
    }

    /// Record that an evaluator produced a judgment.
    pub fn record_judged(&mut self, evaluator: Provider) {
        *self.judged.entry(evaluator).or_insert(0) += 1;
    }

    /// Record that an evaluator's judging task failed outright.
    pub fn record_failed(&mut self, evaluator: Provider) {
        *self.failed.entry(evaluator).or_insert(0) += 1;
    }

    pub fn judged(&self, evaluator: Provider) -> u64 {
        self.judged.get(&evaluator).copied().unwrap_or(0)
    }

    pub fn failed(&self, evaluator: Provider) -> u64 {
        self.failed.get(&evaluator).copied().unwrap_or(0)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_80_and_60_is_70() {
        let mut aggregates = RunAggregates::new();
        aggregates.accumulate(Provider::OpenAi, 80);
        aggregates.accumulate(Provider::OpenAi, 60);
        assert_eq!(aggregates.average(Provider::OpenAi), Some(70.0));
    }

    #[test]
    fn zero_count_has_no_average() {
        let aggregates = RunAggregates::new();
        assert_eq!(aggregates.average(Provider::Anthropic), None);
    }

    #[test]
    fn models_accumulate_independently() {
        let mut aggregates = RunAggregates::new();
        aggregates.accumulate(Provider::OpenAi, 95);
        aggregates.accumulate(Provider::Anthropic, 40);
        aggregates.accumulate(Provider::OpenAi, 95);
        aggregates.accumulate(Provider::Anthropic, 40);
        assert_eq!(aggregates.average(Provider::OpenAi), Some(95.0));
        assert_eq!(aggregates.average(Provider::Anthropic), Some(40.0));
    }

    #[test]
    fn judged_and_failed_counters_start_at_zero() {
        let mut aggregates = RunAggregates::new();
        assert_eq!(aggregates.judged(Provider::OpenAi), 0);
        assert_eq!(aggregates.failed(Provider::OpenAi), 0);
        aggregates.record_judged(Provider::OpenAi);
        aggregates.record_failed(Provider::OpenAi);
        aggregates.record_failed(Provider::OpenAi);
        assert_eq!(aggregates.judged(Provider::OpenAi), 1);
        assert_eq!(aggregates.failed(Provider::OpenAi), 2);
    }
}
