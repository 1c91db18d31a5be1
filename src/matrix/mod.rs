//! Comparison matrix builder — the four judging tasks for one question.
//!
//! For a question with answers from both contenders, two prompts are built
//! from one template with the answer slots swapped, then each prompt is
//! paired with each evaluator.  The prompts never reveal which model
//! produced which slot's answer — the evaluation is blind.

use crate::gateway::Provider;

// ─── Prompts ─────────────────────────────────────────────────────────────────

/// System instruction sent with every judging call.  Demands the four-field
/// JSON schema the parser expects.
pub const JUDGE_SYSTEM_PROMPT: &str = "\
Please respond exclusively in JSON format, adhering to the following structure:
{
  \"explanation\": \"A detailed narrative explaining the reasoning behind the comparison, \
including a chain of thought process that leads to the final assessment.\",
  \"score_a\": \"A numerical score between 0 and 100 representing the quality of answer A.\",
  \"score_b\": \"A numerical score between 0 and 100 representing the quality of answer B.\",
  \"better_answer\": \"Indicates which answer is superior, 'A' or 'B'. The choice should be \
supported by the scores and the detailed explanation provided. Only reply A or B in better_answer.\"
}
All the fields are mandatory!";

/// Placeholder embedded in comparison prompts (and persisted) when a model's
/// answer fetch failed.  Visible to the evaluator on purpose — a missing
/// answer should score poorly, not abort the question.
pub fn failure_placeholder(model_name: &str) -> String {
    format!("[no answer: {model_name} call failed]")
}

// ─── Types ────────────────────────────────────────────────────────────────────

/// One model's answer to a question, ready for slotting into prompts.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Which contender produced (or failed to produce) this answer.
    pub provider: Provider,
    /// Answer text, or the failure placeholder when the call failed.
    pub text: String,
}

/// A unit of judging work: an evaluator, a slot-to-model mapping, and the
/// rendered prompt.  Ephemeral — consumed by the gateway, discarded once a
/// judgment (or failure) comes back.
#[derive(Debug, Clone)]
pub struct EvaluationTask {
    /// The model performing the judging call.
    pub evaluator: Provider,
    /// The model whose answer occupies slot A of the prompt.
    pub bot_a: Provider,
    /// The model whose answer occupies slot B of the prompt.
    pub bot_b: Provider,
    /// Full comparison prompt sent to the evaluator.
    pub prompt: String,
}

// ─── Building ────────────────────────────────────────────────────────────────

/// Build the four evaluation tasks for one question: both slot orderings
/// crossed with both evaluators.  The returned order is fixed (first
/// evaluator with both orderings, then the second) so run logs stay
/// deterministic; correctness does not depend on it.
pub fn build_tasks(question: &str, first: &Answer, second: &Answer) -> [EvaluationTask; 4] {
    let prompt_first_a = comparison_prompt(question, &first.text, &second.text);
    let prompt_second_a = comparison_prompt(question, &second.text, &first.text);

    [
        EvaluationTask {
            evaluator: first.provider,
            bot_a: first.provider,
            bot_b: second.provider,
            prompt: prompt_first_a.clone(),
        },
        EvaluationTask {
            evaluator: first.provider,
            bot_a: second.provider,
            bot_b: first.provider,
            prompt: prompt_second_a.clone(),
        },
        EvaluationTask {
            evaluator: second.provider,
            bot_a: first.provider,
            bot_b: second.provider,
            prompt: prompt_first_a,
        },
        EvaluationTask {
            evaluator: second.provider,
            bot_a: second.provider,
            bot_b: first.provider,
            prompt: prompt_second_a,
        },
    ]
}

fn comparison_prompt(question: &str, answer_a: &str, answer_b: &str) -> String {
    format!(
        "Question: {question}\n\nAnswer A: {answer_a}\n\nAnswer B: {answer_b}\n\n\
         Provide a detailed comparison including an explanation, scores for each answer, \
         and select the better answer."
    )
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn answer(provider: Provider, text: &str) -> Answer {
        Answer {
            provider,
            text: text.to_string(),
        }
    }

    #[test]
    fn exactly_four_tasks_covering_the_cross_product() {
        let first = answer(Provider::OpenAi, "4");
        let second = answer(Provider::Anthropic, "Four");
        let tasks = build_tasks("2+2=?", &first, &second);

        let triples: HashSet<(Provider, Provider, Provider)> = tasks
            .iter()
            .map(|t| (t.evaluator, t.bot_a, t.bot_b))
            .collect();
        assert_eq!(triples.len(), 4, "no duplicate (evaluator, bot_a, bot_b) triples");

        for evaluator in [Provider::OpenAi, Provider::Anthropic] {
            for (bot_a, bot_b) in [
                (Provider::OpenAi, Provider::Anthropic),
                (Provider::Anthropic, Provider::OpenAi),
            ] {
                assert!(
                    triples.contains(&(evaluator, bot_a, bot_b)),
                    "missing triple ({evaluator:?}, {bot_a:?}, {bot_b:?})"
                );
            }
        }
    }

    #[test]
    fn slot_ordering_matches_the_task_mapping() {
        let first = answer(Provider::OpenAi, "alpha-answer");
        let second = answer(Provider::Anthropic, "beta-answer");
        let tasks = build_tasks("q", &first, &second);

        for task in &tasks {
            let a_text = if task.bot_a == Provider::OpenAi { "alpha-answer" } else { "beta-answer" };
            let b_text = if task.bot_b == Provider::OpenAi { "alpha-answer" } else { "beta-answer" };
            assert!(task.prompt.contains(&format!("Answer A: {a_text}")));
            assert!(task.prompt.contains(&format!("Answer B: {b_text}")));
        }
    }

    #[test]
    fn prompts_do_not_reveal_model_identity() {
        let first = answer(Provider::OpenAi, "4");
        let second = answer(Provider::Anthropic, "Four");
        for task in build_tasks("2+2=?", &first, &second) {
            // Only the question and the slotted answers appear — no provider
            // or model names.
            assert!(!task.prompt.contains("OpenAi"));
            assert!(!task.prompt.contains("Anthropic"));
            assert!(task.prompt.contains("2+2=?"));
        }
    }

    #[test]
    fn failed_answer_is_embedded_as_placeholder() {
        let first = Answer {
            provider: Provider::OpenAi,
            text: failure_placeholder("GPT-4"),
        };
        let second = answer(Provider::Anthropic, "Four");
        let tasks = build_tasks("2+2=?", &first, &second);
        assert!(tasks[0].prompt.contains("[no answer: GPT-4 call failed]"));
    }

    #[test]
    fn judge_system_prompt_names_all_four_fields() {
        for field in ["explanation", "score_a", "score_b", "better_answer"] {
            assert!(JUDGE_SYSTEM_PROMPT.contains(field));
        }
    }
}
