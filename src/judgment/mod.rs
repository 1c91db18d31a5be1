//! Judgment parser — recovers a structured verdict from a raw model reply.
//!
//! Both backends are instructed to reply in JSON, but in practice they wrap
//! the object in prose, emit literal newlines inside string values, or leave
//! backslashes unescaped.  The parser tolerates all three: it takes the span
//! from the first `{` to the last `}`, strips control newlines, doubles
//! backslashes, and only then decodes the four-field judgment schema.
//!
//! The parser is backend-agnostic — the same recovery path runs on every
//! judging reply regardless of which model produced it.

use serde::Deserialize;
use serde_json::Value;

// ─── Types ────────────────────────────────────────────────────────────────────

/// Which answer slot the evaluator chose, independent of which model
/// actually produced the answer in that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChosenSide {
    A,
    B,
    /// The reply named neither `A` nor `B`.  Not a parse failure — callers
    /// must resolve this to an explicit "Unknown" preference, never default
    /// to either slot.
    Unknown,
}

/// A successfully parsed verdict for one evaluation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    /// The evaluator's reasoning, verbatim.
    pub explanation: String,
    /// Score for the answer in slot A (0–100).
    pub score_a: i64,
    /// Score for the answer in slot B (0–100).
    pub score_b: i64,
    /// First character of the reply's `better_answer` field.
    pub side: ChosenSide,
}

/// Why a raw reply could not be turned into a [`Judgment`].
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    /// The reply contains no `{ … }` span at all.
    #[error("no JSON object found in reply")]
    NoStructureFound,
    /// A bracketed span was found but it does not decode into the required
    /// four-field schema.  Carries the offending text for diagnostics.
    #[error("malformed judgment ({reason}): {raw:?}")]
    MalformedJudgment { reason: String, raw: String },
}

/// Wire shape of a judging reply.  All four fields are mandatory; the scores
/// arrive as numbers or numeric strings depending on the backend's mood.
#[derive(Deserialize)]
struct WireJudgment {
    explanation: String,
    score_a: Value,
    score_b: Value,
    better_answer: String,
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a raw judging reply into a [`Judgment`].
pub fn parse(raw: &str) -> Result<Judgment, ParseFailure> {
    let start = raw.find('{').ok_or(ParseFailure::NoStructureFound)?;
    let end = raw
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or(ParseFailure::NoStructureFound)?;
    let span = &raw[start..=end];

    // Models routinely emit literal newlines inside string values and leave
    // backslashes unescaped; normalize both before handing serde the text.
    let normalized = span
        .replace(['\n', '\r'], "")
        .replace('\\', "\\\\");

    let malformed = |reason: String| ParseFailure::MalformedJudgment {
        reason,
        raw: raw.to_string(),
    };

    let wire: WireJudgment =
        serde_json::from_str(&normalized).map_err(|e| malformed(e.to_string()))?;

    let score_a = coerce_score(&wire.score_a).map_err(|e| malformed(format!("score_a: {e}")))?;
    let score_b = coerce_score(&wire.score_b).map_err(|e| malformed(format!("score_b: {e}")))?;

    let side = match wire.better_answer.chars().next() {
        Some('A') => ChosenSide::A,
        Some('B') => ChosenSide::B,
        _ => ChosenSide::Unknown,
    };

    Ok(Judgment {
        explanation: wire.explanation,
        score_a,
        score_b,
        side,
    })
}

/// Coerce a score field to an integer.  Accepts JSON numbers and numeric
/// strings (`87`, `87.0`, `"87"`); anything else is an error.
fn coerce_score(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| format!("not an integer: {n}")),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .or_else(|_| trimmed.parse::<f64>().map(|f| f as i64))
                .map_err(|_| format!("not a numeric string: {s:?}"))
        }
        other => Err(format!("expected number or string, got {other}")),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_json_round_trips() {
        let raw = r#"{"explanation":"A is correct","score_a":95,"score_b":40,"better_answer":"A"}"#;
        let judgment = parse(raw).unwrap();
        assert_eq!(judgment.explanation, "A is correct");
        assert_eq!(judgment.score_a, 95);
        assert_eq!(judgment.score_b, 40);
        assert_eq!(judgment.side, ChosenSide::A);
    }

    #[test]
    fn json_wrapped_in_prose_is_recovered() {
        let raw = "Sure! Here is the result: {\"explanation\":\"x\",\"score_a\":80,\"score_b\":60,\"better_answer\":\"A\"} Thanks";
        let judgment = parse(raw).unwrap();
        assert_eq!(judgment.side, ChosenSide::A);
        assert_eq!(judgment.score_a, 80);
        assert_eq!(judgment.score_b, 60);
    }

    #[test]
    fn no_braces_is_no_structure_found() {
        assert!(matches!(
            parse("I prefer answer A, it is clearly better."),
            Err(ParseFailure::NoStructureFound)
        ));
        assert!(matches!(parse(""), Err(ParseFailure::NoStructureFound)));
    }

    #[test]
    fn closing_brace_before_opening_is_no_structure_found() {
        assert!(matches!(
            parse("} nothing here {"),
            Err(ParseFailure::NoStructureFound)
        ));
    }

    #[test]
    fn missing_fields_is_malformed() {
        let err = parse(r#"{"explanation":"x"}"#).unwrap_err();
        match err {
            ParseFailure::MalformedJudgment { raw, .. } => {
                assert!(raw.contains("explanation"));
            }
            other => panic!("expected MalformedJudgment, got {other:?}"),
        }
    }

    #[test]
    fn numeric_string_scores_are_coerced() {
        let raw = r#"{"explanation":"x","score_a":"85","score_b":"62.0","better_answer":"B"}"#;
        let judgment = parse(raw).unwrap();
        assert_eq!(judgment.score_a, 85);
        assert_eq!(judgment.score_b, 62);
        assert_eq!(judgment.side, ChosenSide::B);
    }

    #[test]
    fn literal_newlines_inside_strings_are_stripped() {
        let raw = "{\"explanation\":\"line one\nline two\",\"score_a\":70,\"score_b\":50,\"better_answer\":\"A\"}";
        let judgment = parse(raw).unwrap();
        assert_eq!(judgment.explanation, "line oneline two");
    }

    #[test]
    fn stray_backslashes_are_escaped() {
        // `\p` is not a valid JSON escape; the normalization doubles it so
        // the span decodes and the literal backslash survives.
        let raw = r#"{"explanation":"see C:\path","score_a":1,"score_b":2,"better_answer":"B"}"#;
        let judgment = parse(raw).unwrap();
        assert_eq!(judgment.explanation, r"see C:\path");
    }

    #[test]
    fn better_answer_not_a_or_b_is_unknown() {
        for better in ["C", "both", "", "a", "b"] {
            let raw = format!(
                r#"{{"explanation":"x","score_a":50,"score_b":50,"better_answer":"{better}"}}"#
            );
            let judgment = parse(&raw).unwrap();
            assert_eq!(judgment.side, ChosenSide::Unknown, "better_answer={better:?}");
        }
    }

    #[test]
    fn first_character_decides_the_side() {
        let raw = r#"{"explanation":"x","score_a":50,"score_b":50,"better_answer":"B is better"}"#;
        assert_eq!(parse(raw).unwrap().side, ChosenSide::B);
    }

    #[test]
    fn non_numeric_score_is_malformed() {
        let raw = r#"{"explanation":"x","score_a":"high","score_b":60,"better_answer":"A"}"#;
        assert!(matches!(
            parse(raw),
            Err(ParseFailure::MalformedJudgment { .. })
        ));
    }
}
