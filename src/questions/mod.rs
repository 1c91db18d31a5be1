//! Question file loader.
//!
//! The batch is a JSON array of `{"question": …}` objects — the shape the
//! usual dataset exports produce.  The run takes the first `count` entries;
//! selection beyond that is somebody else's job.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct QuestionEntry {
    question: String,
}

/// Load the first `count` questions from `path`.
pub async fn load_questions(path: &Path, count: usize) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read questions file: {}", path.display()))?;
    let entries: Vec<QuestionEntry> = serde_json::from_str(&content)
        .with_context(|| format!("parse questions file: {}", path.display()))?;

    let mut questions: Vec<String> = entries.into_iter().map(|e| e.question).collect();
    questions.truncate(count);
    debug!(file = %path.display(), count = questions.len(), "loaded questions");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_first_n_questions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(
            &path,
            r#"[{"question":"one"},{"question":"two"},{"question":"three"}]"#,
        )
        .unwrap();

        let questions = load_questions(&path, 2).await.unwrap();
        assert_eq!(questions, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn count_larger_than_file_takes_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, r#"[{"question":"only"}]"#).unwrap();

        let questions = load_questions(&path, 20).await.unwrap();
        assert_eq!(questions, vec!["only"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_questions(&dir.path().join("nope.json"), 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("read questions file"));
    }
}
