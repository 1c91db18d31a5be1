//! SQLite persistence for questions, answers, and comparison records.
//!
//! Append-only from the orchestrator's point of view: each record's insert
//! is independent, so a mid-run crash leaves a consistent prefix of the
//! batch rather than a corrupt one.  The per-model-pair score projection is
//! a read-time VIEW over `comparisons`, not a second materialized table.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

const DB_FILE: &str = "modelarena.db";

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub model: String,
    pub answer: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComparisonRow {
    pub id: i64,
    pub question_id: i64,
    /// Display name of the evaluator that produced this judgment.
    pub model_evaluating: String,
    /// Display name of the preferred model, or `"Unknown"`.
    pub preferred_answer: String,
    pub model_bot_a: String,
    pub model_bot_b: String,
    pub score_a: i64,
    pub score_b: i64,
    pub explanation: String,
    pub created_at: String,
}

/// One row of the `comparison_pair_scores` projection: slot scores mapped
/// onto fixed per-model columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PairScoreRow {
    pub id: i64,
    pub question_id: i64,
    pub model_evaluating: String,
    pub preferred_answer: String,
    pub score_model_one: i64,
    pub score_model_two: i64,
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (or create) the run database under `data_dir`.
    ///
    /// `model_one` / `model_two` are the two display names; they parametrize
    /// the pair-scores projection view, which is dropped and recreated on
    /// every open so a renamed model never leaves a stale projection behind.
    pub async fn new(data_dir: &Path, model_one: &str, model_two: &str) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join(DB_FILE);
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool, model_one, model_two).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool, model_one: &str, model_two: &str) -> Result<()> {
        let create_stmts = [
            "CREATE TABLE IF NOT EXISTS questions (
                 id INTEGER PRIMARY KEY,
                 question TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
            "CREATE TABLE IF NOT EXISTS answers (
                 id INTEGER PRIMARY KEY,
                 question_id INTEGER NOT NULL,
                 model TEXT NOT NULL,
                 answer TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 FOREIGN KEY(question_id) REFERENCES questions(id)
             )",
            "CREATE TABLE IF NOT EXISTS comparisons (
                 id INTEGER PRIMARY KEY,
                 question_id INTEGER NOT NULL,
                 model_evaluating TEXT NOT NULL,
                 preferred_answer TEXT NOT NULL,
                 model_bot_a TEXT NOT NULL,
                 model_bot_b TEXT NOT NULL,
                 score_a INTEGER NOT NULL,
                 score_b INTEGER NOT NULL,
                 explanation TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 FOREIGN KEY(question_id) REFERENCES questions(id)
             )",
        ];
        for stmt in create_stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("failed to create schema")?;
        }

        // Views cannot take bind parameters, so the display names are quoted
        // into the statement ('' doubling for embedded quotes).
        let quote = |name: &str| name.replace('\'', "''");
        sqlx::query("DROP VIEW IF EXISTS comparison_pair_scores")
            .execute(pool)
            .await?;
        sqlx::query(&format!(
            "CREATE VIEW comparison_pair_scores AS
             SELECT id, question_id, model_evaluating, preferred_answer,
                    model_bot_a, model_bot_b,
                    CASE WHEN model_bot_a = '{one}' THEN score_a ELSE score_b END AS score_model_one,
                    CASE WHEN model_bot_a = '{two}' THEN score_a ELSE score_b END AS score_model_two,
                    explanation, created_at
             FROM comparisons",
            one = quote(model_one),
            two = quote(model_two),
        ))
        .execute(pool)
        .await
        .context("failed to create pair-scores view")?;

        Ok(())
    }

    // ─── Questions & answers ────────────────────────────────────────────────

    /// Insert a question and return its assigned id.
    pub async fn insert_question(&self, question: &str) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("INSERT INTO questions (question, created_at) VALUES (?, ?)")
            .bind(question)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_answer(&self, question_id: i64, model: &str, answer: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO answers (question_id, model, answer, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(question_id)
        .bind(model)
        .bind(answer)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_answers(&self, question_id: i64) -> Result<Vec<AnswerRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM answers WHERE question_id = ? ORDER BY id ASC")
                .bind(question_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    // ─── Comparisons ────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_comparison(
        &self,
        question_id: i64,
        model_evaluating: &str,
        preferred_answer: &str,
        model_bot_a: &str,
        model_bot_b: &str,
        score_a: i64,
        score_b: i64,
        explanation: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO comparisons
             (question_id, model_evaluating, preferred_answer, model_bot_a, model_bot_b,
              score_a, score_b, explanation, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(question_id)
        .bind(model_evaluating)
        .bind(preferred_answer)
        .bind(model_bot_a)
        .bind(model_bot_b)
        .bind(score_a)
        .bind(score_b)
        .bind(explanation)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_comparisons(&self, question_id: i64) -> Result<Vec<ComparisonRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM comparisons WHERE question_id = ? ORDER BY id ASC")
                .bind(question_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Read the pair-scores projection for one question.
    pub async fn list_pair_scores(&self, question_id: i64) -> Result<Vec<PairScoreRow>> {
        Ok(sqlx::query_as(
            "SELECT id, question_id, model_evaluating, preferred_answer,
                    score_model_one, score_model_two
             FROM comparison_pair_scores WHERE question_id = ? ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
