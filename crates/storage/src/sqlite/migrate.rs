use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            profession TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL,
            free_trial_end_date TEXT NOT NULL,
            subscription_status TEXT NOT NULL
                CHECK (subscription_status IN ('free', 'premium', 'expired')),
            subscription_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            plan TEXT NOT NULL CHECK (plan IN ('free', 'premium')),
            status TEXT NOT NULL
                CHECK (status IN ('active', 'inactive', 'cancelled', 'expired')),
            start_date TEXT NOT NULL,
            end_date TEXT,
            renewal_date TEXT,
            price REAL NOT NULL,
            currency TEXT NOT NULL,
            provider_payment_id TEXT,
            provider_transaction_id TEXT,
            features TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS interviews (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            profession TEXT NOT NULL,
            kind TEXT NOT NULL,
            level TEXT NOT NULL,
            language TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('in_progress', 'paused', 'completed')),
            duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
            current_question_index INTEGER NOT NULL CHECK (current_question_index >= 0),
            total_score INTEGER NOT NULL CHECK (total_score BETWEEN 0 AND 100),
            feedback TEXT NOT NULL DEFAULT '',
            statistics TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            interview_id TEXT NOT NULL,
            text TEXT NOT NULL,
            audio_url TEXT,
            position INTEGER NOT NULL CHECK (position >= 1),
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
            time_limit_secs INTEGER NOT NULL CHECK (time_limit_secs > 0),
            created_at TEXT NOT NULL,
            UNIQUE (interview_id, position),
            FOREIGN KEY (interview_id) REFERENCES interviews(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS responses (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL,
            interview_id TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            audio_url TEXT,
            duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            feedback TEXT NOT NULL DEFAULT '',
            confidence INTEGER NOT NULL CHECK (confidence BETWEEN 0 AND 100),
            analysis TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
            FOREIGN KEY (interview_id) REFERENCES interviews(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS evaluations (
            id TEXT PRIMARY KEY,
            interview_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            overall_score INTEGER NOT NULL CHECK (overall_score BETWEEN 0 AND 100),
            strengths TEXT NOT NULL,
            weaknesses TEXT NOT NULL,
            recommendations TEXT NOT NULL,
            detailed_feedback TEXT NOT NULL,
            is_paid INTEGER NOT NULL CHECK (is_paid IN (0, 1)),
            access_level TEXT NOT NULL CHECK (access_level IN ('basic', 'detailed')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (interview_id) REFERENCES interviews(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_interviews_user_created
            ON interviews (user_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_responses_interview_created
            ON responses (interview_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_responses_question
            ON responses (question_id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_evaluations_user_created
            ON evaluations (user_id, created_at);
    ",
];

/// Applies versioned schema migrations, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: users, subscriptions, interviews, questions, responses, evaluations.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
