//! Retention rule storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::RuleStore;
use super::model::{RetentionRule, RuleDraft};
use crate::Result;

/// Repository for retention rule storage and retrieval.
///
/// Rules are ordered by insertion; a rule's 1-based position in that order
/// is its row number. Removing a rule shifts every later rule up by one,
/// the same way deleting a spreadsheet row would.
#[derive(Clone)]
pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS retention_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                notes TEXT NOT NULL DEFAULT '',
                label TEXT NOT NULL DEFAULT '',
                retention_days INTEGER NOT NULL DEFAULT 0,
                leave_starred INTEGER NOT NULL DEFAULT 0,
                leave_important INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a rule and return its assigned 1-based row number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add(&self, draft: &RuleDraft) -> Result<u32> {
        sqlx::query(
            r"
            INSERT INTO retention_rules
                (notes, label, retention_days, leave_starred, leave_important)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&draft.notes)
        .bind(&draft.label)
        .bind(i64::from(draft.retention_period_days))
        .bind(draft.leave_starred)
        .bind(draft.leave_important)
        .execute(&self.pool)
        .await?;

        // The new rule sorts last, so its row number is the new count.
        self.count().await
    }

    /// Get all rules in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<RetentionRule>> {
        let rows = sqlx::query(
            r"
            SELECT notes, label, retention_days, leave_starred, leave_important
            FROM retention_rules
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let rules = rows
            .iter()
            .enumerate()
            .map(|(i, row)| row_to_rule(row, ordinal(1, i)))
            .collect();
        Ok(rules)
    }

    /// Get the rule at the given 1-based row, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, row: u32) -> Result<Option<RetentionRule>> {
        if row == 0 {
            return Ok(None);
        }

        let found = sqlx::query(
            r"
            SELECT notes, label, retention_days, leave_starred, leave_important
            FROM retention_rules
            ORDER BY id ASC
            LIMIT 1 OFFSET ?
            ",
        )
        .bind(i64::from(row - 1))
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.as_ref().map(|r| row_to_rule(r, row)))
    }

    /// Replace the rule at the given 1-based row, keeping its position.
    ///
    /// Returns false if no rule exists at that row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(&self, row: u32, draft: &RuleDraft) -> Result<bool> {
        if row == 0 {
            return Ok(false);
        }

        let found = sqlx::query(
            r"
            SELECT id
            FROM retention_rules
            ORDER BY id ASC
            LIMIT 1 OFFSET ?
            ",
        )
        .bind(i64::from(row - 1))
        .fetch_optional(&self.pool)
        .await?;

        let Some(found) = found else {
            return Ok(false);
        };
        let id: i64 = found.get("id");

        sqlx::query(
            r"
            UPDATE retention_rules SET
                notes = ?, label = ?, retention_days = ?,
                leave_starred = ?, leave_important = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(&draft.notes)
        .bind(&draft.label)
        .bind(i64::from(draft.retention_period_days))
        .bind(draft.leave_starred)
        .bind(draft.leave_important)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Remove the rule at the given 1-based row.
    ///
    /// Returns false if no rule exists at that row. Later rules shift up
    /// by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove(&self, row: u32) -> Result<bool> {
        if row == 0 {
            return Ok(false);
        }

        let found = sqlx::query(
            r"
            SELECT id
            FROM retention_rules
            ORDER BY id ASC
            LIMIT 1 OFFSET ?
            ",
        )
        .bind(i64::from(row - 1))
        .fetch_optional(&self.pool)
        .await?;

        let Some(found) = found else {
            return Ok(false);
        };
        let id: i64 = found.get("id");

        sqlx::query("DELETE FROM retention_rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    async fn count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM retention_rules")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

impl RuleStore for RuleRepository {
    async fn row_count(&self) -> Result<u32> {
        self.count().await
    }

    async fn read_range(&self, start_row: u32, count: u32) -> Result<Vec<RetentionRule>> {
        if start_row == 0 || count == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r"
            SELECT notes, label, retention_days, leave_starred, leave_important
            FROM retention_rules
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(i64::from(count))
        .bind(i64::from(start_row - 1))
        .fetch_all(&self.pool)
        .await?;

        let rules = rows
            .iter()
            .enumerate()
            .map(|(i, row)| row_to_rule(row, ordinal(start_row, i)))
            .collect();
        Ok(rules)
    }
}

fn row_to_rule(row: &SqliteRow, ordinal: u32) -> RetentionRule {
    RetentionRule {
        row: ordinal,
        notes: row.get("notes"),
        label: row.get("label"),
        retention_period_days: row.get::<u32, _>("retention_days"),
        leave_starred: row.get("leave_starred"),
        leave_important: row.get("leave_important"),
    }
}

#[allow(clippy::cast_possible_truncation)] // batch offsets are far below u32::MAX
fn ordinal(start_row: u32, offset: usize) -> u32 {
    start_row.saturating_add(offset as u32)
}
