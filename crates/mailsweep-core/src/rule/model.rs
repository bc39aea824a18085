//! Retention rule data models.

use chrono::{Days, NaiveDate};

/// One row of retention configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionRule {
    /// 1-based position in the rule store, stable for the duration of a pass.
    pub row: u32,
    /// Free-text description of the rule.
    pub notes: String,
    /// Mail label the rule applies to.
    pub label: String,
    /// Messages older than `today - retention_period_days` are eligible.
    pub retention_period_days: u32,
    /// If true, starred messages are excluded from deletion.
    pub leave_starred: bool,
    /// If true, important threads are excluded from deletion.
    pub leave_important: bool,
}

impl RetentionRule {
    /// Returns true if the rule is configured well enough to run.
    ///
    /// A rule with a blank label or blank notes is inactive: the engine
    /// skips it entirely without issuing a search and without raising an
    /// error.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.label.trim().is_empty() && !self.notes.trim().is_empty()
    }

    /// Computes the deletion cutoff date: messages dated strictly before
    /// this day are eligible.
    ///
    /// A zero period yields today (matching everything older than today);
    /// a period larger than the calendar saturates to the earliest
    /// representable date and matches nothing.
    #[must_use]
    pub fn cutoff_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.retention_period_days)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Fields of a rule not yet placed in the store.
///
/// The store assigns the row position on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    /// Free-text description of the rule.
    pub notes: String,
    /// Mail label the rule applies to.
    pub label: String,
    /// Retention period in days.
    pub retention_period_days: u32,
    /// If true, starred messages are excluded from deletion.
    pub leave_starred: bool,
    /// If true, important threads are excluded from deletion.
    pub leave_important: bool,
}

impl RuleDraft {
    /// Creates a new draft.
    #[must_use]
    pub fn new(
        notes: impl Into<String>,
        label: impl Into<String>,
        retention_period_days: u32,
        leave_starred: bool,
        leave_important: bool,
    ) -> Self {
        Self {
            notes: notes.into(),
            label: label.into(),
            retention_period_days,
            leave_starred,
            leave_important,
        }
    }
}
