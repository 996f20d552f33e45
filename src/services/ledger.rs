//! Notification de-duplication ledger
//!
//! Process-lifetime memory of which alerts have already gone out.
//! Keys are (user, activity name, calendar date, tier); once a key is
//! recorded the matching alert is never re-sent. Entries are evicted
//! once their date falls out of the retention horizon, which keeps the
//! ledger bounded across long uptimes.

use crate::config;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Which escalation tier an alert belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscalationTier {
    User,
    Family,
}

/// De-duplication identity for one alert instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub user_id: String,
    pub activity_name: String,
    pub date: NaiveDate,
    pub tier: EscalationTier,
}

impl NotificationKey {
    pub fn user(user_id: &str, activity_name: &str, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            activity_name: activity_name.to_string(),
            date,
            tier: EscalationTier::User,
        }
    }

    pub fn family(user_id: &str, activity_name: &str, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            activity_name: activity_name.to_string(),
            date,
            tier: EscalationTier::Family,
        }
    }
}

/// In-memory set of already-sent notifications
#[derive(Debug, Default)]
pub struct NotificationLedger {
    entries: HashMap<NotificationKey, NaiveDate>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &NotificationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn record(&mut self, key: NotificationKey) {
        let date = key.date;
        self.entries.insert(key, date);
    }

    /// Drop entries older than the retention horizon relative to `today`.
    pub fn evict_stale(&mut self, today: NaiveDate) {
        let horizon = today - chrono::Duration::days(config::LEDGER_RETENTION_DAYS);
        let before = self.entries.len();
        self.entries.retain(|_, date| *date >= horizon);

        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} stale notification keys", evicted);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
