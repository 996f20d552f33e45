//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to API consumers.

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A cared-for individual
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recurring daily activity on a user's schedule
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledActivity {
    pub id: String,
    pub user_id: String,
    pub activity_name: String,
    /// 24-hour "HH:MM" time of day
    pub scheduled_time: String,
    /// Comma-separated weekday numbers, 1=Monday .. 7=Sunday
    pub days_of_week: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduledActivity {
    /// Parse the stored time-of-day.
    pub fn time_of_day(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.scheduled_time, "%H:%M").map_err(|e| {
            AppError::InvalidSchedule {
                name: self.activity_name.clone(),
                reason: format!("bad time '{}': {}", self.scheduled_time, e),
            }
        })
    }

    /// Parse the weekday mask. Must be a non-empty subset of 1..=7.
    pub fn weekdays(&self) -> Result<Vec<u32>> {
        let mut days = Vec::new();
        for part in self.days_of_week.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let day: u32 = part.parse().map_err(|_| AppError::InvalidSchedule {
                name: self.activity_name.clone(),
                reason: format!("bad weekday '{}'", part),
            })?;
            if !(1..=7).contains(&day) {
                return Err(AppError::InvalidSchedule {
                    name: self.activity_name.clone(),
                    reason: format!("weekday {} out of range", day),
                });
            }
            days.push(day);
        }
        if days.is_empty() {
            return Err(AppError::InvalidSchedule {
                name: self.activity_name.clone(),
                reason: "empty weekday set".to_string(),
            });
        }
        Ok(days)
    }

    /// Whether the activity is scheduled on the given weekday.
    pub fn scheduled_on(&self, weekday: Weekday) -> Result<bool> {
        Ok(self.weekdays()?.contains(&weekday.number_from_monday()))
    }
}

/// A record that an activity was done on some day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityCompletion {
    pub id: String,
    pub activity_id: String,
    pub completed_at: DateTime<Utc>,
    /// Self-reported through the app, as opposed to recorded externally
    pub completed_by_user: bool,
}

/// Audit record of a miss the engine notified about.
/// Activity name and time are snapshots, not foreign keys, so history
/// survives later edits to the activity definition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MissedActivity {
    pub id: String,
    pub user_id: String,
    pub activity_name: String,
    pub scheduled_time: String,
    pub importance: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

/// A family member registered on a user's care team
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyContact {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub relation: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub receive_notifications: bool,
    pub created_at: DateTime<Utc>,
}

/// Create activity request
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub user_id: String,
    pub activity_name: String,
    pub scheduled_time: String,
    pub days_of_week: String,
}

/// New missed-activity record, written once on first notification
#[derive(Debug, Clone)]
pub struct NewMissedActivity {
    pub user_id: String,
    pub activity_name: String,
    pub scheduled_time: String,
    pub importance: String,
    pub notified: bool,
}
