//! Collaborator contracts for the escalation engine
//!
//! The engine carries no ambient database session or transport handle;
//! both collaborators are passed in explicitly, so the engine can be
//! exercised against in-memory fakes.

use crate::database::models::{
    ActivityCompletion, FamilyContact, MissedActivity, NewMissedActivity, ScheduledActivity, User,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Query/update surface the engine needs from persistent storage.
#[async_trait]
pub trait CareStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn list_user_ids(&self) -> Result<Vec<String>>;

    async fn list_active_activities(&self, user_id: &str) -> Result<Vec<ScheduledActivity>>;

    /// Completion lookup is by calendar day, not exact timestamp.
    async fn find_completion_on(
        &self,
        activity_id: &str,
        day: NaiveDate,
    ) -> Result<Option<ActivityCompletion>>;

    /// Contacts who opted in to receiving notifications.
    async fn list_notified_contacts(&self, user_id: &str) -> Result<Vec<FamilyContact>>;

    async fn create_missed_activity(&self, rec: NewMissedActivity) -> Result<MissedActivity>;
}

/// Outbound message delivery.
///
/// Implementations must never panic or error past this boundary:
/// any transport failure is reported as `false`, and the engine treats
/// it as retryable on the next evaluation within the window.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str, html_body: Option<&str>) -> bool;
}
