//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities and implements
//! the engine's `CareStore` port over SQLite.

use super::models::*;
use crate::config;
use crate::error::{AppError, Result};
use crate::services::ports::CareStore;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create_user(&self, name: &str, email: &str, phone: Option<&str>) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, phone, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// List all user ids
    pub async fn list_user_ids(&self) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Create an activity on a user's schedule
    pub async fn create_activity(&self, req: CreateActivityRequest) -> Result<ScheduledActivity> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let activity = sqlx::query_as::<_, ScheduledActivity>(
            r#"
            INSERT INTO user_activities (id, user_id, activity_name, scheduled_time, days_of_week, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(&req.activity_name)
        .bind(&req.scheduled_time)
        .bind(&req.days_of_week)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created activity: {} for user: {}", id, req.user_id);
        Ok(activity)
    }

    /// List all activities for a user, active or not
    pub async fn list_activities(&self, user_id: &str) -> Result<Vec<ScheduledActivity>> {
        let activities = sqlx::query_as::<_, ScheduledActivity>(
            r#"
            SELECT * FROM user_activities
            WHERE user_id = ?
            ORDER BY scheduled_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    /// List active activities for a user
    pub async fn list_active_activities(&self, user_id: &str) -> Result<Vec<ScheduledActivity>> {
        let activities = sqlx::query_as::<_, ScheduledActivity>(
            r#"
            SELECT * FROM user_activities
            WHERE user_id = ? AND is_active = 1
            ORDER BY scheduled_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    /// Find an active activity by name
    pub async fn find_activity_by_name(
        &self,
        user_id: &str,
        activity_name: &str,
    ) -> Result<Option<ScheduledActivity>> {
        let activity = sqlx::query_as::<_, ScheduledActivity>(
            r#"
            SELECT * FROM user_activities
            WHERE user_id = ? AND activity_name = ? AND is_active = 1
            "#,
        )
        .bind(user_id)
        .bind(activity_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(activity)
    }

    /// Soft-deactivate an activity. Activities are never hard-deleted.
    pub async fn deactivate_activity(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("UPDATE user_activities SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ActivityNotFound(id.to_string()));
        }

        tracing::debug!("Deactivated activity: {}", id);
        Ok(())
    }

    /// Record a completion for an activity
    pub async fn create_completion(
        &self,
        activity_id: &str,
        completed_by_user: bool,
    ) -> Result<ActivityCompletion> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let completion = sqlx::query_as::<_, ActivityCompletion>(
            r#"
            INSERT INTO activity_completions (id, activity_id, completed_at, completed_by_user)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(activity_id)
        .bind(now)
        .bind(completed_by_user)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created completion: {} for activity: {}", id, activity_id);
        Ok(completion)
    }

    /// Find a completion for an activity on the given calendar day.
    /// The check is by date, not exact timestamp.
    pub async fn find_completion_on(
        &self,
        activity_id: &str,
        day: NaiveDate,
    ) -> Result<Option<ActivityCompletion>> {
        let completion = sqlx::query_as::<_, ActivityCompletion>(
            r#"
            SELECT * FROM activity_completions
            WHERE activity_id = ? AND date(completed_at) = ?
            "#,
        )
        .bind(activity_id)
        .bind(day.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(completion)
    }

    /// Add a family contact to a user's care team
    pub async fn create_family_contact(
        &self,
        user_id: &str,
        name: &str,
        relation: &str,
        email: Option<&str>,
        receive_notifications: bool,
    ) -> Result<FamilyContact> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let contact = sqlx::query_as::<_, FamilyContact>(
            r#"
            INSERT INTO family_contacts (id, user_id, name, relation, phone, email, receive_notifications, created_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(relation)
        .bind(email)
        .bind(receive_notifications)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created family contact: {} for user: {}", id, user_id);
        Ok(contact)
    }

    /// List family contacts who opted in to notifications
    pub async fn list_notified_contacts(&self, user_id: &str) -> Result<Vec<FamilyContact>> {
        let contacts = sqlx::query_as::<_, FamilyContact>(
            r#"
            SELECT * FROM family_contacts
            WHERE user_id = ? AND receive_notifications = 1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    /// Record a missed activity. Written once per notified miss,
    /// never mutated afterwards.
    pub async fn create_missed_activity(&self, rec: NewMissedActivity) -> Result<MissedActivity> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let missed = sqlx::query_as::<_, MissedActivity>(
            r#"
            INSERT INTO missed_activities (id, user_id, activity_name, scheduled_time, importance, notified, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&rec.user_id)
        .bind(&rec.activity_name)
        .bind(&rec.scheduled_time)
        .bind(&rec.importance)
        .bind(rec.notified)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Recorded missed activity: {} for user: {}", id, rec.user_id);
        Ok(missed)
    }

    /// List the newest missed-activity records for a user
    pub async fn list_missed_activities(&self, user_id: &str) -> Result<Vec<MissedActivity>> {
        let missed = sqlx::query_as::<_, MissedActivity>(
            r#"
            SELECT * FROM missed_activities
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(config::MISSED_HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(missed)
    }
}

#[async_trait]
impl CareStore for Repository {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Repository::get_user(self, user_id).await
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        Repository::list_user_ids(self).await
    }

    async fn list_active_activities(&self, user_id: &str) -> Result<Vec<ScheduledActivity>> {
        Repository::list_active_activities(self, user_id).await
    }

    async fn find_completion_on(
        &self,
        activity_id: &str,
        day: NaiveDate,
    ) -> Result<Option<ActivityCompletion>> {
        Repository::find_completion_on(self, activity_id, day).await
    }

    async fn list_notified_contacts(&self, user_id: &str) -> Result<Vec<FamilyContact>> {
        Repository::list_notified_contacts(self, user_id).await
    }

    async fn create_missed_activity(&self, rec: NewMissedActivity) -> Result<MissedActivity> {
        Repository::create_missed_activity(self, rec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = create_test_repo().await;

        let user = repo
            .create_user("Margaret", "margaret@example.com", None)
            .await
            .unwrap();
        assert_eq!(user.name, "Margaret");

        let fetched = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.email, "margaret@example.com");

        assert!(repo.get_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activities_crud() {
        let repo = create_test_repo().await;
        let user = repo
            .create_user("Margaret", "margaret@example.com", None)
            .await
            .unwrap();

        let activity = repo
            .create_activity(CreateActivityRequest {
                user_id: user.id.clone(),
                activity_name: "Morning Medication".to_string(),
                scheduled_time: "09:00".to_string(),
                days_of_week: "1,2,3,4,5,6,7".to_string(),
            })
            .await
            .unwrap();

        assert!(activity.is_active);

        let found = repo
            .find_activity_by_name(&user.id, "Morning Medication")
            .await
            .unwrap();
        assert!(found.is_some());

        repo.deactivate_activity(&activity.id).await.unwrap();

        // Deactivated activities drop out of the active listing but stay on record
        let active = repo.list_active_activities(&user.id).await.unwrap();
        assert!(active.is_empty());

        let all = repo.list_activities(&user.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[tokio::test]
    async fn test_completion_lookup_by_calendar_day() {
        let repo = create_test_repo().await;
        let user = repo
            .create_user("Margaret", "margaret@example.com", None)
            .await
            .unwrap();
        let activity = repo
            .create_activity(CreateActivityRequest {
                user_id: user.id.clone(),
                activity_name: "Afternoon Rest".to_string(),
                scheduled_time: "14:00".to_string(),
                days_of_week: "1,2,3,4,5,6,7".to_string(),
            })
            .await
            .unwrap();

        repo.create_completion(&activity.id, true).await.unwrap();

        let today = Utc::now().date_naive();
        let found = repo.find_completion_on(&activity.id, today).await.unwrap();
        assert!(found.is_some());
        assert!(found.unwrap().completed_by_user);

        let yesterday = today.pred_opt().unwrap();
        let none = repo
            .find_completion_on(&activity.id, yesterday)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_family_contacts_opt_in_filter() {
        let repo = create_test_repo().await;
        let user = repo
            .create_user("Margaret", "margaret@example.com", None)
            .await
            .unwrap();

        repo.create_family_contact(&user.id, "Anna", "daughter", Some("anna@example.com"), true)
            .await
            .unwrap();
        repo.create_family_contact(&user.id, "Ben", "son", Some("ben@example.com"), false)
            .await
            .unwrap();

        let notified = repo.list_notified_contacts(&user.id).await.unwrap();
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].name, "Anna");
    }

    #[tokio::test]
    async fn test_missed_activity_records() {
        let repo = create_test_repo().await;
        let user = repo
            .create_user("Margaret", "margaret@example.com", None)
            .await
            .unwrap();

        repo.create_missed_activity(NewMissedActivity {
            user_id: user.id.clone(),
            activity_name: "Evening Medication".to_string(),
            scheduled_time: "18:00".to_string(),
            importance: "high".to_string(),
            notified: true,
        })
        .await
        .unwrap();

        let missed = repo.list_missed_activities(&user.id).await.unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].activity_name, "Evening Medication");
        assert!(missed[0].notified);
    }
}
