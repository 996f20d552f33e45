//! Activities service
//!
//! Schedule and completion management around the repository: marking
//! activities done (find-or-create, at most one completion per calendar
//! day), seeding the default schedule for new users, soft deactivation
//! and the missed-activity history feed.

use crate::config;
use crate::database::models::{
    ActivityCompletion, CreateActivityRequest, MissedActivity, ScheduledActivity,
};
use crate::database::Repository;
use crate::error::{AppError, Result};
use chrono::Utc;

/// Outcome of a mark-completed request
#[derive(Debug)]
pub enum CompletionOutcome {
    Completed(ActivityCompletion),
    /// A completion for today already exists; nothing was written
    AlreadyCompleted,
}

#[derive(Clone)]
pub struct ActivitiesService {
    repo: Repository,
}

impl ActivitiesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Mark the named activity completed for today.
    ///
    /// Unknown activity names are created on the fly with the default
    /// schedule (or `time_hint` when given), so self-reported
    /// completions never bounce. At most one completion counts per
    /// activity per calendar day.
    pub async fn mark_completed(
        &self,
        user_id: &str,
        activity_name: &str,
        time_hint: Option<&str>,
    ) -> Result<CompletionOutcome> {
        let user = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let activity = match self.repo.find_activity_by_name(&user.id, activity_name).await? {
            Some(activity) => activity,
            None => {
                tracing::info!(
                    "Creating activity '{}' for user {} on first completion",
                    activity_name,
                    user.name
                );
                self.repo
                    .create_activity(CreateActivityRequest {
                        user_id: user.id.clone(),
                        activity_name: activity_name.to_string(),
                        scheduled_time: time_hint
                            .unwrap_or(config::DEFAULT_SCHEDULED_TIME)
                            .to_string(),
                        days_of_week: config::EVERY_DAY.to_string(),
                    })
                    .await?
            }
        };

        let today = Utc::now().date_naive();
        if self
            .repo
            .find_completion_on(&activity.id, today)
            .await?
            .is_some()
        {
            tracing::debug!("Activity already completed today: {}", activity_name);
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let completion = self.repo.create_completion(&activity.id, true).await?;
        tracing::info!("Activity completed: {} ({})", activity_name, completion.id);
        Ok(CompletionOutcome::Completed(completion))
    }

    /// Seed the default activity set for a user who has none yet.
    /// Returns the created activities; no-op when any already exist.
    pub async fn seed_defaults(&self, user_id: &str) -> Result<Vec<ScheduledActivity>> {
        if !self.repo.list_activities(user_id).await?.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!("Seeding default activities for user {}", user_id);

        let mut created = Vec::with_capacity(config::DEFAULT_ACTIVITIES.len());
        for (name, time) in config::DEFAULT_ACTIVITIES {
            let activity = self
                .repo
                .create_activity(CreateActivityRequest {
                    user_id: user_id.to_string(),
                    activity_name: name.to_string(),
                    scheduled_time: time.to_string(),
                    days_of_week: config::EVERY_DAY.to_string(),
                })
                .await?;
            created.push(activity);
        }

        Ok(created)
    }

    /// List all of a user's activities, active or not
    pub async fn list_activities(&self, user_id: &str) -> Result<Vec<ScheduledActivity>> {
        self.repo.list_activities(user_id).await
    }

    /// Soft-deactivate an activity; the engine stops evaluating it
    pub async fn deactivate(&self, activity_id: &str) -> Result<()> {
        self.repo.deactivate_activity(activity_id).await
    }

    /// Newest missed-activity records for the user-facing feed
    pub async fn missed_history(&self, user_id: &str) -> Result<Vec<MissedActivity>> {
        self.repo.list_missed_activities(user_id).await
    }
}
