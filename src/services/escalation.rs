//! Missed-activity escalation engine
//!
//! Evaluates a user's schedule against a point in time and sends staged
//! alerts for unfulfilled activities: first to the user (1 to 20 minutes
//! after due time), then to opted-in family contacts (30 to 40 minutes
//! after). The gap between the windows and anything past 40 minutes is a
//! dead zone by design. Per user, activity, day and tier, at most one
//! alert is ever sent; the check-send-record sequence runs under a lock
//! so concurrent evaluations cannot double-send.

use crate::config;
use crate::database::models::{NewMissedActivity, ScheduledActivity, User};
use crate::error::{AppError, Result};
use crate::services::ledger::{NotificationKey, NotificationLedger};
use crate::services::mailer;
use crate::services::ports::{CareStore, NotificationChannel};
use chrono::{DateTime, Datelike, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct EscalationEngine {
    store: Arc<dyn CareStore>,
    channel: Arc<dyn NotificationChannel>,
    ledger: Mutex<NotificationLedger>,
}

impl EscalationEngine {
    pub fn new(store: Arc<dyn CareStore>, channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            store,
            channel,
            ledger: Mutex::new(NotificationLedger::new()),
        }
    }

    /// Evaluate every known user. Failures are contained per user;
    /// this never aborts the pass and never returns an error.
    pub async fn evaluate_all(&self, now: DateTime<Utc>) -> usize {
        self.ledger.lock().await.evict_stale(now.date_naive());

        let user_ids = match self.store.list_user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Failed to list users for evaluation: {}", e);
                return 0;
            }
        };

        let mut total = 0;
        for user_id in user_ids {
            match self.evaluate_user(&user_id, now, false).await {
                Ok(sent) => total += sent,
                Err(e) => {
                    tracing::warn!("Evaluation failed for user {}: {}", user_id, e);
                }
            }
        }

        if total > 0 {
            tracing::info!("Evaluation pass sent {} notifications", total);
        }
        total
    }

    /// Evaluate one user's schedule at `now`, returning the number of
    /// notifications sent. `force_notify` bypasses the user-window
    /// gating (login and manual re-check triggers); it never escalates
    /// to family.
    ///
    /// Errors only when the user lookup itself fails; per-activity
    /// failures are logged and skipped.
    pub async fn evaluate_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        force_notify: bool,
    ) -> Result<usize> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let activities = self.store.list_active_activities(user_id).await?;
        tracing::debug!(
            "Evaluating {} activities for user {} at {}",
            activities.len(),
            user.name,
            now
        );

        let mut sent = 0;
        for activity in &activities {
            match self
                .evaluate_activity(&user, activity, now, force_notify)
                .await
            {
                Ok(n) => sent += n,
                Err(e) => {
                    tracing::warn!(
                        "Skipping activity '{}' for user {}: {}",
                        activity.activity_name,
                        user_id,
                        e
                    );
                }
            }
        }

        Ok(sent)
    }

    async fn evaluate_activity(
        &self,
        user: &User,
        activity: &ScheduledActivity,
        now: DateTime<Utc>,
        force_notify: bool,
    ) -> Result<usize> {
        let today = now.date_naive();

        if !activity.scheduled_on(now.weekday())? {
            return Ok(0);
        }

        let time_of_day = activity.time_of_day()?;

        if self
            .store
            .find_completion_on(&activity.id, today)
            .await?
            .is_some()
        {
            tracing::debug!("Activity completed today: {}", activity.activity_name);
            return Ok(0);
        }

        let scheduled_at = today.and_time(time_of_day).and_utc();
        let elapsed = now - scheduled_at;
        if elapsed < Duration::zero() {
            // Not yet due today, even for forced checks
            return Ok(0);
        }

        let secs = elapsed.num_seconds();
        let in_user_window =
            (config::USER_WINDOW_START_SECS..=config::USER_WINDOW_END_SECS).contains(&secs);
        let in_family_window =
            (config::FAMILY_WINDOW_START_SECS..=config::FAMILY_WINDOW_END_SECS).contains(&secs);

        if force_notify || in_user_window {
            self.notify_user(user, activity, today).await
        } else if in_family_window {
            self.notify_family(user, activity, today).await
        } else {
            tracing::debug!(
                "Activity '{}' outside notification windows ({}s elapsed)",
                activity.activity_name,
                secs
            );
            Ok(0)
        }
    }

    async fn notify_user(
        &self,
        user: &User,
        activity: &ScheduledActivity,
        today: chrono::NaiveDate,
    ) -> Result<usize> {
        let key = NotificationKey::user(&user.id, &activity.activity_name, today);

        // Critical section: the key check, the send and the record must
        // not interleave with a concurrent evaluation of the same key.
        let mut ledger = self.ledger.lock().await;
        if ledger.contains(&key) {
            return Ok(0);
        }

        if user.email.is_empty() {
            tracing::warn!("User {} has no email address, cannot notify", user.name);
            return Ok(0);
        }

        let msg = mailer::user_alert(user, activity, config::MISSED_IMPORTANCE);
        if !self
            .channel
            .send(&user.email, &msg.subject, &msg.body, Some(&msg.html_body))
            .await
        {
            // No key recorded: eligible to retry on the next evaluation
            tracing::warn!(
                "User alert delivery failed for '{}', will retry within window",
                activity.activity_name
            );
            return Ok(0);
        }

        ledger.record(key);
        drop(ledger);

        tracing::info!(
            "User alert sent for '{}' to {}",
            activity.activity_name,
            user.email
        );

        // The alert already went out; a failed audit write is logged
        // but cannot be compensated.
        if let Err(e) = self
            .store
            .create_missed_activity(NewMissedActivity {
                user_id: user.id.clone(),
                activity_name: activity.activity_name.clone(),
                scheduled_time: activity.scheduled_time.clone(),
                importance: config::MISSED_IMPORTANCE.to_string(),
                notified: true,
            })
            .await
        {
            tracing::error!(
                "Failed to record missed activity '{}': {}",
                activity.activity_name,
                e
            );
        }

        Ok(1)
    }

    async fn notify_family(
        &self,
        user: &User,
        activity: &ScheduledActivity,
        today: chrono::NaiveDate,
    ) -> Result<usize> {
        let key = NotificationKey::family(&user.id, &activity.activity_name, today);

        let mut ledger = self.ledger.lock().await;
        if ledger.contains(&key) {
            return Ok(0);
        }

        let contacts = self.store.list_notified_contacts(&user.id).await?;

        let mut delivered = 0;
        for contact in &contacts {
            let email = match contact.email.as_deref() {
                Some(email) if !email.is_empty() => email,
                _ => {
                    tracing::debug!("Family contact {} has no email, skipping", contact.name);
                    continue;
                }
            };

            let msg = mailer::family_alert(user, contact, activity, config::MISSED_IMPORTANCE);
            if self
                .channel
                .send(email, &msg.subject, &msg.body, Some(&msg.html_body))
                .await
            {
                delivered += 1;
            } else {
                tracing::warn!("Family alert delivery failed for {}", contact.name);
            }
        }

        // One successful delivery is enough to consider the tier done
        if delivered > 0 {
            ledger.record(key);
            tracing::info!(
                "Family escalation for '{}': {} of {} contacts notified",
                activity.activity_name,
                delivered,
                contacts.len()
            );
        }

        Ok(delivered)
    }
}
