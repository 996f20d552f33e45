//! Integration tests for the Memobridge engine
//!
//! These tests verify end-to-end functionality including:
//! - Database setup on a real file-backed pool
//! - The full escalation lifecycle across both alert tiers
//! - De-duplication across background and on-demand triggers

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use memobridge::database::{create_pool, CreateActivityRequest, Repository};
use memobridge::services::{
    ActivitiesService, CompletionOutcome, EscalationEngine, MonitorService, NotificationChannel,
};
use std::sync::Arc;
use std::sync::Mutex;
use tempfile::TempDir;

/// Channel fake recording every delivery
#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(to, _)| to.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, to: &str, subject: &str, _body: &str, _html: Option<&str>) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        true
    }
}

/// Helper to create a file-backed test database
async fn create_test_db() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let pool = create_pool(&db_path).await.unwrap();
    let repo = Repository::new(pool);

    (repo, temp_dir)
}

fn engine_with(repo: &Repository) -> (Arc<EscalationEngine>, Arc<RecordingChannel>) {
    let channel = Arc::new(RecordingChannel::default());
    let engine = Arc::new(EscalationEngine::new(
        Arc::new(repo.clone()),
        Arc::clone(&channel) as Arc<dyn NotificationChannel>,
    ));
    (engine, channel)
}

/// Today at 08:00 UTC, the anchor for elapsed-time offsets
fn due_time() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        .and_utc()
}

#[tokio::test]
async fn test_full_escalation_lifecycle() {
    let (repo, _temp) = create_test_db().await;
    let (engine, channel) = engine_with(&repo);

    let user = repo
        .create_user("Margaret", "margaret@example.com", None)
        .await
        .unwrap();
    repo.create_activity(CreateActivityRequest {
        user_id: user.id.clone(),
        activity_name: "Morning Medication".to_string(),
        scheduled_time: "08:00".to_string(),
        days_of_week: "1,2,3,4,5,6,7".to_string(),
    })
    .await
    .unwrap();
    repo.create_family_contact(&user.id, "Anna", "daughter", Some("anna@example.com"), true)
        .await
        .unwrap();

    // Before due: silent
    assert_eq!(engine.evaluate_all(due_time() - Duration::minutes(10)).await, 0);

    // 30 seconds after due: still below the user window
    assert_eq!(engine.evaluate_all(due_time() + Duration::seconds(30)).await, 0);

    // 10 minutes after due: user alert fires once
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(10)).await, 1);
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(15)).await, 0);

    // 25 minutes: dead zone between the tiers
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(25)).await, 0);

    // 35 minutes: family escalation fires once
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(35)).await, 1);
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(38)).await, 0);

    // 45 minutes: past every window
    assert_eq!(engine.evaluate_all(due_time() + Duration::minutes(45)).await, 0);

    assert_eq!(
        channel.recipients(),
        vec!["margaret@example.com", "anna@example.com"]
    );

    // Exactly one audit record, from the user tier
    let missed = repo.list_missed_activities(&user.id).await.unwrap();
    assert_eq!(missed.len(), 1);
    assert!(missed[0].notified);
}

#[tokio::test]
async fn test_completion_through_service_suppresses_escalation() {
    let (repo, _temp) = create_test_db().await;
    let (engine, channel) = engine_with(&repo);
    let activities = ActivitiesService::new(repo.clone());

    let user = repo
        .create_user("Margaret", "margaret@example.com", None)
        .await
        .unwrap();
    activities.seed_defaults(&user.id).await.unwrap();

    // Complete one of the seeded activities before its window opens
    let outcome = activities
        .mark_completed(&user.id, "Morning Medication", None)
        .await
        .unwrap();
    assert!(matches!(outcome, CompletionOutcome::Completed(_)));

    // Morning Medication is seeded at 09:00; evaluate inside its user
    // window. The completion suppresses it, and every other seeded
    // activity (11:00 onward) is not yet due, so the pass is silent.
    let nine = Utc::now()
        .date_naive()
        .and_hms_opt(9, 5, 0)
        .unwrap()
        .and_utc();
    let total = engine.evaluate_all(nine).await;

    assert_eq!(total, 0);
    assert!(channel.recipients().is_empty());
}

#[tokio::test]
async fn test_login_check_and_background_pass_share_dedup_state() {
    let (repo, _temp) = create_test_db().await;
    let (engine, channel) = engine_with(&repo);

    let user = repo
        .create_user("Margaret", "margaret@example.com", None)
        .await
        .unwrap();
    repo.create_activity(CreateActivityRequest {
        user_id: user.id.clone(),
        activity_name: "Midnight Stretch".to_string(),
        scheduled_time: "00:00".to_string(),
        days_of_week: "1,2,3,4,5,6,7".to_string(),
    })
    .await
    .unwrap();

    let monitor = MonitorService::new(Arc::clone(&engine));

    // Forced login check fires regardless of the window
    let sent = monitor.check_on_login(&user.id).await.unwrap();
    assert_eq!(sent, 1);

    // A background-style pass afterwards cannot double-send, even if
    // the activity happens to sit inside a window right now
    engine.evaluate_all(Utc::now()).await;
    assert_eq!(channel.recipients().len(), 1);
}

#[tokio::test]
async fn test_multiple_users_evaluated_independently() {
    let (repo, _temp) = create_test_db().await;
    let (engine, channel) = engine_with(&repo);

    for (name, email) in [
        ("Margaret", "margaret@example.com"),
        ("Arthur", "arthur@example.com"),
    ] {
        let user = repo.create_user(name, email, None).await.unwrap();
        repo.create_activity(CreateActivityRequest {
            user_id: user.id.clone(),
            activity_name: "Morning Medication".to_string(),
            scheduled_time: "08:00".to_string(),
            days_of_week: "1,2,3,4,5,6,7".to_string(),
        })
        .await
        .unwrap();
    }

    let total = engine.evaluate_all(due_time() + Duration::minutes(5)).await;
    assert_eq!(total, 2);

    let mut recipients = channel.recipients();
    recipients.sort();
    assert_eq!(recipients, vec!["arthur@example.com", "margaret@example.com"]);
}
