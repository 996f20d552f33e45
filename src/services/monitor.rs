//! Background monitoring loop
//!
//! Runs a full evaluation pass every five minutes while the service is
//! marked running, and exposes the two on-demand triggers: a check on
//! login and a manual re-check. Stopping is cooperative; the loop
//! observes the flag at each iteration boundary and exits within one
//! polling interval.

use crate::config;
use crate::error::Result;
use crate::services::escalation::EscalationEngine;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct MonitorService {
    engine: Arc<EscalationEngine>,
    running: Arc<AtomicBool>,
}

impl MonitorService {
    pub fn new(engine: Arc<EscalationEngine>) -> Self {
        Self {
            engine,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background loop. Idempotent: a second start while
    /// already running does nothing.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Monitor already running");
            return;
        }

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            tracing::info!(
                "Missed-activity monitoring started ({}s interval)",
                config::MONITOR_POLL_INTERVAL_SECS
            );

            while running.load(Ordering::SeqCst) {
                let sent = engine.evaluate_all(Utc::now()).await;
                tracing::debug!("Background pass complete, {} notifications sent", sent);

                tokio::time::sleep(std::time::Duration::from_secs(
                    config::MONITOR_POLL_INTERVAL_SECS,
                ))
                .await;
            }

            tracing::info!("Missed-activity monitoring stopped");
        });
    }

    /// Request the loop to stop. Takes effect at the next iteration
    /// boundary, within one polling interval.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Login trigger: immediate forced check for one user.
    pub async fn check_on_login(&self, user_id: &str) -> Result<usize> {
        tracing::info!("Login check for user {}", user_id);
        self.engine.evaluate_user(user_id, Utc::now(), true).await
    }

    /// Manual UI-triggered re-check for one user.
    pub async fn check_now(&self, user_id: &str) -> Result<usize> {
        tracing::info!("Manual check for user {}", user_id);
        self.engine.evaluate_user(user_id, Utc::now(), true).await
    }
}
