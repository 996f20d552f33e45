//! Email delivery channel
//!
//! Implements `NotificationChannel` over an HTTP mail API (JSON POST),
//! plus the subject/body composition for every alert the engine sends.
//! Delivery failures are logged and reported as `false`, never raised.

use crate::database::models::{FamilyContact, ScheduledActivity, User};
use crate::error::{AppError, Result};
use crate::services::ports::NotificationChannel;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Delivery channel configuration, read from the environment
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub endpoint: String,
    pub api_token: String,
    pub from_email: String,
    pub from_name: String,
}

impl MailerConfig {
    /// Load from MAILER_ENDPOINT, MAILER_TOKEN, FROM_EMAIL, FROM_NAME.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("MAILER_ENDPOINT")
            .map_err(|_| AppError::Mailer("MAILER_ENDPOINT not set".to_string()))?;
        let api_token = std::env::var("MAILER_TOKEN")
            .map_err(|_| AppError::Mailer("MAILER_TOKEN not set".to_string()))?;
        let from_email = std::env::var("FROM_EMAIL")
            .map_err(|_| AppError::Mailer("FROM_EMAIL not set".to_string()))?;
        let from_name =
            std::env::var("FROM_NAME").unwrap_or_else(|_| "Memobridge Care Team".to_string());

        Ok(Self {
            endpoint,
            api_token,
            from_email,
            from_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Mail-API backed delivery channel
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(MailerConfig::from_env()?)
    }
}

#[async_trait]
impl NotificationChannel for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str, html_body: Option<&str>) -> bool {
        let message = OutboundMessage {
            from: format!("{} <{}>", self.config.from_name, self.config.from_email),
            to,
            subject,
            text: body,
            html: html_body,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_token)
            .json(&message)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Email sent to: {}", to);
                true
            }
            Ok(resp) => {
                tracing::error!("Mail API rejected message to {}: {}", to, resp.status());
                false
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", to, e);
                false
            }
        }
    }
}

/// A composed message: subject, plain text, HTML variant
pub struct Message {
    pub subject: String,
    pub body: String,
    pub html_body: String,
}

/// Alert sent to the user's own address about a miss
pub fn user_alert(user: &User, activity: &ScheduledActivity, importance: &str) -> Message {
    let subject = format!("Memobridge Reminder: You missed {}", activity.activity_name);

    let body = format!(
        "Hello {},\n\
         We noticed you missed an important activity:\n\
         Activity: {}\n\
         Scheduled Time: {}\n\
         Importance: {}\n\n\
         Please try to complete this activity as soon as possible.\n\
         If you have already completed it, you can mark it as completed in the app.\n\n\
         Memobridge Care Team",
        user.name,
        activity.activity_name,
        activity.scheduled_time,
        importance
    );

    let html_body = format!(
        "<h2>Hello {},</h2>\
         <p>We noticed you missed an important activity:</p>\
         <ul>\
         <li>Activity: {}</li>\
         <li>Scheduled Time: {}</li>\
         <li>Importance: {}</li>\
         </ul>\
         <p>Please try to complete this activity as soon as possible.</p>\
         <p>If you have already completed it, you can mark it as completed in the app.</p>\
         <p><strong>Memobridge Care Team</strong></p>",
        user.name,
        activity.activity_name,
        activity.scheduled_time,
        importance.to_uppercase()
    );

    Message {
        subject,
        body,
        html_body,
    }
}

/// Escalation alert sent to one family contact
pub fn family_alert(
    user: &User,
    contact: &FamilyContact,
    activity: &ScheduledActivity,
    importance: &str,
) -> Message {
    let subject = format!(
        "Memobridge Alert: {} missed {}",
        user.name, activity.activity_name
    );

    let body = format!(
        "Alert: {} missed {} at {}\n\
         Importance: {}\n\
         Please check on them.",
        user.name, activity.activity_name, activity.scheduled_time, importance
    );

    let html_body = format!(
        "<h2>Hello {},</h2>\
         <p><strong>{}</strong> has missed an important activity:</p>\
         <ul>\
         <li>Activity: {}</li>\
         <li>Scheduled Time: {}</li>\
         <li>Importance: {}</li>\
         </ul>\
         <p>Please check on them to ensure their well-being.</p>",
        contact.name,
        user.name,
        activity.activity_name,
        activity.scheduled_time,
        importance.to_uppercase()
    );

    Message {
        subject,
        body,
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: "u1".to_string(),
            name: "Margaret".to_string(),
            email: "margaret@example.com".to_string(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    fn test_activity() -> ScheduledActivity {
        ScheduledActivity {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            activity_name: "Morning Medication".to_string(),
            scheduled_time: "09:00".to_string(),
            days_of_week: "1,2,3,4,5,6,7".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn test_contact() -> FamilyContact {
        FamilyContact {
            id: "f1".to_string(),
            user_id: "u1".to_string(),
            name: "Anna".to_string(),
            relation: "daughter".to_string(),
            phone: None,
            email: Some("anna@example.com".to_string()),
            receive_notifications: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_alert_contents() {
        let msg = user_alert(&test_user(), &test_activity(), "high");

        assert!(msg.subject.contains("You missed Morning Medication"));
        assert!(msg.body.contains("Hello Margaret"));
        assert!(msg.body.contains("Scheduled Time: 09:00"));
        assert!(msg.html_body.contains("HIGH"));
    }

    #[test]
    fn test_family_alert_contents() {
        let msg = family_alert(&test_user(), &test_contact(), &test_activity(), "high");

        assert!(msg.subject.contains("Margaret missed Morning Medication"));
        assert!(msg.body.contains("Please check on them."));
        assert!(msg.html_body.contains("Hello Anna"));
    }

    #[test]
    fn test_outbound_message_serialization() {
        let message = OutboundMessage {
            from: "Memobridge Care Team <care@example.com>".to_string(),
            to: "margaret@example.com",
            subject: "Test",
            text: "Body",
            html: None,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["to"], "margaret@example.com");
        assert!(json.get("html").is_none());
    }
}
