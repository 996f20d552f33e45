//! Services module
//!
//! The escalation engine and the services that surround it.

pub mod activities;
pub mod escalation;
pub mod ledger;
pub mod mailer;
pub mod monitor;
pub mod ports;

pub use activities::{ActivitiesService, CompletionOutcome};
pub use escalation::EscalationEngine;
pub use mailer::{HttpMailer, MailerConfig};
pub use monitor::MonitorService;
pub use ports::{CareStore, NotificationChannel};
