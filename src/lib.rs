//! Memobridge engine library
//!
//! Missed-activity detection and staged notification escalation for a
//! caregiving service: per-user daily schedules, completion tracking,
//! user-then-family alert tiers and per-day de-duplication.

pub mod config;
pub mod database;
pub mod error;
pub mod services;
