//! Engine configuration constants
//!
//! Central location for notification-window boundaries, scheduling
//! intervals and seed data used throughout the engine.

// ===== Notification Windows =====
//
// Both windows are inclusive on both ends, measured from an activity's
// scheduled moment today. The gap between them (20 to 30 minutes) and
// anything past the family window is a deliberate dead zone: the miss
// has either already been escalated or is too stale to alert on.

/// Start of the user-level alert window (1 minute after due time)
pub const USER_WINDOW_START_SECS: i64 = 60;

/// End of the user-level alert window (20 minutes after due time)
pub const USER_WINDOW_END_SECS: i64 = 20 * 60;

/// Start of the family-escalation window (30 minutes after due time)
pub const FAMILY_WINDOW_START_SECS: i64 = 30 * 60;

/// End of the family-escalation window (40 minutes after due time)
pub const FAMILY_WINDOW_END_SECS: i64 = 40 * 60;

// ===== Background Monitoring =====

/// Interval between background evaluation passes (5 minutes)
pub const MONITOR_POLL_INTERVAL_SECS: u64 = 5 * 60;

/// Notification ledger entries older than this many days are evicted.
/// Keys embed the calendar date, so anything past yesterday can never
/// match again; two days keeps the ledger bounded with slack for
/// evaluations that straddle midnight.
pub const LEDGER_RETENTION_DAYS: i64 = 2;

// ===== Missed Activity Records =====

/// Importance assigned to engine-created missed-activity records
pub const MISSED_IMPORTANCE: &str = "high";

/// Maximum missed-activity records returned per user for the UI feed
pub const MISSED_HISTORY_LIMIT: i64 = 10;

// ===== Activity Defaults =====

/// Weekday mask covering every day of the week (1=Monday .. 7=Sunday)
pub const EVERY_DAY: &str = "1,2,3,4,5,6,7";

/// Scheduled time assigned when a completion names an unknown activity
pub const DEFAULT_SCHEDULED_TIME: &str = "09:00";

/// Activities seeded for a user who has none yet: (name, "HH:MM")
pub const DEFAULT_ACTIVITIES: &[(&str, &str)] = &[
    ("Morning Medication", "09:00"),
    ("Lunch with Family", "11:00"),
    ("Afternoon Rest", "14:00"),
    ("Read Newspaper", "16:00"),
    ("Evening Medication", "18:00"),
    ("Dinner with Family", "20:00"),
];
