//! Wall-clock helpers shared by snapshots and results

use chrono::Utc;

/// Current time in milliseconds since the Unix epoch
///
/// Snapshot and result timestamps use this scale so they stay comparable with
/// the values the stores themselves record.
pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}
