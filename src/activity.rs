use chrono::{DateTime, Local, Utc};

use crate::model::{next_id, Activity};

pub const MAX_ACTIVITIES: usize = 10;
pub const DASHBOARD_ACTIVITIES: usize = 5;

/// Newest first, capped at [`MAX_ACTIVITIES`].
pub fn push_activity(activities: &mut Vec<Activity>, kind: &str, title: String, now: DateTime<Utc>) {
    let activity = Activity {
        id: next_id(activities.iter().map(|a| a.id)),
        kind: kind.to_string(),
        title,
        timestamp: now,
    };
    activities.insert(0, activity);
    activities.truncate(MAX_ACTIVITIES);
}

pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - timestamp;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} h ago", hours)
    } else if days < 7 {
        format!("{} days ago", days)
    } else {
        timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_log_is_capped_newest_first() {
        let mut log = Vec::new();
        for i in 0..12 {
            push_activity(&mut log, "task_added", format!("task {}", i), noon());
        }
        assert_eq!(log.len(), MAX_ACTIVITIES);
        assert_eq!(log[0].title, "task 11");
        assert_eq!(log[9].title, "task 2");
    }

    #[test]
    fn test_relative_buckets() {
        let now = noon();
        assert_eq!(format_relative(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5 min ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 h ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2 days ago");
        assert_eq!(
            format_relative(now - Duration::days(30), now).len(),
            "2025-11-26".len()
        );
    }
}
