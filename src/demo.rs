use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tracing::info;

use crate::error::FlowResult;
use crate::model::{
    Activity, PeriodStats, ProductivityStats, Project, ProjectStatus, Task, TaskStatus, User,
};
use crate::storage::Store;

fn day(today: NaiveDate, offset: i64) -> Option<NaiveDate> {
    today.checked_add_signed(Duration::days(offset))
}

fn task(
    id: u64,
    title: &str,
    description: &str,
    deadline: Option<NaiveDate>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.to_string(),
        deadline,
        status,
        created_at,
        completed_at: None,
    }
}

fn project(id: u64, title: &str, description: &str, deadline: Option<NaiveDate>, created_at: DateTime<Utc>) -> Project {
    Project {
        id,
        title: title.to_string(),
        description: description.to_string(),
        deadline,
        status: ProjectStatus::Active,
        created_at,
    }
}

fn activity(id: u64, kind: &str, title: &str, timestamp: DateTime<Utc>) -> Activity {
    Activity {
        id,
        kind: kind.to_string(),
        title: title.to_string(),
        timestamp,
    }
}

fn admin(now: DateTime<Utc>) -> User {
    let today = now.with_timezone(&Local).date_naive();
    let ago = |days: i64| now - Duration::days(days);

    let mut stats = ProductivityStats::new(now);
    stats.weekly = PeriodStats {
        tasks_completed: 3,
        tasks_created: 8,
        productivity_score: 38,
    };
    stats.monthly = PeriodStats {
        tasks_completed: 8,
        tasks_created: 15,
        productivity_score: 53,
    };

    User {
        id: 1,
        username: "admin".to_string(),
        password: "admin".to_string(),
        name: "Admin Demo".to_string(),
        email: "admin@demo.com".to_string(),
        phone: "08123456789".to_string(),
        tasks: vec![
            task(1, "Monthly report", "Finish the monthly report for management", day(today, 0), TaskStatus::Todo, ago(1)),
            task(2, "Q4 results presentation", "Prepare the year-end meeting deck", day(today, 1), TaskStatus::InProgress, ago(6)),
            task(3, "Review new feature", "Code review for the authentication feature", day(today, 2), TaskStatus::InProgress, ago(4)),
            task(4, "Production server setup", "Deploy the application to production", day(today, -2), TaskStatus::Todo, ago(11)),
            task(5, "Year-end client meeting", "Project evaluation with the main client", day(today, 4), TaskStatus::Todo, ago(16)),
            task(6, "Mobile app testing", "Test the mobile build", day(today, 1), TaskStatus::InProgress, ago(3)),
        ],
        projects: vec![
            project(1, "Company website redesign", "Full redesign on a new stack", day(today, 20), ago(55)),
            project(2, "E-commerce mobile app", "Mobile app for the e-commerce platform", day(today, 64), ago(25)),
            project(3, "Inventory management", "Warehouse inventory system", day(today, 36), ago(41)),
        ],
        activities: vec![
            activity(5, "login", "Demo account initialised", now),
            activity(4, "task_added", "Added task: Monthly report", ago(1)),
            activity(3, "task_completed", "Completed task: Database setup", ago(2)),
            activity(2, "task_added", "Added task: Q4 results presentation", ago(6)),
            activity(1, "project_added", "Added project: E-commerce mobile app", ago(25)),
        ],
        productivity_stats: stats,
        created_at: ago(25),
    }
}

fn john(now: DateTime<Utc>) -> User {
    let today = now.with_timezone(&Local).date_naive();
    User {
        id: 2,
        username: "user123".to_string(),
        password: "password123".to_string(),
        name: "John Doe".to_string(),
        email: "john@example.com".to_string(),
        phone: "081234567890".to_string(),
        tasks: vec![task(
            1,
            "Advanced Rust",
            "Work through the ownership chapters again",
            day(today, 5),
            TaskStatus::InProgress,
            now - Duration::days(6),
        )],
        projects: vec![],
        activities: vec![],
        productivity_stats: ProductivityStats::new(now),
        created_at: now,
    }
}

/// Adds the demo accounts that are missing. Returns how many were added.
pub fn seed_demo(store: &Store, now: DateTime<Utc>) -> FlowResult<usize> {
    let mut users = store.users()?;
    let mut added = 0;

    for mut demo in [admin(now), john(now)] {
        if users.iter().any(|u| u.username == demo.username) {
            continue;
        }
        if users.iter().any(|u| u.id == demo.id) {
            demo.id = crate::model::next_id(users.iter().map(|u| u.id));
        }
        users.push(demo);
        added += 1;
    }

    if added > 0 {
        store.save_users(&users)?;
        info!(added, "demo accounts seeded");
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seed_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 12, 26, 9, 0, 0).unwrap();
        assert_eq!(seed_demo(&store, now).unwrap(), 2);
        assert_eq!(seed_demo(&store, now).unwrap(), 0);

        let users = store.users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].tasks.len(), 6);
        assert_eq!(users[0].projects.len(), 3);
    }
}
