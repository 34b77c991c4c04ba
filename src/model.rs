use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value.trim().to_lowercase().as_str() {
            "todo" => Some(TaskStatus::Todo),
            "inprogress" | "in-progress" | "doing" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Next column on the Kanban board, `None` past the edges.
    pub fn shifted(&self, step: i32) -> Option<TaskStatus> {
        let index = TaskStatus::ALL.iter().position(|s| s == self)? as i32 + step;
        usize::try_from(index)
            .ok()
            .and_then(|i| TaskStatus::ALL.get(i).copied())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PeriodStats {
    pub tasks_completed: u32,
    pub tasks_created: u32,
    pub productivity_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityStats {
    pub weekly: PeriodStats,
    pub monthly: PeriodStats,
    pub last_updated: DateTime<Utc>,
    /// (ISO year, ISO week) the weekly counters belong to.
    #[serde(default)]
    pub week: Option<(i32, u32)>,
    /// (year, month) the monthly counters belong to.
    #[serde(default)]
    pub month: Option<(i32, u32)>,
}

impl ProductivityStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        let week = now.iso_week();
        ProductivityStats {
            weekly: PeriodStats::default(),
            monthly: PeriodStats::default(),
            last_updated: now,
            week: Some((week.year(), week.week())),
            month: Some((now.year(), now.month())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub productivity_stats: ProductivityStats,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_done()).count()
    }
}

/// Next id for a collection: one past the largest in use.
pub fn next_id<I: IntoIterator<Item = u64>>(ids: I) -> u64 {
    ids.into_iter().max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"inprogress\"");
        let parsed: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    #[test]
    fn test_status_parse_accepts_aliases() {
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse(" TODO "), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("blocked"), None);
    }

    #[test]
    fn test_shifted_stops_at_edges() {
        assert_eq!(TaskStatus::Todo.shifted(1), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::Done.shifted(1), None);
        assert_eq!(TaskStatus::Todo.shifted(-1), None);
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(Vec::<u64>::new()), 1);
        assert_eq!(next_id(vec![3, 9, 4]), 10);
    }
}
