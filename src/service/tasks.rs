use chrono::NaiveDate;
use tracing::info;

use super::{required, FlowSync};
use crate::activity::push_activity;
use crate::error::{FlowError, FlowResult};
use crate::model::{next_id, Task, TaskStatus};
use crate::stats::{self, StatAction};

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub deadline: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

/// Fields left as `None` are kept.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl TaskFilter {
    pub fn parse(value: &str) -> Option<TaskFilter> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(TaskFilter::All);
        }
        TaskStatus::parse(value).map(TaskFilter::Only)
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Only(status) => task.status == *status,
        }
    }

    /// Cycles all -> todo -> in progress -> done -> all.
    pub fn next(&self) -> TaskFilter {
        match self {
            TaskFilter::All => TaskFilter::Only(TaskStatus::Todo),
            TaskFilter::Only(TaskStatus::Todo) => TaskFilter::Only(TaskStatus::InProgress),
            TaskFilter::Only(TaskStatus::InProgress) => TaskFilter::Only(TaskStatus::Done),
            TaskFilter::Only(TaskStatus::Done) => TaskFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Only(status) => crate::reminders::status_label(*status),
        }
    }
}

impl FlowSync {
    pub fn tasks(&self, filter: TaskFilter) -> FlowResult<Vec<Task>> {
        let user = self.require_user()?;
        Ok(user.tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub fn create_task(&self, new: NewTask) -> FlowResult<Task> {
        let title = required(&new.title, "Task title is required")?;

        self.update_current(|user, now| {
            let status = new.status.unwrap_or(TaskStatus::Todo);
            let task = Task {
                id: next_id(user.tasks.iter().map(|t| t.id)),
                title,
                description: new.description.trim().to_string(),
                deadline: new.deadline,
                status,
                created_at: now,
                completed_at: (status == TaskStatus::Done).then_some(now),
            };
            user.tasks.push(task.clone());

            stats::record(&mut user.productivity_stats, StatAction::Created, now);
            if task.is_done() {
                stats::record(&mut user.productivity_stats, StatAction::Completed, now);
            }
            push_activity(
                &mut user.activities,
                "task_added",
                format!("Added task: {}", task.title),
                now,
            );

            info!(task_id = task.id, status = %task.status, "task created");
            Ok(task)
        })
    }

    pub fn update_task(&self, id: u64, patch: TaskPatch) -> FlowResult<Task> {
        let title = match &patch.title {
            Some(title) => Some(required(title, "Task title is required")?),
            None => None,
        };

        self.update_current(|user, now| {
            let task = user
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(FlowError::TaskNotFound(id))?;

            let was_done = task.is_done();
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = patch.description {
                task.description = description.trim().to_string();
            }
            if let Some(deadline) = patch.deadline {
                task.deadline = deadline;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }

            let completed = task.is_done() && !was_done;
            if completed {
                task.completed_at = Some(now);
            } else if !task.is_done() {
                task.completed_at = None;
            }
            let task = task.clone();

            if completed {
                stats::record(&mut user.productivity_stats, StatAction::Completed, now);
                push_activity(
                    &mut user.activities,
                    "task_completed",
                    format!("Completed task: {}", task.title),
                    now,
                );
            } else {
                push_activity(
                    &mut user.activities,
                    "task_updated",
                    format!("Edited task: {}", task.title),
                    now,
                );
            }

            info!(task_id = id, status = %task.status, "task updated");
            Ok(task)
        })
    }

    pub fn change_status(&self, id: u64, status: TaskStatus) -> FlowResult<Task> {
        self.update_task(
            id,
            TaskPatch {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    pub fn delete_task(&self, id: u64) -> FlowResult<Task> {
        self.update_current(|user, now| {
            let index = user
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(FlowError::TaskNotFound(id))?;
            let task = user.tasks.remove(index);
            push_activity(
                &mut user.activities,
                "task_deleted",
                format!("Deleted task: {}", task.title),
                now,
            );
            info!(task_id = id, "task deleted");
            Ok(task)
        })
    }
}
