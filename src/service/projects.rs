use chrono::NaiveDate;
use tracing::info;

use super::{required, FlowSync};
use crate::activity::push_activity;
use crate::error::{FlowError, FlowResult};
use crate::model::{next_id, Project, ProjectStatus};

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<ProjectStatus>,
}

impl FlowSync {
    pub fn projects(&self) -> FlowResult<Vec<Project>> {
        Ok(self.require_user()?.projects)
    }

    pub fn create_project(&self, new: NewProject) -> FlowResult<Project> {
        let title = required(&new.title, "Project title is required")?;

        self.update_current(|user, now| {
            let project = Project {
                id: next_id(user.projects.iter().map(|p| p.id)),
                title,
                description: new.description.trim().to_string(),
                deadline: new.deadline,
                status: ProjectStatus::Active,
                created_at: now,
            };
            user.projects.push(project.clone());
            push_activity(
                &mut user.activities,
                "project_added",
                format!("Added project: {}", project.title),
                now,
            );
            info!(project_id = project.id, "project created");
            Ok(project)
        })
    }

    pub fn update_project(&self, id: u64, patch: ProjectPatch) -> FlowResult<Project> {
        let title = match &patch.title {
            Some(title) => Some(required(title, "Project title is required")?),
            None => None,
        };

        self.update_current(|user, _| {
            let project = user
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(FlowError::ProjectNotFound(id))?;
            if let Some(title) = title {
                project.title = title;
            }
            if let Some(description) = patch.description {
                project.description = description.trim().to_string();
            }
            if let Some(deadline) = patch.deadline {
                project.deadline = deadline;
            }
            if let Some(status) = patch.status {
                project.status = status;
            }
            info!(project_id = id, "project updated");
            Ok(project.clone())
        })
    }

    pub fn delete_project(&self, id: u64) -> FlowResult<Project> {
        self.update_current(|user, now| {
            let index = user
                .projects
                .iter()
                .position(|p| p.id == id)
                .ok_or(FlowError::ProjectNotFound(id))?;
            let project = user.projects.remove(index);
            push_activity(
                &mut user.activities,
                "project_deleted",
                format!("Deleted project: {}", project.title),
                now,
            );
            info!(project_id = id, "project deleted");
            Ok(project)
        })
    }
}
