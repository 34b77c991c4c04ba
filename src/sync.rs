//! Simulated cloud sync. Nothing leaves the machine; a sync only stamps the
//! store with what would have been pushed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::FlowResult;
use crate::service::FlowSync;
use crate::storage::{Store, DEVICE_ID_KEY, LAST_SYNC_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub device_id: String,
    pub synced_at: DateTime<Utc>,
    pub tasks: usize,
    pub projects: usize,
}

pub fn device_id(store: &Store) -> FlowResult<String> {
    if let Some(id) = store.get::<String>(DEVICE_ID_KEY)? {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    store.set(DEVICE_ID_KEY, &id)?;
    info!(device_id = %id, "device registered");
    Ok(id)
}

pub fn last_sync(store: &Store) -> FlowResult<Option<SyncRecord>> {
    store.get(LAST_SYNC_KEY)
}

pub fn sync(app: &FlowSync) -> FlowResult<SyncRecord> {
    let user = app.require_user()?;
    let record = SyncRecord {
        device_id: device_id(app.store())?,
        synced_at: app.now(),
        tasks: user.tasks.len(),
        projects: user.projects.len(),
    };
    app.store().set(LAST_SYNC_KEY, &record)?;
    info!(tasks = record.tasks, projects = record.projects, "sync recorded");
    Ok(record)
}
