use std::{env, fs, path::PathBuf};

use crate::error::FlowResult;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Reads `FLOWSYNC_HOME`, `FLOWSYNC_DB` and `FLOWSYNC_LOG`, falling back
    /// to `$HOME/.flowsync`.
    pub fn from_env() -> Self {
        let data_dir = env::var_os("FLOWSYNC_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let db_path = env::var_os("FLOWSYNC_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("flowsync.sqlite"));

        Config {
            log_path: data_dir.join("flowsync.log"),
            log_filter: env::var("FLOWSYNC_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir,
            db_path,
        }
    }

    pub fn ensure_data_dir(&self) -> FlowResult<()> {
        if !self.data_dir.is_dir() {
            fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".flowsync"),
        None => PathBuf::from(".flowsync"),
    }
}
