use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::FlowResult;
use crate::model::User;

pub const USERS_KEY: &str = "flowsync_users";
pub const SESSION_KEY: &str = "currentUser";
pub const THEME_KEY: &str = "flowsync_theme";
pub const DEVICE_ID_KEY: &str = "flowsync_device_id";
pub const LAST_SYNC_KEY: &str = "flowsync_last_sync";
pub const RESET_TOKEN_PREFIX: &str = "reset_token_";

pub fn reset_token_key(user_id: u64) -> String {
    format!("{}{}", RESET_TOKEN_PREFIX, user_id)
}

/// JSON values under string keys, backed by one SQLite table.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> FlowResult<Store> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> FlowResult<Store> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Store { conn })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> FlowResult<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> FlowResult<()> {
        let json = serde_json::to_string(value)?;
        debug!(key, bytes = json.len(), "store write");
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> FlowResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> FlowResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix], |row| row.get(0))?;
        let keys = rows.collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub fn users(&self) -> FlowResult<Vec<User>> {
        Ok(self.get(USERS_KEY)?.unwrap_or_default())
    }

    /// Whole-list overwrite; the last writer wins.
    pub fn save_users(&self, users: &[User]) -> FlowResult<()> {
        self.set(USERS_KEY, users)
    }

    pub fn session(&self) -> FlowResult<Option<u64>> {
        self.get(SESSION_KEY)
    }
}

fn init_db(conn: &Connection) -> FlowResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        params![],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let store = Store::open_in_memory().unwrap();
        let value: Option<String> = store.get("nope").unwrap();
        assert!(value.is_none());
        assert!(store.users().unwrap().is_empty());
    }

    #[test]
    fn test_set_overwrites_and_remove_deletes() {
        let store = Store::open_in_memory().unwrap();
        store.set(THEME_KEY, "light").unwrap();
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get::<String>(THEME_KEY).unwrap().as_deref(), Some("dark"));

        store.remove(THEME_KEY).unwrap();
        assert!(store.get::<String>(THEME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = Store::open_in_memory().unwrap();
        store.set(&reset_token_key(2), &1).unwrap();
        store.set(&reset_token_key(1), &1).unwrap();
        store.set(THEME_KEY, "dark").unwrap();

        let keys = store.keys_with_prefix(RESET_TOKEN_PREFIX).unwrap();
        assert_eq!(keys, vec!["reset_token_1", "reset_token_2"]);
    }

    #[test]
    fn test_keys_with_prefix_reports_unreadable_rows() {
        let store = Store::open_in_memory().unwrap();
        store.set(&reset_token_key(1), &1).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1 || CAST(X'FF' AS TEXT), '1')",
                params![RESET_TOKEN_PREFIX],
            )
            .unwrap();

        assert!(matches!(
            store.keys_with_prefix(RESET_TOKEN_PREFIX),
            Err(crate::error::FlowError::Storage(_))
        ));
    }
}
