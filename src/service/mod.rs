//! Operations over the persisted user list.
//!
//! Every mutating call loads the whole list, changes it in memory and writes
//! it back, mirroring how the data is stored.

mod accounts;
mod projects;
mod tasks;

use chrono::{DateTime, Local, Utc};

pub use accounts::{NewUser, ProfileUpdate, ResetTicket};
pub use projects::{NewProject, ProjectPatch};
pub use tasks::{NewTask, TaskFilter, TaskPatch};

use crate::activity::push_activity;
use crate::error::{FlowError, FlowResult};
use crate::model::User;
use crate::storage::Store;

pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct FlowSync {
    store: Store,
    clock: Clock,
}

impl FlowSync {
    pub fn new(store: Store) -> FlowSync {
        FlowSync::with_clock(store, Box::new(Utc::now))
    }

    pub fn with_clock(store: Store, clock: Clock) -> FlowSync {
        FlowSync { store, clock }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn now_local(&self) -> DateTime<Local> {
        self.now().with_timezone(&Local)
    }

    pub fn current_user(&self) -> FlowResult<Option<User>> {
        let Some(id) = self.store.session()? else {
            return Ok(None);
        };
        Ok(self.store.users()?.into_iter().find(|u| u.id == id))
    }

    pub fn require_user(&self) -> FlowResult<User> {
        self.current_user()?.ok_or(FlowError::NotLoggedIn)
    }

    /// Applies `f` to the logged-in user and persists the whole list.
    fn update_current<T>(
        &self,
        f: impl FnOnce(&mut User, DateTime<Utc>) -> FlowResult<T>,
    ) -> FlowResult<T> {
        let id = self.store.session()?.ok_or(FlowError::NotLoggedIn)?;
        self.update_user(id, f)
    }

    fn update_user<T>(
        &self,
        id: u64,
        f: impl FnOnce(&mut User, DateTime<Utc>) -> FlowResult<T>,
    ) -> FlowResult<T> {
        let now = self.now();
        let mut users = self.store.users()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(FlowError::UserNotFound)?;
        let out = f(user, now)?;
        self.store.save_users(&users)?;
        Ok(out)
    }

    pub fn add_activity(&self, kind: &str, title: String) -> FlowResult<()> {
        self.update_current(|user, now| {
            push_activity(&mut user.activities, kind, title, now);
            Ok(())
        })
    }
}

pub(crate) fn required(value: &str, message: &str) -> FlowResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FlowError::validation(message));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::Cell, rc::Rc};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    /// A service over an in-memory store with a hand-cranked clock.
    pub struct Harness {
        pub app: FlowSync,
        now: Rc<Cell<DateTime<Utc>>>,
    }

    impl Harness {
        pub fn new() -> Harness {
            let now = Rc::new(Cell::new(Utc.with_ymd_and_hms(2025, 12, 22, 10, 0, 0).unwrap()));
            let clock_now = Rc::clone(&now);
            let app = FlowSync::with_clock(
                Store::open_in_memory().unwrap(),
                Box::new(move || clock_now.get()),
            );
            Harness { app, now }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }

        pub fn registered(username: &str) -> Harness {
            let h = Harness::new();
            h.app
                .register(NewUser {
                    username: username.to_string(),
                    name: "Test User".to_string(),
                    password: "secret1".to_string(),
                    email: format!("{}@example.com", username),
                    phone: String::new(),
                })
                .unwrap();
            h
        }
    }
}
