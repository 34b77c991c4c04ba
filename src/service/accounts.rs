use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{required, FlowSync};
use crate::activity::push_activity;
use crate::error::{FlowError, FlowResult};
use crate::model::{next_id, ProductivityStats, User};
use crate::storage::{reset_token_key, RESET_TOKEN_PREFIX, SESSION_KEY};

const RESET_TOKEN_TTL_HOURS: i64 = 1;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// What a reset-password mail would carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTicket {
    pub token: String,
    pub user_id: u64,
    pub username: String,
    pub expires: DateTime<Utc>,
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

impl FlowSync {
    pub fn register(&self, new: NewUser) -> FlowResult<User> {
        let message = "All fields are required";
        let username = required(&new.username, message)?;
        let name = required(&new.name, message)?;
        let password = required(&new.password, message)?;
        let email = required(&new.email, message)?;

        let now = self.now();
        let mut users = self.store().users()?;
        if users.iter().any(|u| u.username == username) {
            return Err(FlowError::UsernameTaken);
        }

        let mut user = User {
            id: next_id(users.iter().map(|u| u.id)),
            username,
            password,
            name,
            email,
            phone: new.phone.trim().to_string(),
            tasks: vec![],
            projects: vec![],
            activities: vec![],
            productivity_stats: ProductivityStats::new(now),
            created_at: now,
        };
        push_activity(
            &mut user.activities,
            "register",
            format!("Account created: {}", user.name),
            now,
        );
        users.push(user.clone());
        self.store().save_users(&users)?;
        self.store().set(SESSION_KEY, &user.id)?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> FlowResult<User> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(FlowError::validation("Username and password are required"));
        }

        let users = self.store().users()?;
        let Some(user) = users
            .iter()
            .find(|u| u.username == username && u.password == password)
        else {
            warn!(username, "login rejected");
            return Err(FlowError::InvalidCredentials);
        };

        self.store().set(SESSION_KEY, &user.id)?;
        let name = user.name.clone();
        self.add_activity("login", format!("Logged in as {}", name))?;
        info!(user_id = user.id, "user logged in");
        self.require_user()
    }

    /// Picks up a session left by an earlier run.
    pub fn resume_session(&self) -> FlowResult<Option<User>> {
        if self.current_user()?.is_none() {
            return Ok(None);
        }
        self.add_activity("login", "Session resumed".to_string())?;
        self.current_user()
    }

    pub fn logout(&self) -> FlowResult<()> {
        if self.current_user()?.is_some() {
            self.add_activity("logout", "Logged out".to_string())?;
        }
        self.store().remove(SESSION_KEY)?;
        info!("user logged out");
        Ok(())
    }

    pub fn update_profile(&self, update: ProfileUpdate) -> FlowResult<User> {
        self.update_current(|user, now| {
            if let Some(name) = update.name {
                user.name = required(&name, "Name cannot be empty")?;
            }
            if let Some(email) = update.email {
                user.email = required(&email, "Email cannot be empty")?;
            }
            if let Some(phone) = update.phone {
                user.phone = phone.trim().to_string();
            }
            push_activity(&mut user.activities, "profile_updated", "Profile updated".to_string(), now);
            Ok(user.clone())
        })
    }

    pub fn request_password_reset(&self, email: &str) -> FlowResult<ResetTicket> {
        let email = required(email, "Email is required")?;
        if !looks_like_email(&email) {
            return Err(FlowError::validation("Email format is invalid"));
        }

        let users = self.store().users()?;
        let user = users
            .iter()
            .find(|u| u.email == email)
            .ok_or(FlowError::EmailNotFound)?;

        let ticket = ResetTicket {
            token: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            username: user.username.clone(),
            expires: self.now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
        };
        self.store().set(&reset_token_key(user.id), &ticket)?;
        info!(user_id = user.id, "password reset requested");
        Ok(ticket)
    }

    pub fn verify_reset_token(&self, token: &str) -> FlowResult<ResetTicket> {
        let now = self.now();
        for key in self.store().keys_with_prefix(RESET_TOKEN_PREFIX)? {
            if let Some(ticket) = self.store().get::<ResetTicket>(&key)? {
                if ticket.token == token && ticket.expires > now {
                    return Ok(ticket);
                }
            }
        }
        Err(FlowError::InvalidToken)
    }

    pub fn reset_password(
        &self,
        username: &str,
        new_password: &str,
        confirm: &str,
        token: &str,
    ) -> FlowResult<()> {
        let new_password = new_password.trim();
        let confirm = confirm.trim();
        if new_password.is_empty() || confirm.is_empty() {
            return Err(FlowError::validation("New password and confirmation are required"));
        }
        if new_password != confirm {
            return Err(FlowError::validation("Passwords do not match"));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FlowError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user_id = self
            .store()
            .users()?
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.id)
            .ok_or(FlowError::UserNotFound)?;

        let key = reset_token_key(user_id);
        let ticket: ResetTicket = self.store().get(&key)?.ok_or(FlowError::InvalidToken)?;
        if ticket.token != token || ticket.expires <= self.now() {
            return Err(FlowError::InvalidToken);
        }

        self.update_user(user_id, |user, now| {
            user.password = new_password.to_string();
            push_activity(
                &mut user.activities,
                "password_reset",
                format!("Password reset for {}", user.username),
                now,
            );
            Ok(())
        })?;
        self.store().remove(&key)?;
        info!(user_id, "password reset");
        Ok(())
    }

    /// Resets the password of whoever the token was issued to.
    pub fn reset_password_with_token(
        &self,
        token: &str,
        new_password: &str,
        confirm: &str,
    ) -> FlowResult<ResetTicket> {
        let ticket = self.verify_reset_token(token.trim())?;
        self.reset_password(&ticket.username, new_password, confirm, &ticket.token)?;
        Ok(ticket)
    }
}
