use chrono::NaiveDate;
use crossterm::event::KeyCode;

use crate::error::{FlowError, FlowResult};
use crate::model::{Task, TaskStatus, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    ForgotPassword,
    RedeemToken,
    ResetPassword { username: String, token: String },
    NewTask,
    EditTask(u64),
    NewProject,
    EditProfile,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl Field {
    fn new(label: &'static str) -> Field {
        Field {
            label,
            value: String::new(),
            secret: false,
        }
    }

    fn secret(label: &'static str) -> Field {
        Field {
            secret: true,
            ..Field::new(label)
        }
    }

    fn with(mut self, value: impl Into<String>) -> Field {
        self.value = value.into();
        self
    }
}

pub enum FormEvent {
    Editing,
    Submit,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(kind: FormKind) -> Form {
        let fields = match &kind {
            FormKind::Login => vec![Field::new("Username"), Field::secret("Password")],
            FormKind::Register => vec![
                Field::new("Username"),
                Field::new("Full name"),
                Field::secret("Password"),
                Field::new("Email"),
                Field::new("Phone (optional)"),
            ],
            FormKind::ForgotPassword => vec![Field::new("Email")],
            FormKind::RedeemToken => vec![Field::new("Reset token")],
            FormKind::ResetPassword { .. } => {
                vec![Field::secret("New password"), Field::secret("Confirm password")]
            }
            FormKind::NewTask | FormKind::EditTask(_) => vec![
                Field::new("Title"),
                Field::new("Description"),
                Field::new("Deadline (YYYY-MM-DD)"),
                Field::new("Status (todo/inprogress/done)").with("todo"),
            ],
            FormKind::NewProject => vec![
                Field::new("Title"),
                Field::new("Description"),
                Field::new("Deadline (YYYY-MM-DD)"),
            ],
            FormKind::EditProfile => {
                vec![Field::new("Full name"), Field::new("Email"), Field::new("Phone")]
            }
        };
        Form {
            kind,
            fields,
            focus: 0,
        }
    }

    pub fn edit_task(task: &Task) -> Form {
        let mut form = Form::new(FormKind::EditTask(task.id));
        form.fields[0].value = task.title.clone();
        form.fields[1].value = task.description.clone();
        form.fields[2].value = task
            .deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        form.fields[3].value = task.status.to_string();
        form
    }

    pub fn edit_profile(user: &User) -> Form {
        let mut form = Form::new(FormKind::EditProfile);
        form.fields[0].value = user.name.clone();
        form.fields[1].value = user.email.clone();
        form.fields[2].value = user.phone.clone();
        form
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Login => "Login",
            FormKind::Register => "Register",
            FormKind::ForgotPassword => "Forgot password",
            FormKind::RedeemToken => "I have a reset token",
            FormKind::ResetPassword { .. } => "Reset password",
            FormKind::NewTask => "New task",
            FormKind::EditTask(_) => "Edit task",
            FormKind::NewProject => "New project",
            FormKind::EditProfile => "Edit profile",
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.value.as_str())
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        match code {
            KeyCode::Esc => return FormEvent::Cancel,
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.pop();
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % self.fields.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Enter => {
                if self.focus + 1 == self.fields.len() {
                    return FormEvent::Submit;
                }
                self.focus += 1;
            }
            _ => {}
        }
        FormEvent::Editing
    }
}

pub fn parse_deadline(value: &str) -> FlowResult<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FlowError::validation("Deadline must look like 2025-12-31"))
}

pub fn parse_status(value: &str) -> FlowResult<TaskStatus> {
    if value.trim().is_empty() {
        return Ok(TaskStatus::Todo);
    }
    TaskStatus::parse(value)
        .ok_or_else(|| FlowError::validation("Status must be todo, inprogress or done"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_navigation() {
        let mut form = Form::new(FormKind::Login);
        for c in "ana".chars() {
            form.handle_key(KeyCode::Char(c));
        }
        form.handle_key(KeyCode::Backspace);
        assert!(matches!(form.handle_key(KeyCode::Enter), FormEvent::Editing));
        form.handle_key(KeyCode::Char('x'));
        assert_eq!(form.value(0), "an");
        assert_eq!(form.value(1), "x");
        assert!(matches!(form.handle_key(KeyCode::Enter), FormEvent::Submit));
        assert!(matches!(form.handle_key(KeyCode::Esc), FormEvent::Cancel));
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = Form::new(FormKind::Login);
        form.handle_key(KeyCode::Up);
        assert_eq!(form.focus, 1);
        form.handle_key(KeyCode::Tab);
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_deadline(" ").unwrap(), None);
        assert_eq!(
            parse_deadline("2025-12-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert!(parse_deadline("31/12/2025").is_err());
        assert_eq!(parse_status("").unwrap(), TaskStatus::Todo);
        assert!(parse_status("later").is_err());
    }
}
