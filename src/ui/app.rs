use chrono::{DateTime, Duration, Utc};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::widgets::ListState;
use tracing::{error, info};

use super::form::{parse_deadline, parse_status, Form, FormEvent, FormKind};
use crate::error::{FlowError, FlowResult};
use crate::model::{Task, TaskStatus, User};
use crate::reminders::{Notification, NotificationKind};
use crate::scheduler::{self, Scheduler};
use crate::service::{FlowSync, NewProject, NewTask, NewUser, ProfileUpdate, TaskFilter, TaskPatch};
use crate::stats::ReportPeriod;
use crate::sync::{self, SyncRecord};
use crate::theme::Theme;

const TOAST_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Tasks,
    Projects,
    Kanban,
    Report,
    Profile,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Tasks,
        View::Projects,
        View::Kanban,
        View::Report,
        View::Profile,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Tasks => "Tasks",
            View::Projects => "Projects",
            View::Kanban => "Kanban",
            View::Report => "Report",
            View::Profile => "Profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    /// `None` stays until dismissed.
    pub expires: Option<DateTime<Utc>>,
}

pub struct App {
    pub flow: FlowSync,
    pub user: Option<User>,
    pub theme: Theme,
    pub view: View,
    pub form: Option<Form>,
    pub toasts: Vec<Toast>,
    pub task_filter: TaskFilter,
    pub task_list: ListState,
    pub project_list: ListState,
    pub kanban_column: usize,
    pub kanban_row: usize,
    pub report_period: ReportPeriod,
    pub last_sync: Option<SyncRecord>,
    pub device_id: Option<String>,
    pub scheduler: Scheduler,
    pub quit: bool,
}

impl App {
    pub fn new(flow: FlowSync) -> FlowResult<App> {
        let theme = Theme::load(flow.store())?;
        let mut app = App {
            user: None,
            theme,
            view: View::Dashboard,
            form: None,
            toasts: vec![],
            task_filter: TaskFilter::All,
            task_list: ListState::default(),
            project_list: ListState::default(),
            kanban_column: 0,
            kanban_row: 0,
            report_period: ReportPeriod::Week,
            last_sync: sync::last_sync(flow.store())?,
            device_id: Some(sync::device_id(flow.store())?),
            scheduler: Scheduler::default(),
            quit: false,
            flow,
        };

        match app.flow.resume_session()? {
            Some(user) => {
                app.toast(format!("Welcome back, {}!", user.name), ToastLevel::Success);
                app.start_session(user);
            }
            None => app.form = Some(Form::new(FormKind::Login)),
        }
        Ok(app)
    }

    fn start_session(&mut self, user: User) {
        self.scheduler = Scheduler::start(&self.flow.now_local());
        self.user = Some(user);
        self.view = View::Dashboard;
        self.form = None;
    }

    pub fn refresh(&mut self) {
        match self.flow.current_user() {
            Ok(user) => self.user = user,
            Err(err) => self.report_error(err),
        }
    }

    pub fn toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.toasts.push(Toast {
            message: message.into(),
            level,
            expires: Some(self.flow.now() + Duration::seconds(TOAST_SECS)),
        });
    }

    fn notify(&mut self, notification: Notification) {
        let level = match notification.kind {
            NotificationKind::DeadlinePassed => ToastLevel::Error,
            NotificationKind::DeadlineSoon | NotificationKind::HighPriority => ToastLevel::Warning,
            _ => ToastLevel::Info,
        };
        self.toasts.push(Toast {
            message: format!("{}: {}", notification.title, notification.body),
            level,
            expires: if notification.interactive {
                None
            } else {
                Some(self.flow.now() + Duration::seconds(TOAST_SECS * 3))
            },
        });
    }

    fn report_error(&mut self, err: FlowError) {
        if !err.is_user_facing() {
            error!(error = %err, "operation failed");
        }
        self.toast(err.to_string(), ToastLevel::Error);
    }

    /// Called on every loop turn: expires toasts and fires reminders.
    pub fn tick(&mut self) {
        let now = self.flow.now();
        self.toasts
            .retain(|t| t.expires.map_or(true, |expires| expires > now));

        let local = self.flow.now_local();
        let checks = self.scheduler.poll(&local);
        if checks.is_empty() {
            return;
        }
        let notes = match &self.user {
            Some(user) => scheduler::run_checks(&checks, &user.tasks, &local),
            None => vec![],
        };
        for n in notes {
            self.notify(n);
        }
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.user
            .as_ref()
            .map(|u| u.tasks.iter().filter(|t| self.task_filter.matches(t)).collect())
            .unwrap_or_default()
    }

    pub fn column_tasks(&self, status: TaskStatus) -> Vec<&Task> {
        self.user
            .as_ref()
            .map(|u| u.tasks.iter().filter(|t| t.status == status).collect())
            .unwrap_or_default()
    }

    fn selected_task_id(&self) -> Option<u64> {
        match self.view {
            View::Tasks => {
                let index = self.task_list.selected()?;
                self.visible_tasks().get(index).map(|t| t.id)
            }
            View::Kanban => {
                let status = TaskStatus::ALL.get(self.kanban_column)?;
                self.column_tasks(*status).get(self.kanban_row).map(|t| t.id)
            }
            _ => None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if let Some(mut form) = self.form.take() {
            self.handle_form_key(&mut form, code);
            return;
        }

        if self.user.is_none() {
            self.form = Some(Form::new(FormKind::Login));
            return;
        }

        match code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.view = View::ALL[index];
            }
            KeyCode::Tab => {
                let index = View::ALL.iter().position(|v| *v == self.view).unwrap_or(0);
                self.view = View::ALL[(index + 1) % View::ALL.len()];
            }
            KeyCode::Char('T') => match Theme::toggle(self.flow.store()) {
                Ok(theme) => self.theme = theme,
                Err(err) => self.report_error(err),
            },
            KeyCode::Char('O') => self.logout(),
            KeyCode::Char('S') => match sync::sync(&self.flow) {
                Ok(record) => {
                    self.toast("Synced", ToastLevel::Success);
                    self.last_sync = Some(record);
                }
                Err(err) => self.report_error(err),
            },
            KeyCode::Char('x') => {
                self.toasts.clear();
            }
            KeyCode::Char('n') => {
                let kind = match self.view {
                    View::Projects => FormKind::NewProject,
                    _ => FormKind::NewTask,
                };
                self.form = Some(Form::new(kind));
            }
            KeyCode::Char('e') => self.open_edit(),
            KeyCode::Char('D') => self.delete_selected(),
            KeyCode::Char('f') if self.view == View::Tasks => {
                self.task_filter = self.task_filter.next();
                self.task_list.select(None);
            }
            KeyCode::Char('p') if self.view == View::Report => {
                self.report_period = self.report_period.next();
            }
            KeyCode::Char(' ') | KeyCode::Enter if self.view == View::Tasks => {
                self.advance_selected(1);
            }
            KeyCode::Char('H') if self.view == View::Kanban => self.advance_selected(-1),
            KeyCode::Char('L') if self.view == View::Kanban => self.advance_selected(1),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('h') | KeyCode::Left if self.view == View::Kanban => {
                self.kanban_column = self.kanban_column.saturating_sub(1);
                self.kanban_row = 0;
            }
            KeyCode::Char('l') | KeyCode::Right if self.view == View::Kanban => {
                self.kanban_column = (self.kanban_column + 1).min(TaskStatus::ALL.len() - 1);
                self.kanban_row = 0;
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, step: i32) {
        let step_index = |current: Option<usize>, len: usize| -> Option<usize> {
            if len == 0 {
                return None;
            }
            Some(match current {
                Some(v) if step < 0 => v.saturating_sub(1),
                Some(v) => (v + 1).min(len - 1),
                None => 0,
            })
        };

        match self.view {
            View::Tasks => {
                let len = self.visible_tasks().len();
                self.task_list.select(step_index(self.task_list.selected(), len));
            }
            View::Projects => {
                let len = self.user.as_ref().map_or(0, |u| u.projects.len());
                self.project_list
                    .select(step_index(self.project_list.selected(), len));
            }
            View::Kanban => {
                let len = TaskStatus::ALL
                    .get(self.kanban_column)
                    .map_or(0, |s| self.column_tasks(*s).len());
                self.kanban_row = step_index(Some(self.kanban_row), len).unwrap_or(0);
            }
            _ => {}
        }
    }

    fn advance_selected(&mut self, step: i32) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let Some(current) = self.user.as_ref().and_then(|u| u.task(id)).map(|t| t.status) else {
            return;
        };
        // The task list cycles; the Kanban board stops at its edges.
        let next = match (self.view, current.shifted(step)) {
            (_, Some(next)) => next,
            (View::Tasks, None) => TaskStatus::Todo,
            (_, None) => return,
        };

        match self.flow.change_status(id, next) {
            Ok(task) => {
                if task.is_done() {
                    self.toast(format!("Completed \"{}\"", task.title), ToastLevel::Success);
                }
                if self.view == View::Kanban {
                    if let Some(column) = TaskStatus::ALL.iter().position(|s| *s == next) {
                        self.kanban_column = column;
                    }
                    self.kanban_row = 0;
                }
            }
            Err(err) => self.report_error(err),
        }
        self.refresh();
    }

    fn open_edit(&mut self) {
        if self.view == View::Profile {
            if let Some(user) = &self.user {
                self.form = Some(Form::edit_profile(user));
            }
            return;
        }
        let task = self
            .selected_task_id()
            .and_then(|id| self.user.as_ref().and_then(|u| u.task(id)));
        if let Some(task) = task {
            self.form = Some(Form::edit_task(task));
        }
    }

    fn delete_selected(&mut self) {
        let result = match self.view {
            View::Projects => {
                let id = self.project_list.selected().and_then(|index| {
                    self.user
                        .as_ref()
                        .and_then(|u| u.projects.get(index))
                        .map(|p| p.id)
                });
                match id {
                    Some(id) => self.flow.delete_project(id).map(|p| p.title),
                    None => return,
                }
            }
            _ => match self.selected_task_id() {
                Some(id) => self.flow.delete_task(id).map(|t| t.title),
                None => return,
            },
        };

        match result {
            Ok(title) => self.toast(format!("Deleted \"{}\"", title), ToastLevel::Info),
            Err(err) => self.report_error(err),
        }
        self.task_list.select(None);
        self.project_list.select(None);
        self.kanban_row = 0;
        self.refresh();
    }

    fn logout(&mut self) {
        if let Err(err) = self.flow.logout() {
            self.report_error(err);
        }
        self.scheduler.clear();
        self.user = None;
        self.toasts.clear();
        self.form = Some(Form::new(FormKind::Login));
    }

    fn handle_form_key(&mut self, form: &mut Form, code: KeyCode) {
        let on_auth_screen = self.user.is_none();

        if on_auth_screen {
            let switch = match code {
                KeyCode::F(2) => Some(FormKind::Register),
                KeyCode::F(3) => Some(FormKind::ForgotPassword),
                KeyCode::F(5) => Some(FormKind::RedeemToken),
                KeyCode::F(1) => Some(FormKind::Login),
                _ => None,
            };
            if let Some(kind) = switch {
                self.form = Some(Form::new(kind));
                return;
            }
            if code == KeyCode::F(4) {
                self.demo_login();
                return;
            }
        }

        match form.handle_key(code) {
            FormEvent::Editing => self.form = Some(form.clone()),
            FormEvent::Cancel => {
                if on_auth_screen {
                    match form.kind {
                        FormKind::Login => self.quit = true,
                        _ => self.form = Some(Form::new(FormKind::Login)),
                    }
                }
            }
            FormEvent::Submit => {
                if let Err(err) = self.submit(form) {
                    self.report_error(err);
                    self.form = Some(form.clone());
                }
            }
        }
    }

    fn demo_login(&mut self) {
        let now = self.flow.now();
        let result = crate::demo::seed_demo(self.flow.store(), now)
            .and_then(|_| self.flow.login("admin", "admin"));
        match result {
            Ok(user) => self.logged_in(user),
            Err(err) => self.report_error(err),
        }
    }

    fn logged_in(&mut self, user: User) {
        info!(user_id = user.id, "session started");
        self.toast(format!("Welcome, {}!", user.name), ToastLevel::Success);
        self.start_session(user);
    }

    fn submit(&mut self, form: &Form) -> FlowResult<()> {
        match &form.kind {
            FormKind::Login => {
                let user = self.flow.login(form.value(0), form.value(1))?;
                self.logged_in(user);
            }
            FormKind::Register => {
                let user = self.flow.register(NewUser {
                    username: form.value(0).to_string(),
                    name: form.value(1).to_string(),
                    password: form.value(2).to_string(),
                    email: form.value(3).to_string(),
                    phone: form.value(4).to_string(),
                })?;
                self.logged_in(user);
            }
            FormKind::ForgotPassword => {
                let ticket = self.flow.request_password_reset(form.value(0))?;
                self.toast("Reset link sent to your email", ToastLevel::Success);
                self.form = Some(Form::new(FormKind::ResetPassword {
                    username: ticket.username,
                    token: ticket.token,
                }));
            }
            FormKind::RedeemToken => {
                let ticket = self.flow.verify_reset_token(form.value(0).trim())?;
                self.form = Some(Form::new(FormKind::ResetPassword {
                    username: ticket.username,
                    token: ticket.token,
                }));
            }
            FormKind::ResetPassword { username, token } => {
                self.flow
                    .reset_password(username, form.value(0), form.value(1), token)?;
                self.toast("Password reset, please log in", ToastLevel::Success);
                let mut login = Form::new(FormKind::Login);
                login.fields[0].value = username.clone();
                login.focus = 1;
                self.form = Some(login);
            }
            FormKind::NewTask => {
                let task = self.flow.create_task(NewTask {
                    title: form.value(0).to_string(),
                    description: form.value(1).to_string(),
                    deadline: parse_deadline(form.value(2))?,
                    status: Some(parse_status(form.value(3))?),
                })?;
                self.toast(format!("Added \"{}\"", task.title), ToastLevel::Success);
                self.check_deadlines();
            }
            FormKind::EditTask(id) => {
                let task = self.flow.update_task(
                    *id,
                    TaskPatch {
                        title: Some(form.value(0).to_string()),
                        description: Some(form.value(1).to_string()),
                        deadline: Some(parse_deadline(form.value(2))?),
                        status: Some(parse_status(form.value(3))?),
                    },
                )?;
                self.toast(format!("Updated \"{}\"", task.title), ToastLevel::Success);
                self.check_deadlines();
            }
            FormKind::NewProject => {
                let project = self.flow.create_project(NewProject {
                    title: form.value(0).to_string(),
                    description: form.value(1).to_string(),
                    deadline: parse_deadline(form.value(2))?,
                })?;
                self.toast(format!("Added project \"{}\"", project.title), ToastLevel::Success);
            }
            FormKind::EditProfile => {
                self.flow.update_profile(ProfileUpdate {
                    name: Some(form.value(0).to_string()),
                    email: Some(form.value(1).to_string()),
                    phone: Some(form.value(2).to_string()),
                })?;
                self.toast("Profile updated", ToastLevel::Success);
            }
        }
        self.refresh();
        Ok(())
    }

    /// Deadline toasts right after a task changes, outside the timers.
    fn check_deadlines(&mut self) {
        self.refresh();
        let local = self.flow.now_local();
        let notes = match &self.user {
            Some(user) => scheduler::run_checks(&[scheduler::Check::Deadlines], &user.tasks, &local),
            None => vec![],
        };
        for n in notes {
            self.notify(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;

    fn app() -> App {
        App::new(FlowSync::new(Store::open_in_memory().unwrap())).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn register(app: &mut App) {
        app.handle_key(KeyCode::F(2), KeyModifiers::NONE);
        for value in ["ana", "Ana", "secret1", "ana@example.com"] {
            type_text(app, value);
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        }
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
    }

    #[test]
    fn test_starts_on_login_form() {
        let app = app();
        assert!(app.user.is_none());
        assert_eq!(app.form.as_ref().map(|f| f.kind.clone()), Some(FormKind::Login));
    }

    #[test]
    fn test_register_then_add_and_complete_task() {
        let mut app = app();
        register(&mut app);
        assert_eq!(app.user.as_ref().map(|u| u.username.as_str()), Some("ana"));
        assert!(app.scheduler.is_armed());

        app.handle_key(KeyCode::Char('2'), KeyModifiers::NONE);
        app.handle_key(KeyCode::Char('n'), KeyModifiers::NONE);
        type_text(&mut app, "Write report");
        for _ in 0..3 {
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        }
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.form.is_none());
        assert_eq!(app.visible_tasks().len(), 1);

        app.handle_key(KeyCode::Char('j'), KeyModifiers::NONE);
        app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE);
        app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE);
        let user = app.user.as_ref().unwrap();
        assert_eq!(user.tasks[0].status, TaskStatus::Done);
        assert_eq!(user.productivity_stats.weekly.productivity_score, 100);
    }

    #[test]
    fn test_bad_login_keeps_form_and_shows_error() {
        let mut app = app();
        type_text(&mut app, "ghost");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        type_text(&mut app, "nope");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.user.is_none());
        assert!(app.form.is_some());
        assert_eq!(app.toasts.last().map(|t| t.level), Some(ToastLevel::Error));
    }

    #[test]
    fn test_logout_clears_scheduler() {
        let mut app = app();
        register(&mut app);
        app.handle_key(KeyCode::Char('O'), KeyModifiers::NONE);
        assert!(app.user.is_none());
        assert!(!app.scheduler.is_armed());
    }

    #[test]
    fn test_reset_from_token_alone() {
        let mut app = app();
        register(&mut app);
        let ticket = app.flow.request_password_reset("ana@example.com").unwrap();
        app.handle_key(KeyCode::Char('O'), KeyModifiers::NONE);

        app.handle_key(KeyCode::F(5), KeyModifiers::NONE);
        type_text(&mut app, &ticket.token);
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            app.form.as_ref().map(|f| f.kind.clone()),
            Some(FormKind::ResetPassword {
                username: "ana".to_string(),
                token: ticket.token.clone(),
            })
        );

        for _ in 0..2 {
            type_text(&mut app, "newpass1");
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        }
        assert_eq!(app.form.as_ref().map(|f| f.kind.clone()), Some(FormKind::Login));
        assert_eq!(app.form.as_ref().map(|f| f.value(0)), Some("ana"));
        assert!(app.flow.login("ana", "newpass1").is_ok());
    }

    #[test]
    fn test_bad_token_keeps_form() {
        let mut app = app();
        app.handle_key(KeyCode::F(5), KeyModifiers::NONE);
        type_text(&mut app, "nope");
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.form.as_ref().map(|f| f.kind.clone()), Some(FormKind::RedeemToken));
        assert_eq!(app.toasts.last().map(|t| t.level), Some(ToastLevel::Error));
    }

    #[test]
    fn test_demo_login() {
        let mut app = app();
        app.handle_key(KeyCode::F(4), KeyModifiers::NONE);
        assert_eq!(app.user.as_ref().map(|u| u.username.as_str()), Some("admin"));
    }
}
