use std::{error::Error, process::ExitCode};

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use flowsync::activity::format_relative;
use flowsync::config::Config;
use flowsync::demo::seed_demo;
use flowsync::logging::init_logging;
use flowsync::model::{ProjectStatus, TaskStatus};
use flowsync::reminders::{deadline_label, status_label};
use flowsync::scheduler::{run_checks, Check};
use flowsync::service::{
    NewProject, NewTask, NewUser, ProfileUpdate, ProjectPatch, TaskFilter, TaskPatch,
};
use flowsync::stats::{self, ReportPeriod};
use flowsync::storage::Store;
use flowsync::theme::Theme;
use flowsync::{sync, ui, FlowError, FlowSync};

/// Personal task, project and deadline manager.
#[derive(Debug, Parser)]
#[command(name = "flowsync", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the terminal interface (default).
    Tui,
    /// Create an account and log in.
    Register {
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Show or update the profile.
    Profile(ProfileArgs),
    /// Issue a password reset token for an email address.
    ForgotPassword { email: String },
    /// Set a new password with a reset token. The token alone identifies the
    /// account unless --username is given.
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: Option<String>,
        password: String,
        confirm: String,
    },
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Project(ProjectCommand),
    Dashboard,
    /// Productivity report for week, month or last-month.
    Report {
        #[arg(default_value = "week")]
        period: String,
        #[arg(long)]
        json: bool,
    },
    /// Run every reminder check once and print the results.
    Remind,
    /// Recent activity, newest first.
    Activity,
    /// Show the theme, or toggle it.
    Theme { action: Option<String> },
    /// Record a sync snapshot for this device.
    Sync,
    /// Seed the demo accounts (admin/admin, user123/password123).
    Demo,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_parser = parse_date)]
        deadline: Option<NaiveDate>,
        #[arg(long, value_parser = parse_task_status)]
        status: Option<TaskStatus>,
    },
    List {
        /// all, todo, inprogress or done
        #[arg(long, default_value = "all")]
        filter: String,
    },
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        clear_deadline: bool,
        #[arg(long, value_parser = parse_task_status)]
        status: Option<TaskStatus>,
    },
    Status {
        id: u64,
        #[arg(value_parser = parse_task_status)]
        status: TaskStatus,
    },
    Delete {
        id: u64,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_parser = parse_date)]
        deadline: Option<NaiveDate>,
    },
    List,
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        clear_deadline: bool,
        /// Mark the project completed.
        #[arg(long, conflicts_with = "reopen")]
        complete: bool,
        #[arg(long)]
        reopen: bool,
    },
    Delete {
        id: u64,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("{value} is not YYYY-MM-DD"))
}

fn parse_task_status(value: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(value).ok_or_else(|| format!("{value} is not todo, inprogress or done"))
}

fn deadline_patch(deadline: Option<NaiveDate>, clear: bool) -> Option<Option<NaiveDate>> {
    if clear {
        Some(None)
    } else {
        deadline.map(Some)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    config.ensure_data_dir()?;
    let store = Store::open(&config.db_path)?;
    let flow = FlowSync::new(store);
    info!(db = %config.db_path.display(), "store opened");

    let command = match cli.command {
        None | Some(Command::Tui) => return ui::run(flow),
        Some(command) => command,
    };

    match command {
        Command::Tui => {}
        Command::Register {
            username,
            name,
            password,
            email,
            phone,
        } => {
            let user = flow.register(NewUser {
                username,
                name,
                password,
                email,
                phone,
            })?;
            println!("Welcome, {}! You are logged in as {}.", user.name, user.username);
        }
        Command::Login { username, password } => {
            let user = flow.login(&username, &password)?;
            println!("Logged in as {} ({} pending tasks).", user.username, user.pending_tasks());
        }
        Command::Logout => {
            flow.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => match flow.current_user()? {
            Some(user) => println!("{} ({})", user.username, user.name),
            None => println!("Not logged in."),
        },
        Command::Profile(args) => {
            let user = if args.name.is_none() && args.email.is_none() && args.phone.is_none() {
                flow.require_user()?
            } else {
                flow.update_profile(ProfileUpdate {
                    name: args.name,
                    email: args.email,
                    phone: args.phone,
                })?
            };
            println!("Name:     {}", user.name);
            println!("Username: {}", user.username);
            println!("Email:    {}", user.email);
            println!("Phone:    {}", if user.phone.is_empty() { "-" } else { user.phone.as_str() });
            println!(
                "Joined:   {}",
                user.created_at.with_timezone(&Local).format("%-d %B %Y")
            );
        }
        Command::ForgotPassword { email } => {
            let ticket = flow.request_password_reset(&email)?;
            println!("Reset token for {}: {}", ticket.username, ticket.token);
            println!(
                "Valid until {}.",
                ticket.expires.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
        Command::ResetPassword {
            token,
            username,
            password,
            confirm,
        } => {
            let username = match username {
                Some(username) => {
                    flow.reset_password(&username, &password, &confirm, &token)?;
                    username
                }
                None => flow.reset_password_with_token(&token, &password, &confirm)?.username,
            };
            println!("Password updated for {username}. You can log in now.");
        }
        Command::Task(command) => task_command(&flow, command)?,
        Command::Project(command) => project_command(&flow, command)?,
        Command::Dashboard => {
            let user = flow.require_user()?;
            let now = flow.now_local();
            let d = stats::dashboard(&user, &now);
            println!("{}'s dashboard", user.name);
            println!(
                "To do {} · In progress {} · Done {} · Projects {}",
                d.todo, d.in_progress, d.done, d.total_projects
            );
            println!("Progress: {}%", d.progress);
            if d.due_within_day > 0 {
                println!("{} tasks are close to their deadline!", d.due_within_day);
            }
            if d.due_soon > 0 {
                println!("{} tasks due within 3 days", d.due_soon);
            }
            if d.overdue > 0 {
                println!("{} tasks are past their deadline", d.overdue);
            }
            println!();
            println!("\"{}\"", flowsync::reminders::daily_motivation(&now));
        }
        Command::Report { period, json } => {
            let period = ReportPeriod::parse(&period)
                .ok_or_else(|| FlowError::validation("Period must be week, month or last-month"))?;
            let user = flow.require_user()?;
            let now = flow.now_local();
            let report = stats::report(&user, period, &now);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!(
                "{} ({} – {})",
                period.label(),
                report.start_date.with_timezone(&Local).format("%Y-%m-%d"),
                report.end_date.with_timezone(&Local).format("%Y-%m-%d")
            );
            println!(
                "Tasks {} · done {} · in progress {} · to do {} · completion {}%",
                report.total_tasks,
                report.completed_tasks,
                report.in_progress_tasks,
                report.todo_tasks,
                report.completion_rate
            );
            let weekly = &report.productivity_stats.weekly;
            let monthly = &report.productivity_stats.monthly;
            println!(
                "Weekly score {}% ({}/{}) · monthly score {}% ({}/{})",
                weekly.productivity_score,
                weekly.tasks_completed,
                weekly.tasks_created,
                monthly.productivity_score,
                monthly.tasks_completed,
                monthly.tasks_created
            );
            for task in &report.recently_completed {
                println!("  ✓ {}", task.title);
            }
        }
        Command::Remind => {
            let user = flow.require_user()?;
            let now = flow.now_local();
            let checks = [Check::Deadlines, Check::Productivity, Check::DailyStandup];
            let notes = run_checks(&checks, &user.tasks, &now);
            if notes.is_empty() {
                println!("Nothing to remind you about.");
            }
            for note in notes {
                println!("{}: {}", note.title, note.body);
            }
        }
        Command::Activity => {
            let user = flow.require_user()?;
            let now = flow.now();
            for activity in &user.activities {
                println!("{:<14} {}", format_relative(activity.timestamp, now), activity.title);
            }
        }
        Command::Theme { action } => {
            let theme = match action.as_deref() {
                None => Theme::load(flow.store())?,
                Some("toggle") => Theme::toggle(flow.store())?,
                Some(other) => {
                    return Err(FlowError::validation(format!("Unknown theme action: {other}")).into())
                }
            };
            println!("Theme: {theme}");
        }
        Command::Sync => {
            let record = sync::sync(&flow)?;
            println!(
                "Synced {} tasks and {} projects from device {}.",
                record.tasks, record.projects, record.device_id
            );
        }
        Command::Demo => {
            let added = seed_demo(flow.store(), flow.now())?;
            println!("{added} demo accounts added. Log in with admin/admin.");
        }
    }
    Ok(())
}

fn task_command(flow: &FlowSync, command: TaskCommand) -> Result<(), Box<dyn Error>> {
    match command {
        TaskCommand::Add {
            title,
            description,
            deadline,
            status,
        } => {
            let task = flow.create_task(NewTask {
                title,
                description,
                deadline,
                status,
            })?;
            println!("Added task #{}: {}", task.id, task.title);
        }
        TaskCommand::List { filter } => {
            let filter = TaskFilter::parse(&filter)
                .ok_or_else(|| FlowError::validation("Filter must be all, todo, inprogress or done"))?;
            let now = flow.now_local();
            for task in flow.tasks(filter)? {
                println!(
                    "#{:<4} [{:<11}] {}  ({})",
                    task.id,
                    status_label(task.status),
                    task.title,
                    deadline_label(task.deadline, &now)
                );
            }
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            deadline,
            clear_deadline,
            status,
        } => {
            let task = flow.update_task(
                id,
                TaskPatch {
                    title,
                    description,
                    deadline: deadline_patch(deadline, clear_deadline),
                    status,
                },
            )?;
            println!("Updated task #{}: {}", task.id, task.title);
        }
        TaskCommand::Status { id, status } => {
            let task = flow.change_status(id, status)?;
            println!("#{} is now {}", task.id, status_label(task.status));
        }
        TaskCommand::Delete { id } => {
            let task = flow.delete_task(id)?;
            println!("Deleted task #{}: {}", task.id, task.title);
        }
    }
    Ok(())
}

fn project_command(flow: &FlowSync, command: ProjectCommand) -> Result<(), Box<dyn Error>> {
    match command {
        ProjectCommand::Add {
            title,
            description,
            deadline,
        } => {
            let project = flow.create_project(NewProject {
                title,
                description,
                deadline,
            })?;
            println!("Added project #{}: {}", project.id, project.title);
        }
        ProjectCommand::List => {
            let now = flow.now_local();
            for project in flow.projects()? {
                let status = match project.status {
                    ProjectStatus::Active => "active",
                    ProjectStatus::Completed => "completed",
                };
                println!(
                    "#{:<4} [{:<9}] {}  ({})",
                    project.id,
                    status,
                    project.title,
                    deadline_label(project.deadline, &now)
                );
            }
        }
        ProjectCommand::Edit {
            id,
            title,
            description,
            deadline,
            clear_deadline,
            complete,
            reopen,
        } => {
            let status = match (complete, reopen) {
                (true, _) => Some(ProjectStatus::Completed),
                (_, true) => Some(ProjectStatus::Active),
                _ => None,
            };
            let project = flow.update_project(
                id,
                ProjectPatch {
                    title,
                    description,
                    deadline: deadline_patch(deadline, clear_deadline),
                    status,
                },
            )?;
            println!("Updated project #{}: {}", project.id, project.title);
        }
        ProjectCommand::Delete { id } => {
            let project = flow.delete_project(id)?;
            println!("Deleted project #{}: {}", project.id, project.title);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_tui() {
        let cli = Cli::try_parse_from(["flowsync"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_task_edit_clears_deadline() {
        let cli =
            Cli::try_parse_from(["flowsync", "task", "edit", "3", "--clear-deadline"]).unwrap();
        match cli.command {
            Some(Command::Task(TaskCommand::Edit {
                id,
                deadline,
                clear_deadline,
                ..
            })) => {
                assert_eq!(id, 3);
                assert_eq!(deadline_patch(deadline, clear_deadline), Some(None));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reset_password_takes_token_alone() {
        let cli = Cli::try_parse_from([
            "flowsync",
            "reset-password",
            "--token",
            "abc123",
            "newpass1",
            "newpass1",
        ])
        .unwrap();
        match cli.command {
            Some(Command::ResetPassword {
                token, username, ..
            }) => {
                assert_eq!(token, "abc123");
                assert!(username.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["flowsync", "reset-password", "newpass1", "newpass1"]).is_err());
    }

    #[test]
    fn test_bad_status_rejected() {
        assert!(Cli::try_parse_from(["flowsync", "task", "status", "1", "later"]).is_err());
    }
}
