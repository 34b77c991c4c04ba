use chrono::{DateTime, Local};
use ratatui::{
    backend::Backend,
    prelude::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{App, ToastLevel, View};
use super::form::Form;
use crate::activity::{format_relative, DASHBOARD_ACTIVITIES};
use crate::model::{PeriodStats, Task, TaskStatus};
use crate::reminders::{self, deadline_label, status_label};
use crate::stats;
use crate::theme::Theme;

struct Palette {
    text: Color,
    muted: Color,
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            text: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        },
        Theme::Dark => Palette {
            text: Color::White,
            muted: Color::Gray,
            accent: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
        },
    }
}

fn status_color(p: &Palette, status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => p.muted,
        TaskStatus::InProgress => p.warning,
        TaskStatus::Done => p.success,
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
}

pub fn draw<B: Backend>(frame: &mut Frame<B>, app: &mut App) {
    let p = palette(app.theme);
    let size = frame.size();

    if app.user.is_none() {
        draw_auth(frame, app, &p, size);
        draw_toasts(frame, app, &p, size);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(size);

    draw_tabs(frame, app, &p, chunks[0]);
    let now = app.flow.now_local();
    match app.view {
        View::Dashboard => draw_dashboard(frame, app, &p, &now, chunks[1]),
        View::Tasks => draw_tasks(frame, app, &p, &now, chunks[1]),
        View::Projects => draw_projects(frame, app, &p, &now, chunks[1]),
        View::Kanban => draw_kanban(frame, app, &p, &now, chunks[1]),
        View::Report => draw_report(frame, app, &p, &now, chunks[1]),
        View::Profile => draw_profile(frame, app, &p, &now, chunks[1]),
    }
    draw_help(frame, app, &p, chunks[2]);

    if let Some(form) = &app.form {
        draw_form(frame, form, &p, centered(60, 50, size));
    }
    draw_toasts(frame, app, &p, size);
}

fn draw_tabs<B: Backend>(frame: &mut Frame<B>, app: &App, p: &Palette, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
        .collect();
    let selected = View::ALL.iter().position(|v| *v == app.view).unwrap_or(0);
    let name = app.user.as_ref().map_or("", |u| u.name.as_str());
    let header = format!(" FlowSync · {} · {} ", name, app.theme);

    let tabs = Tabs::new(titles)
        .block(panel(&header))
        .style(Style::default().fg(p.text))
        .highlight_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
        .select(selected);
    frame.render_widget(tabs, area);
}

fn draw_help<B: Backend>(frame: &mut Frame<B>, app: &App, p: &Palette, area: Rect) {
    let keys = match app.view {
        View::Tasks => "n new · e edit · D delete · space next status · f filter",
        View::Projects => "n new · D delete",
        View::Kanban => "h/l column · j/k row · H/L move task · n new · e edit · D delete",
        View::Report => "p period",
        View::Profile => "e edit",
        View::Dashboard => "n new task",
    };
    let line = Line::from(vec![
        Span::styled(keys, Style::default().fg(p.muted)),
        Span::styled(
            "  |  1-6/tab view · T theme · S sync · x dismiss · O logout · q quit",
            Style::default().fg(p.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn task_line(task: &Task, p: &Palette, now: &DateTime<Local>) -> Line<'static> {
    let overdue = reminders::hours_until(task, now).map_or(false, |h| h <= 0);
    let mut spans = vec![
        Span::styled(
            format!("[{:<11}] ", status_label(task.status)),
            Style::default().fg(status_color(p, task.status)),
        ),
        Span::styled(task.title.clone(), Style::default().fg(p.text)),
    ];
    if task.deadline.is_some() {
        let style = if overdue {
            Style::default().fg(p.danger)
        } else {
            Style::default().fg(p.muted)
        };
        let mut label = format!("  ({})", deadline_label(task.deadline, now));
        if overdue {
            label.push_str(" late");
        }
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

fn draw_dashboard<B: Backend>(
    frame: &mut Frame<B>,
    app: &App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let Some(user) = &app.user else {
        return;
    };
    let summary = stats::dashboard(user, now);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Min(6),
            ]
            .as_ref(),
        )
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(rows[0]);

    let counts = vec![
        Line::from(format!("To do: {}", summary.todo)),
        Line::from(format!("In progress: {}", summary.in_progress)),
        Line::from(format!("Done: {}", summary.done)),
        Line::from(format!(
            "Tasks: {} · Projects: {}",
            summary.total_tasks, summary.total_projects
        )),
    ];
    frame.render_widget(
        Paragraph::new(counts)
            .style(Style::default().fg(p.text))
            .block(panel("Overview")),
        top[0],
    );

    let mut warnings = vec![];
    if summary.due_within_day > 0 {
        warnings.push(Line::from(Span::styled(
            format!("{} tasks are close to their deadline!", summary.due_within_day),
            Style::default().fg(p.warning),
        )));
    }
    if summary.due_soon > 0 {
        warnings.push(Line::from(Span::styled(
            format!("{} tasks due within 3 days", summary.due_soon),
            Style::default().fg(p.warning),
        )));
    }
    if summary.overdue > 0 {
        warnings.push(Line::from(Span::styled(
            format!("{} tasks are past their deadline", summary.overdue),
            Style::default().fg(p.danger),
        )));
    }
    if warnings.is_empty() {
        warnings.push(Line::from("Nothing urgent.".fg(p.success)));
    }
    frame.render_widget(
        Paragraph::new(warnings).block(panel("Deadlines")),
        top[1],
    );

    frame.render_widget(
        Gauge::default()
            .block(panel("Progress"))
            .gauge_style(Style::default().fg(p.accent))
            .percent(summary.progress.min(100) as u16),
        rows[1],
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ]
            .as_ref(),
        )
        .split(rows[2]);

    let mut recent: Vec<Line> = user.tasks.iter().take(5).map(|t| task_line(t, p, now)).collect();
    if recent.is_empty() {
        recent.push(Line::from("No tasks yet".fg(p.muted)));
    }
    recent.push(Line::from(""));
    recent.push(Line::from(Span::styled(
        format!("\"{}\"", reminders::daily_motivation(now)),
        Style::default().fg(p.muted).add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(
        Paragraph::new(recent)
            .wrap(Wrap { trim: true })
            .block(panel("Recent tasks")),
        bottom[0],
    );

    let mut projects: Vec<Line> = user
        .projects
        .iter()
        .take(5)
        .map(|project| {
            Line::from(vec![
                Span::styled(project.title.as_str(), Style::default().fg(p.text)),
                Span::styled(
                    match project.deadline {
                        Some(d) => format!("  ({})", deadline_label(Some(d), now)),
                        None => "  (no deadline)".to_string(),
                    },
                    Style::default().fg(p.muted),
                ),
            ])
        })
        .collect();
    if projects.is_empty() {
        projects.push(Line::from("No projects yet".fg(p.muted)));
    }
    frame.render_widget(
        Paragraph::new(projects)
            .wrap(Wrap { trim: true })
            .block(panel("Projects")),
        bottom[1],
    );

    let utc_now = app.flow.now();
    let mut activities: Vec<Line> = user
        .activities
        .iter()
        .take(DASHBOARD_ACTIVITIES)
        .map(|a| {
            Line::from(vec![
                Span::styled(a.title.as_str(), Style::default().fg(p.text)),
                Span::styled(
                    format!("  {}", format_relative(a.timestamp, utc_now)),
                    Style::default().fg(p.muted),
                ),
            ])
        })
        .collect();
    if activities.is_empty() {
        activities.push(Line::from("No activity yet".fg(p.muted)));
    }
    frame.render_widget(
        Paragraph::new(activities)
            .wrap(Wrap { trim: true })
            .block(panel("Activity")),
        bottom[2],
    );
}

fn draw_tasks<B: Backend>(
    frame: &mut Frame<B>,
    app: &mut App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let items: Vec<ListItem> = app
        .visible_tasks()
        .into_iter()
        .map(|t| ListItem::new(task_line(t, p, now)))
        .collect();
    let empty = items.is_empty();
    let title = format!("Tasks · filter: {}", app.task_filter.label());

    let list = List::new(items)
        .block(panel(&title))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">>");
    frame.render_stateful_widget(list, area, &mut app.task_list);

    if empty {
        frame.render_widget(
            Paragraph::new("No tasks here. Press n to add one.")
                .style(Style::default().fg(p.muted))
                .alignment(Alignment::Center),
            centered(80, 20, area),
        );
    }
}

fn draw_projects<B: Backend>(
    frame: &mut Frame<B>,
    app: &mut App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let items: Vec<ListItem> = app
        .user
        .as_ref()
        .map(|u| u.projects.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|project| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(project.title.clone(), Style::default().fg(p.text).add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  [{:?}]", project.status).to_lowercase(),
                        Style::default().fg(p.muted),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "   {}  · deadline: {}",
                        project.description,
                        deadline_label(project.deadline, now)
                    ),
                    Style::default().fg(p.muted),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(panel("Projects"))
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">>");
    frame.render_stateful_widget(list, area, &mut app.project_list);
}

fn draw_kanban<B: Backend>(
    frame: &mut Frame<B>,
    app: &App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ]
            .as_ref(),
        )
        .split(area);

    for (i, status) in TaskStatus::ALL.iter().enumerate() {
        let tasks = app.column_tasks(*status);
        let title = format!("{} ({})", status_label(*status), tasks.len());
        let items: Vec<ListItem> = tasks
            .iter()
            .enumerate()
            .map(|(row, t)| {
                let selected = i == app.kanban_column && row == app.kanban_row;
                let style = if selected {
                    Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(p.text)
                };
                let mut lines = vec![Line::from(Span::styled(t.title.clone(), style))];
                if t.deadline.is_some() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", deadline_label(t.deadline, now)),
                        Style::default().fg(p.muted),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let border = if i == app.kanban_column {
            Style::default().fg(p.accent)
        } else {
            Style::default().fg(status_color(p, *status))
        };
        frame.render_widget(
            List::new(items).block(panel(&title).border_style(border)),
            columns[i],
        );
    }
}

fn stats_line(label: &str, s: &PeriodStats) -> Line<'static> {
    Line::from(format!(
        "{}: {} created · {} completed · score {}%",
        label, s.tasks_created, s.tasks_completed, s.productivity_score
    ))
}

fn draw_report<B: Backend>(
    frame: &mut Frame<B>,
    app: &App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let Some(user) = &app.user else {
        return;
    };
    let report = stats::report(user, app.report_period, now);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(8),
                Constraint::Length(3),
                Constraint::Min(3),
            ]
            .as_ref(),
        )
        .split(area);

    let period = format!(
        "{}: {} – {}",
        app.report_period.label(),
        report.start_date.with_timezone(&Local).format("%Y-%m-%d"),
        report.end_date.with_timezone(&Local).format("%Y-%m-%d"),
    );
    let lines = vec![
        Line::from(Span::styled(period, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!(
            "Tasks: {} · done {} · in progress {} · to do {}",
            report.total_tasks, report.completed_tasks, report.in_progress_tasks, report.todo_tasks
        )),
        Line::from(""),
        stats_line("Weekly", &report.productivity_stats.weekly),
        stats_line("Monthly", &report.productivity_stats.monthly),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(p.text))
            .block(panel("Productivity report")),
        rows[0],
    );

    frame.render_widget(
        Gauge::default()
            .block(panel("Completion rate"))
            .gauge_style(Style::default().fg(p.success))
            .percent(report.completion_rate.min(100) as u16),
        rows[1],
    );

    let utc_now = app.flow.now();
    let items: Vec<ListItem> = report
        .recently_completed
        .iter()
        .map(|t| {
            let when = t
                .completed_at
                .map(|at| format_relative(at, utc_now))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(t.title.clone(), Style::default().fg(p.text)),
                Span::styled(format!("  {}", when), Style::default().fg(p.muted)),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(panel("Recently completed")), rows[2]);
}

fn draw_profile<B: Backend>(
    frame: &mut Frame<B>,
    app: &App,
    p: &Palette,
    now: &DateTime<Local>,
    area: Rect,
) {
    let Some(user) = &app.user else {
        return;
    };
    let sync = match &app.last_sync {
        Some(record) => format!(
            "{} ({} tasks, {} projects)",
            format_relative(record.synced_at, app.flow.now()),
            record.tasks,
            record.projects
        ),
        None => "never".to_string(),
    };
    let lines = vec![
        Line::from(Span::styled(
            user.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("@{}", user.username)),
        Line::from(""),
        Line::from(format!("Email: {}", user.email)),
        Line::from(format!(
            "Phone: {}",
            if user.phone.is_empty() { "-" } else { user.phone.as_str() }
        )),
        Line::from(format!(
            "Member since: {}",
            user.created_at.with_timezone(&Local).format("%-d %B %Y")
        )),
        Line::from(format!("Pending tasks: {}", user.pending_tasks())),
        Line::from(""),
        Line::from(format!("Theme: {}", app.theme)),
        Line::from(format!(
            "Device: {}",
            app.device_id.as_deref().unwrap_or("-")
        )),
        Line::from(format!("Last sync: {}", sync)),
        Line::from(format!("Today: {}", now.format("%A %-d %B %Y"))),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(p.text))
            .block(panel("Profile")),
        area,
    );
}

fn draw_auth<B: Backend>(frame: &mut Frame<B>, app: &App, p: &Palette, size: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(5),
            ]
            .as_ref(),
        )
        .split(size);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from("FlowSync".bold().fg(p.accent)),
            Line::from("Tasks, projects and reminders".fg(p.muted)),
        ])
        .alignment(Alignment::Center),
        chunks[0],
    );

    if let Some(form) = &app.form {
        draw_form(frame, form, p, centered(60, 90, chunks[1]));
    }

    let text = vec![
        Line::from("(F1) Login · (F2) Register · (F3) Forgot password · (F5) Reset token"),
        Line::from("(F4) Demo account".green().italic()),
        Line::from("(Esc) Back / quit".red()),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(p.text))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_form<B: Backend>(frame: &mut Frame<B>, form: &Form, p: &Palette, area: Rect) {
    frame.render_widget(Clear, area);
    let block = panel(form.title()).border_style(Style::default().fg(p.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let constraints: Vec<Constraint> = form
        .fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(inner);

    for (i, field) in form.fields.iter().enumerate() {
        let shown = if field.secret {
            "*".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let focused = i == form.focus;
        let style = if focused {
            Style::default().fg(p.accent)
        } else {
            Style::default().fg(p.muted)
        };
        let value = if focused { format!("{}_", shown) } else { shown };
        frame.render_widget(
            Paragraph::new(value)
                .style(Style::default().fg(p.text))
                .block(panel(field.label).border_style(style)),
            rows[i],
        );
    }
}

fn draw_toasts<B: Backend>(frame: &mut Frame<B>, app: &App, p: &Palette, size: Rect) {
    let width = size.width.min(60);
    for (i, toast) in app.toasts.iter().rev().take(4).enumerate() {
        let y = size.y + 1 + (i as u16) * 3;
        if y + 3 > size.bottom() {
            break;
        }
        let area = Rect::new(size.right().saturating_sub(width + 1), y, width, 3);
        let color = match toast.level {
            ToastLevel::Info => p.accent,
            ToastLevel::Success => p.success,
            ToastLevel::Warning => p.warning,
            ToastLevel::Error => p.danger,
        };
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(toast.message.as_str())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(color)),
                ),
            area,
        );
    }
}

fn centered(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
