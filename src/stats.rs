use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::model::{PeriodStats, ProductivityStats, Task, TaskStatus, User};
use crate::reminders;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAction {
    Created,
    Completed,
}

/// `completed / max(created, 1)` as a rounded percentage.
pub fn productivity_score(completed: u32, created: u32) -> u32 {
    percentage(completed as usize, created.max(1) as usize)
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn bump(period: &mut PeriodStats, action: StatAction) {
    match action {
        StatAction::Created => period.tasks_created += 1,
        StatAction::Completed => period.tasks_completed += 1,
    }
    period.productivity_score = productivity_score(period.tasks_completed, period.tasks_created);
}

/// Counts a task event in the weekly and monthly rollups, starting fresh
/// counters when the week or month has turned over.
pub fn record(stats: &mut ProductivityStats, action: StatAction, now: DateTime<Utc>) {
    let iso = now.iso_week();
    let week = (iso.year(), iso.week());
    let month = (now.year(), now.month());

    if stats.week.map_or(false, |w| w != week) {
        stats.weekly = PeriodStats::default();
    }
    if stats.month.map_or(false, |m| m != month) {
        stats.monthly = PeriodStats::default();
    }
    stats.week = Some(week);
    stats.month = Some(month);

    bump(&mut stats.weekly, action);
    bump(&mut stats.monthly, action);
    stats.last_updated = now;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportPeriod {
    Week,
    Month,
    LastMonth,
}

impl ReportPeriod {
    pub fn parse(value: &str) -> Option<ReportPeriod> {
        match value.trim().to_lowercase().as_str() {
            "week" => Some(ReportPeriod::Week),
            "month" => Some(ReportPeriod::Month),
            "last-month" | "lastmonth" | "last_month" => Some(ReportPeriod::LastMonth),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Week => "Last 7 days",
            ReportPeriod::Month => "This month",
            ReportPeriod::LastMonth => "Last month",
        }
    }

    pub fn next(&self) -> ReportPeriod {
        match self {
            ReportPeriod::Week => ReportPeriod::Month,
            ReportPeriod::Month => ReportPeriod::LastMonth,
            ReportPeriod::LastMonth => ReportPeriod::Week,
        }
    }

    /// Inclusive start, exclusive end.
    pub fn range<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
        let utc_now = now.with_timezone(&Utc);
        let tz = now.timezone();
        let today = now.date_naive();
        let this_month = first_of_month(today.year(), today.month());

        match self {
            ReportPeriod::Week => (utc_now - Duration::days(7), utc_now + Duration::milliseconds(1)),
            ReportPeriod::Month => {
                let next = shift_month(this_month, 1);
                (local_midnight(this_month, &tz), local_midnight(next, &tz))
            }
            ReportPeriod::LastMonth => {
                let previous = shift_month(this_month, -1);
                (local_midnight(previous, &tz), local_midnight(this_month, &tz))
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn shift_month(first: NaiveDate, delta: i32) -> NaiveDate {
    let index = first.year() * 12 + first.month0() as i32 + delta;
    first_of_month(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    reminders::deadline_instant(date, tz)
        .unwrap_or_else(|| Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN)))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityReport {
    pub period: ReportPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub todo_tasks: usize,
    pub completion_rate: u32,
    pub recently_completed: Vec<Task>,
    pub productivity_stats: ProductivityStats,
}

pub fn report<Tz: TimeZone>(user: &User, period: ReportPeriod, now: &DateTime<Tz>) -> ProductivityReport {
    let (start, end) = period.range(now);
    let in_period: Vec<&Task> = user
        .tasks
        .iter()
        .filter(|t| t.created_at >= start && t.created_at < end)
        .collect();
    let count = |status: TaskStatus| in_period.iter().filter(|t| t.status == status).count();

    let mut completed: Vec<Task> = in_period
        .iter()
        .filter(|t| t.is_done())
        .map(|t| (*t).clone())
        .collect();
    completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    let completed_count = completed.len();
    completed.truncate(5);

    ProductivityReport {
        period,
        start_date: start,
        end_date: end,
        total_tasks: in_period.len(),
        completed_tasks: completed_count,
        in_progress_tasks: count(TaskStatus::InProgress),
        todo_tasks: count(TaskStatus::Todo),
        completion_rate: percentage(completed_count, in_period.len()),
        recently_completed: completed,
        productivity_stats: user.productivity_stats.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub total_tasks: usize,
    pub total_projects: usize,
    pub progress: u32,
    pub due_within_day: usize,
    pub due_soon: usize,
    pub overdue: usize,
}

pub fn dashboard<Tz: TimeZone>(user: &User, now: &DateTime<Tz>) -> Dashboard {
    let count = |status: TaskStatus| user.tasks.iter().filter(|t| t.status == status).count();
    let done = count(TaskStatus::Done);

    Dashboard {
        todo: count(TaskStatus::Todo),
        in_progress: count(TaskStatus::InProgress),
        done,
        total_tasks: user.tasks.len(),
        total_projects: user.projects.len(),
        progress: percentage(done, user.tasks.len()),
        due_within_day: reminders::due_within_day(&user.tasks, now).len(),
        due_soon: reminders::due_within_three_days(&user.tasks, now).len(),
        overdue: reminders::overdue(&user.tasks, now).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn task(id: u64, created: DateTime<Utc>, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            deadline: None,
            status,
            created_at: created,
            completed_at: if status == TaskStatus::Done { Some(created + Duration::hours(id as i64)) } else { None },
        }
    }

    fn user_with(tasks: Vec<Task>) -> User {
        User {
            id: 1,
            username: "ana".into(),
            password: "secret".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: String::new(),
            tasks,
            projects: vec![],
            activities: vec![],
            productivity_stats: ProductivityStats::new(at(2025, 12, 1)),
            created_at: at(2025, 12, 1),
        }
    }

    #[test]
    fn test_productivity_score() {
        assert_eq!(productivity_score(0, 0), 0);
        assert_eq!(productivity_score(3, 8), 38);
        assert_eq!(productivity_score(8, 15), 53);
        assert_eq!(productivity_score(2, 0), 200);
    }

    #[test]
    fn test_record_updates_both_rollups() {
        let now = at(2025, 12, 10);
        let mut stats = ProductivityStats::new(now);
        record(&mut stats, StatAction::Created, now);
        record(&mut stats, StatAction::Created, now);
        record(&mut stats, StatAction::Completed, now);

        assert_eq!(stats.weekly.tasks_created, 2);
        assert_eq!(stats.weekly.tasks_completed, 1);
        assert_eq!(stats.weekly.productivity_score, 50);
        assert_eq!(stats.monthly, stats.weekly);
    }

    #[test]
    fn test_record_rolls_over_week_but_not_month() {
        let mut stats = ProductivityStats::new(at(2025, 12, 10));
        record(&mut stats, StatAction::Created, at(2025, 12, 10));
        record(&mut stats, StatAction::Completed, at(2025, 12, 17));

        assert_eq!(stats.weekly.tasks_created, 0);
        assert_eq!(stats.weekly.tasks_completed, 1);
        assert_eq!(stats.weekly.productivity_score, 100);
        assert_eq!(stats.monthly.tasks_created, 1);
        assert_eq!(stats.monthly.tasks_completed, 1);
    }

    #[test]
    fn test_month_ranges() {
        let now = at(2026, 1, 15);
        let (start, end) = ReportPeriod::LastMonth.range(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let (start, end) = ReportPeriod::Month.range(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_report_counts_period_tasks() {
        let now = at(2025, 12, 20);
        let user = user_with(vec![
            task(1, at(2025, 12, 15), TaskStatus::Done),
            task(2, at(2025, 12, 16), TaskStatus::Done),
            task(3, at(2025, 12, 18), TaskStatus::InProgress),
            task(4, at(2025, 12, 19), TaskStatus::Todo),
            task(5, at(2025, 11, 2), TaskStatus::Done),
        ]);

        let week = report(&user, ReportPeriod::Week, &now);
        assert_eq!(week.total_tasks, 4);
        assert_eq!(week.completed_tasks, 2);
        assert_eq!(week.in_progress_tasks, 1);
        assert_eq!(week.todo_tasks, 1);
        assert_eq!(week.completion_rate, 50);
        let recent: Vec<u64> = week.recently_completed.iter().map(|t| t.id).collect();
        assert_eq!(recent, vec![2, 1]);

        let last_month = report(&user, ReportPeriod::LastMonth, &now);
        assert_eq!(last_month.total_tasks, 1);
        assert_eq!(last_month.completion_rate, 100);
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let user = user_with(vec![]);
        let r = report(&user, ReportPeriod::Month, &at(2025, 12, 20));
        assert_eq!(r.total_tasks, 0);
        assert_eq!(r.completion_rate, 0);
    }

    #[test]
    fn test_dashboard_progress() {
        let now = at(2025, 12, 20);
        let user = user_with(vec![
            task(1, now, TaskStatus::Done),
            task(2, now, TaskStatus::Todo),
            task(3, now, TaskStatus::InProgress),
        ]);
        let d = dashboard(&user, &now);
        assert_eq!((d.todo, d.in_progress, d.done), (1, 1, 1));
        assert_eq!(d.progress, 33);
        assert_eq!(d.overdue, 0);
    }
}
