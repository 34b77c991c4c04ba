//! Deadline and productivity notification rules.
//!
//! Everything here is a pure function of the task list and a clock reading so
//! the scheduler, the dashboard and the CLI all agree on what is due. Hours of
//! the day and weekdays are read in the time zone of the `now` passed in.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};

use crate::model::{Task, TaskStatus};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    DeadlineSoon,
    DeadlinePassed,
    Morning,
    Break,
    Evaluation,
    Evening,
    Stale,
    HighPriority,
    Standup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Stays until dismissed.
    pub interactive: bool,
    pub silent: bool,
}

impl Notification {
    fn new(kind: NotificationKind, title: &str, body: String) -> Self {
        Notification {
            kind,
            title: title.to_string(),
            body,
            interactive: false,
            silent: true,
        }
    }
}

/// Local midnight at the start of `date`. Where a clock change skips
/// midnight, the first whole hour that exists on that day.
pub fn deadline_instant<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    (0..24).find_map(|hour| {
        tz.from_local_datetime(&date.and_hms_opt(hour, 0, 0)?)
            .earliest()
            .map(|d| d.with_timezone(&Utc))
    })
}

fn ceil_div(value: i64, unit: i64) -> i64 {
    value.div_euclid(unit) + i64::from(value.rem_euclid(unit) != 0)
}

fn millis_until<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<i64> {
    if task.is_done() {
        return None;
    }
    let deadline = deadline_instant(task.deadline?, &now.timezone())?;
    Some((deadline - now.with_timezone(&Utc)).num_milliseconds())
}

/// Whole hours until the deadline, rounded up; `None` for done or undated tasks.
pub fn hours_until<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<i64> {
    millis_until(task, now).map(|ms| ceil_div(ms, HOUR_MS))
}

pub fn days_until<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<i64> {
    millis_until(task, now).map(|ms| ceil_div(ms, DAY_MS))
}

#[derive(Debug, Default)]
pub struct DeadlineAlerts<'a> {
    pub upcoming: Vec<(&'a Task, i64)>,
    pub overdue: Vec<&'a Task>,
}

impl DeadlineAlerts<'_> {
    pub fn notifications(&self) -> Vec<Notification> {
        let mut out = Vec::new();
        for (task, hours) in &self.upcoming {
            let mut n = Notification::new(
                NotificationKind::DeadlineSoon,
                "Deadline approaching",
                format!("\"{}\" is due in {} h", task.title, hours),
            );
            n.interactive = *hours <= 3;
            n.silent = *hours > 12;
            out.push(n);
        }
        for task in &self.overdue {
            let mut n = Notification::new(
                NotificationKind::DeadlinePassed,
                "Deadline missed",
                format!("\"{}\" is past its deadline", task.title),
            );
            n.interactive = true;
            n.silent = false;
            out.push(n);
        }
        out
    }
}

/// Upcoming within 24 h, or already past.
pub fn deadline_alerts<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> DeadlineAlerts<'a> {
    let mut alerts = DeadlineAlerts::default();
    for task in tasks {
        match hours_until(task, now) {
            Some(hours) if hours > 0 && hours <= 24 => alerts.upcoming.push((task, hours)),
            Some(hours) if hours <= 0 => alerts.overdue.push(task),
            _ => {}
        }
    }
    alerts
}

/// Dashboard warning: due today or tomorrow by whole days.
pub fn due_within_day<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| matches!(days_until(t, now), Some(d) if (0..=1).contains(&d)))
        .collect()
}

pub fn due_within_three_days<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| matches!(days_until(t, now), Some(d) if d > 0 && d <= 3))
        .collect()
}

pub fn overdue<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| matches!(millis_until(t, now), Some(ms) if ms < 0))
        .collect()
}

fn is_weekend<Tz: TimeZone>(now: &DateTime<Tz>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

fn completed_on_day<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> usize {
    let today = now.date_naive();
    let tz = now.timezone();
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .filter_map(|t| t.completed_at)
        .filter(|at| at.with_timezone(&tz).date_naive() == today)
        .count()
}

/// Time-of-day nudges for working days.
pub fn productivity_nudges<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Vec<Notification> {
    if is_weekend(now) {
        return Vec::new();
    }
    let hour = now.hour();
    let pending = tasks.iter().filter(|t| !t.is_done()).count();
    let mut out = Vec::new();

    if (8..=10).contains(&hour) && pending > 0 {
        out.push(Notification::new(
            NotificationKind::Morning,
            "Good morning",
            format!("You have {} unfinished tasks. Let's get started!", pending),
        ));
    }
    if (12..=14).contains(&hour) {
        out.push(Notification::new(
            NotificationKind::Break,
            "Time for a break",
            "Step away for a moment and don't forget lunch.".to_string(),
        ));
    }
    if (16..=18).contains(&hour) {
        out.push(Notification::new(
            NotificationKind::Evaluation,
            "Daily review",
            format!("You finished {} tasks today. Keep it up!", completed_on_day(tasks, now)),
        ));
    }
    if (20..=22).contains(&hour) && pending > 0 {
        out.push(Notification::new(
            NotificationKind::Evening,
            "Evening wind-down",
            format!("{} tasks are still open. Remember to rest.", pending),
        ));
    }

    let utc_now = now.with_timezone(&Utc);
    let stale = tasks
        .iter()
        .filter(|t| !t.is_done() && (utc_now - t.created_at).num_days() >= 3)
        .count();
    if stale > 0 {
        out.push(Notification::new(
            NotificationKind::Stale,
            "Pending tasks",
            format!("{} tasks have not been touched in 3 days.", stale),
        ));
    }

    let horizon = utc_now + Duration::days(2);
    let tz = now.timezone();
    let urgent = tasks
        .iter()
        .filter(|t| !t.is_done())
        .filter_map(|t| deadline_instant(t.deadline?, &tz))
        .filter(|deadline| *deadline <= horizon)
        .count();
    if urgent > 0 && (9..=17).contains(&hour) {
        let mut n = Notification::new(
            NotificationKind::HighPriority,
            "High priority",
            format!("{} tasks with close deadlines need attention!", urgent),
        );
        n.interactive = urgent >= 3;
        n.silent = false;
        out.push(n);
    }

    out
}

pub fn daily_standup<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Option<Notification> {
    if is_weekend(now) {
        return None;
    }
    let pending = tasks.iter().filter(|t| !t.is_done()).count();
    if pending == 0 {
        return None;
    }
    let mut n = Notification::new(
        NotificationKind::Standup,
        "Daily standup",
        format!("You have {} unfinished tasks. What will you work on today?", pending),
    );
    n.interactive = true;
    n.silent = false;
    Some(n)
}

pub fn deadline_label<Tz: TimeZone>(deadline: Option<NaiveDate>, now: &DateTime<Tz>) -> String {
    let Some(date) = deadline else {
        return "-".to_string();
    };
    let days = deadline_instant(date, &now.timezone())
        .map(|d| ceil_div((d - now.with_timezone(&Utc)).num_milliseconds(), DAY_MS));

    match days {
        Some(0) => "Today".to_string(),
        Some(1) => "Tomorrow".to_string(),
        Some(-1) => "Yesterday".to_string(),
        Some(d) if d < 0 => format!("{} days ago", -d),
        _ => date.format("%-d %B %Y").to_string(),
    }
}

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "To do",
        TaskStatus::InProgress => "In progress",
        TaskStatus::Done => "Done",
    }
}

const MOTIVATIONS: [&str; 10] = [
    "Productivity is not about doing more, it is about doing what matters.",
    "Start small. Consistency is the key to success.",
    "Don't wait for perfect to begin. Start, then improve.",
    "Time is your most valuable asset. Spend it wisely.",
    "Every finished task is a step toward the goal.",
    "One task at a time. Multitasking costs quality.",
    "Enough rest is part of being productive.",
    "Celebrate small wins, they add up to big ones.",
    "Today's discipline decides tomorrow's success.",
    "Quality beats quantity. Do your best on each task.",
];

pub fn daily_motivation<Tz: TimeZone>(now: &DateTime<Tz>) -> &'static str {
    MOTIVATIONS[now.ordinal0() as usize % MOTIVATIONS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn task(id: u64, deadline: Option<(i32, u32, u32)>, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            deadline: deadline.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            status,
            created_at: at(2025, 12, 25, 10),
            completed_at: None,
        }
    }

    #[test]
    fn test_hours_until_rounds_up() {
        // Friday 2025-12-26 13:00, deadline Saturday 00:00 -> 11 h.
        let now = at(2025, 12, 26, 13);
        let t = task(1, Some((2025, 12, 27)), TaskStatus::Todo);
        assert_eq!(hours_until(&t, &now), Some(11));

        let later = Utc.with_ymd_and_hms(2025, 12, 27, 1, 30, 0).unwrap();
        assert_eq!(hours_until(&t, &later), Some(-1));
    }

    #[test]
    fn test_done_and_undated_tasks_never_alert() {
        let now = at(2025, 12, 26, 13);
        let tasks = vec![
            task(1, Some((2025, 12, 20)), TaskStatus::Done),
            task(2, None, TaskStatus::Todo),
        ];
        let alerts = deadline_alerts(&tasks, &now);
        assert!(alerts.upcoming.is_empty());
        assert!(alerts.overdue.is_empty());
    }

    #[test]
    fn test_deadline_alert_thresholds() {
        let now = at(2025, 12, 26, 22);
        let tasks = vec![
            task(1, Some((2025, 12, 27)), TaskStatus::Todo),
            task(2, Some((2025, 12, 28)), TaskStatus::InProgress),
            task(3, Some((2025, 12, 29)), TaskStatus::Todo),
            task(4, Some((2025, 12, 24)), TaskStatus::Todo),
        ];
        let alerts = deadline_alerts(&tasks, &now);
        let upcoming: Vec<(u64, i64)> = alerts.upcoming.iter().map(|(t, h)| (t.id, *h)).collect();
        assert_eq!(upcoming, vec![(1, 2)]);
        assert_eq!(alerts.overdue.len(), 1);
        assert_eq!(alerts.overdue[0].id, 4);

        let notes = alerts.notifications();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].interactive);
        assert!(!notes[0].silent);
        assert_eq!(notes[1].kind, NotificationKind::DeadlinePassed);
    }

    #[test]
    fn test_dashboard_windows() {
        let now = at(2025, 12, 26, 12);
        let tasks = vec![
            task(1, Some((2025, 12, 27)), TaskStatus::Todo),
            task(2, Some((2025, 12, 29)), TaskStatus::Todo),
            task(3, Some((2025, 12, 30)), TaskStatus::Todo),
            task(4, Some((2025, 12, 24)), TaskStatus::Todo),
        ];
        let ids = |v: Vec<&Task>| v.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(due_within_day(&tasks, &now)), vec![1]);
        assert_eq!(ids(due_within_three_days(&tasks, &now)), vec![1, 2]);
        assert_eq!(ids(overdue(&tasks, &now)), vec![4]);
    }

    #[test]
    fn test_no_nudges_on_weekend() {
        // 2025-12-27 is a Saturday.
        let now = at(2025, 12, 27, 9);
        let tasks = vec![task(1, Some((2025, 12, 28)), TaskStatus::Todo)];
        assert!(productivity_nudges(&tasks, &now).is_empty());
        assert!(daily_standup(&tasks, &now).is_none());
    }

    #[test]
    fn test_morning_nudges() {
        // Friday 09:00; task created the 25th so not stale, due within 2 days.
        let now = at(2025, 12, 26, 9);
        let tasks = vec![task(1, Some((2025, 12, 27)), TaskStatus::Todo)];
        let kinds: Vec<NotificationKind> =
            productivity_nudges(&tasks, &now).iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Morning, NotificationKind::HighPriority]);
    }

    #[test]
    fn test_evaluation_counts_today_and_flags_stale() {
        let now = at(2025, 12, 29, 17);
        let mut finished = task(1, None, TaskStatus::Done);
        finished.completed_at = Some(at(2025, 12, 29, 11));
        let old = task(2, None, TaskStatus::Todo);
        let tasks = vec![finished, old];

        let notes = productivity_nudges(&tasks, &now);
        let evaluation = notes
            .iter()
            .find(|n| n.kind == NotificationKind::Evaluation)
            .unwrap();
        assert!(evaluation.body.contains("finished 1 tasks"));
        assert!(notes.iter().any(|n| n.kind == NotificationKind::Stale));
    }

    #[test]
    fn test_high_priority_interactive_from_three() {
        let now = at(2025, 12, 26, 10);
        let tasks: Vec<Task> = (1..=3)
            .map(|i| task(i, Some((2025, 12, 27)), TaskStatus::Todo))
            .collect();
        let notes = productivity_nudges(&tasks, &now);
        let high = notes
            .iter()
            .find(|n| n.kind == NotificationKind::HighPriority)
            .unwrap();
        assert!(high.interactive);
    }

    #[test]
    fn test_deadline_labels() {
        let now = at(2025, 12, 26, 12);
        let date = |d| NaiveDate::from_ymd_opt(2025, 12, d);
        assert_eq!(deadline_label(date(26), &now), "Today");
        assert_eq!(deadline_label(date(27), &now), "Tomorrow");
        assert_eq!(deadline_label(date(25), &now), "Yesterday");
        assert_eq!(deadline_label(date(22), &now), "4 days ago");
        assert_eq!(deadline_label(date(31), &now), "31 December 2025");
        assert_eq!(deadline_label(None, &now), "-");
    }

    #[test]
    fn test_deadline_alert_boundaries() {
        let tasks = vec![task(1, Some((2025, 12, 27)), TaskStatus::Todo)];
        // (now, hours left, first notification, interactive, silent)
        let cases = [
            (at(2025, 12, 25, 23), 25, None, false, false),
            (at(2025, 12, 26, 0), 24, Some(NotificationKind::DeadlineSoon), false, true),
            (at(2025, 12, 26, 11), 13, Some(NotificationKind::DeadlineSoon), false, true),
            (at(2025, 12, 26, 12), 12, Some(NotificationKind::DeadlineSoon), false, false),
            (at(2025, 12, 26, 20), 4, Some(NotificationKind::DeadlineSoon), false, false),
            (at(2025, 12, 26, 21), 3, Some(NotificationKind::DeadlineSoon), true, false),
            (at(2025, 12, 27, 0), 0, Some(NotificationKind::DeadlinePassed), true, false),
        ];

        for (now, hours, kind, interactive, silent) in cases {
            assert_eq!(hours_until(&tasks[0], &now), Some(hours), "at {}", now);
            let notes = deadline_alerts(&tasks, &now).notifications();
            assert_eq!(notes.first().map(|n| n.kind), kind, "at {}", now);
            if let Some(n) = notes.first() {
                assert_eq!(n.interactive, interactive, "interactive at {}", now);
                assert_eq!(n.silent, silent, "silent at {}", now);
            }
        }
    }

    #[test]
    fn test_dashboard_window_boundaries() {
        let tasks = vec![task(1, Some((2025, 12, 27)), TaskStatus::Todo)];
        // (now, days left, within a day, within three days, overdue)
        let cases = [
            (at(2025, 12, 23, 12), 4, false, false, false),
            (at(2025, 12, 24, 12), 3, false, true, false),
            (at(2025, 12, 25, 0), 2, false, true, false),
            (at(2025, 12, 26, 12), 1, true, true, false),
            (at(2025, 12, 27, 0), 0, true, false, false),
            (at(2025, 12, 27, 12), 0, true, false, true),
            (at(2025, 12, 28, 12), -1, false, false, true),
        ];

        for (now, days, day, three, late) in cases {
            assert_eq!(days_until(&tasks[0], &now), Some(days), "at {}", now);
            assert_eq!(due_within_day(&tasks, &now).len() == 1, day, "day at {}", now);
            assert_eq!(due_within_three_days(&tasks, &now).len() == 1, three, "three at {}", now);
            assert_eq!(overdue(&tasks, &now).len() == 1, late, "overdue at {}", now);
        }
    }

    #[test]
    fn test_nudge_hour_windows() {
        use NotificationKind::*;

        // Friday; the pending task is neither stale nor dated.
        let pending = vec![task(1, None, TaskStatus::Todo)];
        let cases: [(u32, bool, Vec<NotificationKind>); 16] = [
            (7, true, vec![]),
            (8, true, vec![Morning]),
            (10, true, vec![Morning]),
            (11, true, vec![]),
            (12, true, vec![Break]),
            (14, true, vec![Break]),
            (15, true, vec![]),
            (16, true, vec![Evaluation]),
            (18, true, vec![Evaluation]),
            (19, true, vec![]),
            (20, true, vec![Evening]),
            (22, true, vec![Evening]),
            (23, true, vec![]),
            (9, false, vec![]),
            (13, false, vec![Break]),
            (21, false, vec![]),
        ];

        for (hour, with_pending, expected) in cases {
            let tasks = if with_pending { pending.clone() } else { vec![] };
            let kinds: Vec<NotificationKind> = productivity_nudges(&tasks, &at(2025, 12, 26, hour))
                .iter()
                .map(|n| n.kind)
                .collect();
            assert_eq!(kinds, expected, "at {}:00, pending {}", hour, with_pending);
        }
    }

    /// UTC-4 until 2025-09-07 04:00 UTC, then UTC-3: local 00:00 to 00:59
    /// on the 7th never happens.
    #[derive(Debug, Clone, Copy)]
    struct SkipsMidnight;

    fn west(hours: i32) -> FixedOffset {
        FixedOffset::west_opt(hours * 3600).unwrap()
    }

    impl TimeZone for SkipsMidnight {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SkipsMidnight
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            let switch = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
            LocalResult::Single(if *local < switch { west(4) } else { west(3) })
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap().and_hms_opt(0, 0, 0).unwrap();
            let gap_end = gap_start + Duration::hours(1);
            if *local < gap_start {
                LocalResult::Single(west(4))
            } else if *local >= gap_end {
                LocalResult::Single(west(3))
            } else {
                LocalResult::None
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let switch = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap().and_hms_opt(4, 0, 0).unwrap();
            if *utc < switch {
                west(4)
            } else {
                west(3)
            }
        }
    }

    #[test]
    fn test_deadline_on_skipped_midnight_still_counts() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        assert_eq!(
            deadline_instant(date, &SkipsMidnight),
            Some(Utc.with_ymd_and_hms(2025, 9, 7, 4, 0, 0).unwrap())
        );

        let now = at(2025, 9, 10, 15).with_timezone(&SkipsMidnight);
        let tasks = vec![task(1, Some((2025, 9, 7)), TaskStatus::Todo)];
        assert_eq!(overdue(&tasks, &now).len(), 1);
        assert_eq!(deadline_alerts(&tasks, &now).overdue.len(), 1);
        assert_eq!(deadline_label(tasks[0].deadline, &now), "3 days ago");
    }

    #[test]
    fn test_daily_motivation_is_stable_for_a_day() {
        let morning = at(2025, 12, 26, 8);
        let evening = at(2025, 12, 26, 20);
        assert_eq!(daily_motivation(&morning), daily_motivation(&evening));
    }
}
