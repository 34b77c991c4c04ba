use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use tracing::debug;

use crate::model::Task;
use crate::reminders::{self, Notification};

const STARTUP_DELAY_SECS: i64 = 3;
const PRODUCTIVITY_EVERY_MINS: i64 = 30;
const DEADLINE_EVERY_MINS: i64 = 60;
const STANDUP_HOUR: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Deadlines,
    Productivity,
    DailyStandup,
}

/// Reminder timers for one login session, polled from the UI loop.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    startup: Option<DateTime<Utc>>,
    productivity: Option<DateTime<Utc>>,
    deadlines: Option<DateTime<Utc>>,
    standup: Option<DateTime<Utc>>,
}

impl Scheduler {
    pub fn start<Tz: TimeZone>(now: &DateTime<Tz>) -> Scheduler {
        let utc_now = now.with_timezone(&Utc);
        Scheduler {
            startup: Some(utc_now + Duration::seconds(STARTUP_DELAY_SECS)),
            productivity: Some(utc_now + Duration::minutes(PRODUCTIVITY_EVERY_MINS)),
            deadlines: Some(utc_now + Duration::minutes(DEADLINE_EVERY_MINS)),
            standup: Some(next_standup(now)),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.startup.is_some()
            || self.productivity.is_some()
            || self.deadlines.is_some()
            || self.standup.is_some()
    }

    /// Disarms every timer.
    pub fn clear(&mut self) {
        *self = Scheduler::default();
    }

    /// Checks due at `now`. Fired timers are re-armed relative to `now`, so
    /// a long stall yields one check rather than a burst.
    pub fn poll<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Check> {
        let utc_now = now.with_timezone(&Utc);
        let mut due = Vec::new();

        if self.startup.map_or(false, |at| at <= utc_now) {
            self.startup = None;
            due.push(Check::Deadlines);
            due.push(Check::Productivity);
        }

        if self.productivity.map_or(false, |at| at <= utc_now) {
            self.productivity = Some(utc_now + Duration::minutes(PRODUCTIVITY_EVERY_MINS));
            if in_working_hours(now) && !due.contains(&Check::Productivity) {
                due.push(Check::Productivity);
            }
        }

        if self.deadlines.map_or(false, |at| at <= utc_now) {
            self.deadlines = Some(utc_now + Duration::minutes(DEADLINE_EVERY_MINS));
            if !due.contains(&Check::Deadlines) {
                due.push(Check::Deadlines);
            }
        }

        if self.standup.map_or(false, |at| at <= utc_now) {
            self.standup = Some(next_standup(now));
            due.push(Check::DailyStandup);
        }

        if !due.is_empty() {
            debug!(?due, "reminder checks due");
        }
        due
    }
}

fn in_working_hours<Tz: TimeZone>(now: &DateTime<Tz>) -> bool {
    !matches!(now.weekday(), Weekday::Sat | Weekday::Sun) && (8..=18).contains(&now.hour())
}

/// The next 09:00 strictly after `now`, in `now`'s time zone.
pub fn next_standup<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let utc_now = now.with_timezone(&Utc);
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        let candidate = day
            .and_hms_opt(STANDUP_HOUR, 0, 0)
            .and_then(|t| tz.from_local_datetime(&t).earliest())
            .map(|t| t.with_timezone(&Utc));
        match candidate {
            Some(at) if at > utc_now => return at,
            _ => match day.succ_opt() {
                Some(next) => day = next,
                None => return utc_now + Duration::days(1),
            },
        }
    }
}

/// Runs the given checks against the task list.
pub fn run_checks<Tz: TimeZone>(checks: &[Check], tasks: &[Task], now: &DateTime<Tz>) -> Vec<Notification> {
    let mut out = Vec::new();
    for check in checks {
        match check {
            Check::Deadlines => out.extend(reminders::deadline_alerts(tasks, now).notifications()),
            Check::Productivity => out.extend(reminders::productivity_nudges(tasks, now)),
            Check::DailyStandup => out.extend(reminders::daily_standup(tasks, now)),
        }
    }
    out
}
