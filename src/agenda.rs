use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timestamp::{end_of_day, parse_iso_instant, start_of_day};
use crate::types::TaskSummary;

/// Urgency tier of a task relative to the digest window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Overdue,
    Today,
    Upcoming,
    NoDue,
}

/// Tasks grouped for the daily digest, each bucket in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestBuckets {
    pub overdue: Vec<TaskSummary>,
    pub today: Vec<TaskSummary>,
    pub upcoming: Vec<TaskSummary>,
    pub no_due: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub overdue: usize,
    pub today: usize,
    pub no_due: usize,
    pub upcoming: usize,
}

impl DigestBuckets {
    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            overdue: self.overdue.len(),
            today: self.today.len(),
            no_due: self.no_due.len(),
            upcoming: self.upcoming.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty()
            && self.today.is_empty()
            && self.upcoming.is_empty()
            && self.no_due.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overdue.len() + self.today.len() + self.upcoming.len() + self.no_due.len()
    }

    fn push(&mut self, bucket: Bucket, task: TaskSummary) {
        match bucket {
            Bucket::Overdue => self.overdue.push(task),
            Bucket::Today => self.today.push(task),
            Bucket::Upcoming => self.upcoming.push(task),
            Bucket::NoDue => self.no_due.push(task),
        }
    }
}

/// Day boundaries for one digest run
#[derive(Debug, Clone, Copy)]
pub struct AgendaWindow {
    pub today_start: DateTime<Tz>,
    pub today_end: DateTime<Tz>,
    pub window_end: DateTime<Tz>,
}

impl AgendaWindow {
    /// Build the window around `now`, in `now`'s timezone
    pub fn new(now: DateTime<Tz>, window_days: u32) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let last_day = today
            .checked_add_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MAX);

        Self {
            today_start: start_of_day(today, tz),
            today_end: end_of_day(today, tz),
            window_end: end_of_day(last_day, tz),
        }
    }

    /// Classify a raw due value. `None` means the task lies past the window.
    pub fn classify(&self, due: Option<&str>) -> Option<Bucket> {
        let tz = self.today_start.timezone();
        let Some(due) = due.and_then(|d| parse_iso_instant(d, tz)) else {
            return Some(Bucket::NoDue);
        };

        if due < self.today_start {
            Some(Bucket::Overdue)
        } else if due <= self.today_end {
            Some(Bucket::Today)
        } else if due <= self.window_end {
            Some(Bucket::Upcoming)
        } else {
            None
        }
    }
}

/// Split tasks into overdue / today / upcoming / no-due buckets.
///
/// Unparsable due values land in `no_due`. Tasks due after the end of the
/// window are left out of every bucket.
///
/// # Arguments
/// * `tasks` - Candidate tasks, in the order they should be listed
/// * `now` - Reference instant; its timezone defines the day boundaries
/// * `window_days` - Days after today still counted as upcoming
///
/// # Returns
/// Buckets holding every task due on or before the end of the window
pub fn bucketize<I>(tasks: I, now: DateTime<Tz>, window_days: u32) -> DigestBuckets
where
    I: IntoIterator<Item = TaskSummary>,
{
    let window = AgendaWindow::new(now, window_days);
    let mut buckets = DigestBuckets::default();

    for task in tasks {
        match window.classify(task.due.as_deref()) {
            Some(bucket) => buckets.push(bucket, task),
            None => debug!(title = %task.title, due = ?task.due, "task due after digest window"),
        }
    }

    buckets
}
