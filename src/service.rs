use chrono::{DateTime, Days, NaiveDate, SecondsFormat};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info};

use crate::agenda::{bucketize, BucketCounts, DigestBuckets};
use crate::config::DigestSettings;
use crate::error::Result;
use crate::extract::TaskExtractor;
use crate::push::{is_verification_ping, registration_reply, text_messages, ChatPusher};
use crate::render::render_daily_summary;
use crate::store::{summary_from_page, TaskStore};
use crate::timestamp::{due_calendar_date, end_of_day, normalize};
use crate::types::{Category, ExtractedTask, NewTask, Priority, Task, DEFAULT_SOURCE};

/// Build the task to persist from model output.
///
/// Missing fields fall back to defaults: `fallback_title` as title,
/// `medium` priority, no due date. A due timestamp keeps only its calendar
/// date in `tz`.
pub fn draft_task(
    extracted: ExtractedTask,
    fallback_title: &str,
    source: Option<&str>,
    today: NaiveDate,
    tz: Tz,
) -> NewTask {
    let due_date = normalize(extracted.due_date.as_deref(), today)
        .and_then(|due| due_calendar_date(&due, tz));

    NewTask {
        title: extracted.title.unwrap_or_else(|| fallback_title.to_string()),
        due_date,
        priority: extracted
            .priority
            .as_deref()
            .map(Priority::from_str_lenient)
            .unwrap_or_default(),
        notes: extracted.notes,
        category: extracted.category.as_deref().map(Category::from_str_lenient),
        source: source.unwrap_or(DEFAULT_SOURCE).to_string(),
    }
}

/// A task registered from one webhook message, with the text to reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookReply {
    pub reply_token: Option<String>,
    pub text: String,
    pub task: Task,
}

/// Free text in, persisted task out
pub struct TaskService<E, S> {
    extractor: E,
    store: S,
    timezone: Tz,
}

impl<E: TaskExtractor, S: TaskStore> TaskService<E, S> {
    pub fn new(extractor: E, store: S, timezone: Tz) -> Self {
        Self {
            extractor,
            store,
            timezone,
        }
    }

    /// Extract fields from `text`, persist them, and return the stored task.
    /// The raw text doubles as the title when the model gives none.
    pub fn create_task_from_text(
        &self,
        text: &str,
        source: Option<&str>,
        user_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<Task> {
        let extracted = self.extractor.extract(text, today)?;
        debug!(?extracted, "model extraction");

        let new_task = draft_task(extracted, text, source, today, self.timezone);
        let page = self.store.create_task(&new_task)?;
        info!(page_id = %page.id, due = ?new_task.due_date, "task created");

        Ok(Task {
            title: new_task.title,
            due_date: new_task.due_date,
            priority: new_task.priority,
            notes: new_task.notes,
            category: new_task.category,
            source: new_task.source,
            user_id: user_id.map(str::to_string),
            page_id: Some(page.id),
            page_url: Some(page.url),
        })
    }

    /// Register a task for every text message in a webhook body.
    ///
    /// Verification pings yield no replies. Stops at the first failure.
    pub fn handle_webhook(&self, body: &str, today: NaiveDate) -> Result<Vec<WebhookReply>> {
        if is_verification_ping(body) {
            info!("webhook verification ping");
            return Ok(Vec::new());
        }

        let mut replies = Vec::new();
        for message in text_messages(body)? {
            let task = self.create_task_from_text(
                &message.text,
                Some(DEFAULT_SOURCE),
                message.user_id.as_deref(),
                today,
            )?;
            replies.push(WebhookReply {
                reply_token: message.reply_token,
                text: registration_reply(&task),
                task,
            });
        }
        Ok(replies)
    }
}

/// Result of one digest push, as reported to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestReport {
    pub ok: bool,
    pub counts: BucketCounts,
}

/// Collects candidate tasks and sends the daily digest
pub struct DigestService<S, P> {
    store: S,
    pusher: P,
    settings: DigestSettings,
}

impl<S: TaskStore, P: ChatPusher> DigestService<S, P> {
    pub fn new(store: S, pusher: P, settings: DigestSettings) -> Self {
        Self {
            store,
            pusher,
            settings,
        }
    }

    /// End of the last day covered by the digest, as an RFC 3339 string
    pub fn window_end_iso(&self, now: DateTime<Tz>) -> String {
        let last_day = now
            .with_timezone(&self.settings.timezone)
            .date_naive()
            .checked_add_days(Days::new(u64::from(self.settings.window_days)))
            .unwrap_or(NaiveDate::MAX);
        end_of_day(last_day, self.settings.timezone).to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Query the store and bucket the candidates relative to `now`
    pub fn collect(&self, now: DateTime<Tz>) -> Result<DigestBuckets> {
        let now = now.with_timezone(&self.settings.timezone);
        let window_end = self.window_end_iso(now);
        let pages = self
            .store
            .query_candidates(&window_end, self.settings.query_limit)?;
        debug!(count = pages.len(), %window_end, "digest candidates");

        let summaries = pages.iter().map(summary_from_page);
        Ok(bucketize(summaries, now, self.settings.window_days))
    }

    /// Collect, render and push the digest to `to`
    pub fn push_daily(&self, now: DateTime<Tz>, to: &str) -> Result<DigestReport> {
        let buckets = self.collect(now)?;
        let text = render_daily_summary(&buckets, self.settings.timezone, self.settings.window_days);
        self.pusher.push_text(to, &text)?;

        let counts = buckets.counts();
        info!(?counts, "daily digest pushed");
        Ok(DigestReport { ok: true, counts })
    }
}
