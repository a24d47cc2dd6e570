//! Task store boundary (project-tracking database).
//!
//! The HTTP client lives behind [`TaskStore`]. This module shapes what goes
//! over the wire: page properties on create, the candidate query filter,
//! and the adapter from raw page records to [`TaskSummary`].

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::types::{CreatedPage, NewTask, Priority, TaskSummary};

pub const STATUS_NOT_STARTED: &str = "未着手";
pub const STATUS_DONE: &str = "完了";

/// Page size cap imposed by the store API
pub const MAX_QUERY_LIMIT: usize = 100;

pub trait TaskStore {
    /// Create one task page and return its identifiers
    fn create_task(&self, task: &NewTask) -> Result<CreatedPage>;

    /// Open tasks due on or before `window_end_iso`, plus tasks with no due date
    fn query_candidates(&self, window_end_iso: &str, limit: usize) -> Result<Vec<Value>>;
}

fn rich_text(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

/// Property payload for a new task page
pub fn page_properties(task: &NewTask) -> Value {
    let mut properties = Map::new();
    properties.insert("Title".into(), json!({ "title": rich_text(&task.title) }));
    properties.insert(
        "Status".into(),
        json!({ "status": { "name": STATUS_NOT_STARTED } }),
    );
    properties.insert(
        "Priority".into(),
        json!({ "select": { "name": task.priority.as_str() } }),
    );
    properties.insert("Source".into(), json!({ "rich_text": rich_text(&task.source) }));

    if let Some(due) = task.due_date {
        properties.insert(
            "Due".into(),
            json!({ "date": { "start": due.format("%Y-%m-%d").to_string() } }),
        );
    }
    if let Some(notes) = task.notes.as_deref().filter(|n| !n.is_empty()) {
        properties.insert("Notes".into(), json!({ "rich_text": rich_text(notes) }));
    }
    if let Some(category) = task.category {
        properties.insert(
            "Category".into(),
            json!({ "select": { "name": category.as_str() } }),
        );
    }

    Value::Object(properties)
}

/// Full create-page request body for `database_id`
pub fn create_page_body(database_id: &str, task: &NewTask) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": page_properties(task),
    })
}

/// Query filter for digest candidates
pub fn candidates_filter(window_end_iso: &str) -> Value {
    json!({
        "and": [
            { "property": "Status", "status": { "does_not_equal": STATUS_DONE } },
            {
                "or": [
                    { "property": "Due", "date": { "on_or_before": window_end_iso } },
                    { "property": "Due", "date": { "is_empty": true } },
                ]
            },
        ]
    })
}

/// Full query request body, with the limit clamped to the API page size
pub fn candidates_query_body(window_end_iso: &str, limit: usize) -> Value {
    json!({
        "filter": candidates_filter(window_end_iso),
        "sorts": [{ "property": "Due", "direction": "ascending" }],
        "page_size": limit.clamp(1, MAX_QUERY_LIMIT),
    })
}

/// Pages from a query response: either `{"results": [...]}` or a bare array
pub fn query_results(response: &Value) -> Vec<Value> {
    match response {
        Value::Array(pages) => pages.clone(),
        Value::Object(obj) => obj
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Adapt a raw page record into a summary. Missing fields become empty.
pub fn summary_from_page(page: &Value) -> TaskSummary {
    let prop = |name: &str| page.get("properties").and_then(|p| p.get(name));
    let string_at = |value: Option<&Value>, pointer: &str| {
        value
            .and_then(|v| v.pointer(pointer))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let title = prop("Title")
        .and_then(|t| t.get("title"))
        .and_then(Value::as_array)
        .map(|parts| parts.iter().filter_map(text_of).collect::<String>())
        .unwrap_or_default();

    TaskSummary {
        id: page.get("id").and_then(Value::as_str).map(str::to_string),
        url: page.get("url").and_then(Value::as_str).map(str::to_string),
        title,
        due: string_at(prop("Due"), "/date/start"),
        priority: string_at(prop("Priority"), "/select/name")
            .map(|p| Priority::from_str_lenient(&p))
            .unwrap_or_default(),
        status: string_at(prop("Status"), "/status/name").unwrap_or_default(),
    }
}

/// Accept either a raw page record or an already-flattened [`TaskSummary`]
pub fn summary_from_record(record: &Value) -> TaskSummary {
    if record.get("properties").is_some() {
        return summary_from_page(record);
    }
    TaskSummary::deserialize(record).unwrap_or_else(|_| summary_from_page(record))
}

fn text_of(part: &Value) -> Option<&str> {
    part.get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| part.pointer("/text/content").and_then(Value::as_str))
}
