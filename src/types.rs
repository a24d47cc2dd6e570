use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default task source when the caller does not name one
pub const DEFAULT_SOURCE: &str = "line";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Lenient parse: unknown or empty values fall back to `Medium`
    pub fn from_str_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Research,
    Job,
    Private,
    #[default]
    Others,
}

impl Category {
    pub fn from_str_lenient(s: &str) -> Self {
        match s.trim() {
            "Research" => Category::Research,
            "Job" => Category::Job,
            "Private" => Category::Private,
            _ => Category::Others,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Research => "Research",
            Category::Job => "Job",
            Category::Private => "Private",
            Category::Others => "Others",
        }
    }
}

/// Fields pulled out of free text by the language model.
///
/// Every field may be missing; the ingestion service fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

/// A task ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub category: Option<Category>,
    pub source: String,
}

/// Identifiers assigned by the store on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    pub url: String,
}

/// A task as returned to API callers after it has been persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Read-only view of a stored task, as consumed by the digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: String,
}

impl TaskSummary {
    pub fn new(title: impl Into<String>, due: Option<&str>) -> Self {
        Self {
            id: None,
            url: None,
            title: title.into(),
            due: due.map(str::to_string),
            priority: Priority::default(),
            status: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_lenient() {
        assert_eq!(Priority::from_str_lenient("HIGH"), Priority::High);
        assert_eq!(Priority::from_str_lenient(" low "), Priority::Low);
        assert_eq!(Priority::from_str_lenient("urgent"), Priority::Medium);
        assert_eq!(Priority::from_str_lenient(""), Priority::Medium);
    }

    #[test]
    fn test_category_unknown_is_others() {
        assert_eq!(Category::from_str_lenient("Research"), Category::Research);
        assert_eq!(Category::from_str_lenient("research"), Category::Others);
        assert_eq!(Category::from_str_lenient("Hobby"), Category::Others);
    }

    #[test]
    fn test_summary_deserialize_defaults() {
        let summary: TaskSummary = serde_json::from_str(r#"{"title": "A"}"#).unwrap();
        assert_eq!(summary.due, None);
        assert_eq!(summary.priority, Priority::Medium);
        assert!(summary.status.is_empty());
    }

    #[test]
    fn test_task_serializes_lowercase_priority() {
        let task = Task {
            title: "Slides".to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 11),
            priority: Priority::High,
            notes: None,
            category: Some(Category::Research),
            source: DEFAULT_SOURCE.to_string(),
            user_id: None,
            page_id: None,
            page_url: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "high");
        assert_eq!(json["due_date"], "2025-06-11");
        assert_eq!(json["category"], "Research");
        assert!(json.get("notes").is_none());
    }
}
