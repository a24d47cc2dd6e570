use chrono_tz::Tz;

use crate::agenda::DigestBuckets;
use crate::timestamp::parse_iso_instant;
use crate::types::TaskSummary;

pub const SUMMARY_HEADER: &str = "📅 Daily Task Summary";
pub const OVERDUE_HEADER: &str = "⚠️ Overdue";
pub const TODAY_HEADER: &str = "✔︎ Today";
pub const UPCOMING_HEADER: &str = "👉 Upcoming";
pub const NO_DUE_HEADER: &str = "❓ No Due";
pub const NICE_LINE: &str = "🎉 Nice!";

const UNTITLED: &str = "(no title)";

/// Render the daily digest pushed to chat.
///
/// Empty sections are omitted. When every bucket is empty a single
/// celebratory message naming the window is returned instead.
pub fn render_daily_summary(buckets: &DigestBuckets, tz: Tz, window_days: u32) -> String {
    let mut lines: Vec<String> = vec![SUMMARY_HEADER.to_string(), String::new()];

    let sections = [
        (OVERDUE_HEADER, &buckets.overdue),
        (TODAY_HEADER, &buckets.today),
        (UPCOMING_HEADER, &buckets.upcoming),
        (NO_DUE_HEADER, &buckets.no_due),
    ];

    for (header, tasks) in sections {
        if tasks.is_empty() {
            continue;
        }
        lines.push(header.to_string());
        lines.extend(tasks.iter().map(|task| format_task(task, tz)));
        lines.push(String::new());
    }

    if buckets.is_empty() {
        lines.push(NICE_LINE.to_string());
        lines.push(format!("今日 ~ {window_days}日以内のタスクはありません"));
        return lines.join("\n");
    }

    if buckets.overdue.is_empty() && buckets.no_due.is_empty() {
        lines.push(NICE_LINE.to_string());
        lines.push("期限切れ・期限未設定のタスクはありません".to_string());
    }

    lines.join("\n")
}

/// One task entry: title line plus an optional due line
fn format_task(task: &TaskSummary, tz: Tz) -> String {
    let title = if task.title.trim().is_empty() {
        UNTITLED
    } else {
        task.title.as_str()
    };

    let due = format_due(task.due.as_deref(), tz);
    if due.is_empty() {
        format!("- {title}")
    } else {
        format!("- {title}\n └ Due: {due}")
    }
}

/// Format a due value as `MM/DD (Ddd)` in `tz`.
///
/// Values that do not parse are shown as-is.
pub fn format_due(due: Option<&str>, tz: Tz) -> String {
    let Some(due) = due.filter(|d| !d.is_empty()) else {
        return String::new();
    };

    match parse_iso_instant(due, tz) {
        Some(dt) => dt.date_naive().format("%m/%d (%a)").to_string(),
        None => due.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::DEFAULT_TIMEZONE;

    fn summary(overdue: Vec<TaskSummary>, today: Vec<TaskSummary>, upcoming: Vec<TaskSummary>, no_due: Vec<TaskSummary>) -> DigestBuckets {
        DigestBuckets {
            overdue,
            today,
            upcoming,
            no_due,
        }
    }

    #[test]
    fn test_format_due() {
        assert_eq!(format_due(Some("2025-12-14"), DEFAULT_TIMEZONE), "12/14 (Sun)");
        assert_eq!(format_due(Some("2025-12-14T20:00:00Z"), DEFAULT_TIMEZONE), "12/15 (Mon)");
        assert_eq!(format_due(Some("来週"), DEFAULT_TIMEZONE), "来週");
        assert_eq!(format_due(None, DEFAULT_TIMEZONE), "");
        assert_eq!(format_due(Some(""), DEFAULT_TIMEZONE), "");
    }

    #[test]
    fn test_skips_empty_sections() {
        let buckets = summary(
            vec![],
            vec![TaskSummary::new("タスクA", Some("2025-12-14"))],
            vec![],
            vec![],
        );
        let msg = render_daily_summary(&buckets, DEFAULT_TIMEZONE, 3);

        assert!(msg.starts_with(SUMMARY_HEADER));
        assert!(msg.contains("Today"));
        assert!(msg.contains("- タスクA\n └ Due: 12/14 (Sun)"));
        assert!(!msg.contains("Overdue"));
        assert!(!msg.contains("Upcoming"));
        assert!(!msg.contains("No Due"));
        assert!(!msg.contains("None"));
        assert!(msg.ends_with("期限切れ・期限未設定のタスクはありません"));
    }

    #[test]
    fn test_all_empty_is_nice() {
        let msg = render_daily_summary(&DigestBuckets::default(), DEFAULT_TIMEZONE, 3);
        assert_eq!(
            msg,
            "📅 Daily Task Summary\n\n🎉 Nice!\n今日 ~ 3日以内のタスクはありません"
        );
    }

    #[test]
    fn test_section_order_and_no_due_line() {
        let buckets = summary(
            vec![TaskSummary::new("old", Some("2025-06-01"))],
            vec![],
            vec![TaskSummary::new("soon", Some("2025-06-12"))],
            vec![TaskSummary::new("someday", None)],
        );
        let msg = render_daily_summary(&buckets, DEFAULT_TIMEZONE, 3);

        let overdue = msg.find(OVERDUE_HEADER).unwrap();
        let upcoming = msg.find(UPCOMING_HEADER).unwrap();
        let no_due = msg.find(NO_DUE_HEADER).unwrap();
        assert!(overdue < upcoming && upcoming < no_due);
        assert!(msg.contains("- someday\n"));
        assert!(!msg.contains(NICE_LINE));
    }

    #[test]
    fn test_untitled_task() {
        let buckets = summary(vec![], vec![], vec![], vec![TaskSummary::new("", None)]);
        let msg = render_daily_summary(&buckets, DEFAULT_TIMEZONE, 3);
        assert!(msg.contains("- (no title)"));
    }
}
