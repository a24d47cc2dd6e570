//! Language-model extraction boundary.
//!
//! The model call itself lives behind [`TaskExtractor`]; this module owns
//! the prompt text and the parsing of whatever the model sends back.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::types::ExtractedTask;

/// Greedy match from the first `{` to the last `}`, across lines
static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid JSON_OBJECT_RE regex"));

/// Turns free text into structured task fields.
///
/// Implementations wrap a model API; tests use canned replies.
pub trait TaskExtractor {
    fn extract(&self, text: &str, today: NaiveDate) -> Result<ExtractedTask>;
}

impl<F> TaskExtractor for F
where
    F: Fn(&str, NaiveDate) -> Result<ExtractedTask>,
{
    fn extract(&self, text: &str, today: NaiveDate) -> Result<ExtractedTask> {
        self(text, today)
    }
}

/// Build the extraction prompt for `text`, anchored to `today`
pub fn build_prompt(text: &str, today: NaiveDate) -> String {
    let today = today.format("%Y-%m-%d");
    format!(
        r#"あなたは日本語の自然文からタスク情報を抽出し、「カテゴリ」も分類するアシスタントです。

ユーザーが入力した文章を解析し、次の JSON を出力してください：

{{
  "title": string,              // タスク名（短く簡潔に）
  "due_date": string | null,    // YYYY-MM-DD 形式 or null
  "priority": "low" | "medium" | "high",
  "notes": string | null,
  "category": "Research" | "Job" | "Private" | "Others"
}}

# 現在日付
- 現在日付は {today} です。

# 日付のルール
- 「今日」「明日」「あさって」「金曜」「来週」など相対表現は日付に変換してください。
- 日付が推定できなければ "due_date": null にしてください。

# 優先度の目安
- 期限が「今日」「明日」など直近 → "high" または "medium"
- 期限が遠い or 重要度が低そう → "low" または "medium"

# カテゴリ分類のルール
- 研究に関するタスク → "Research"
  - 例：ゼミ、発表、論文、研究室、実験、スライドなど
- 就活に関するタスク → "Job"
  - 例：ES、面接、説明会、エントリー、OB訪問、SPIなど
- プライベートな用事 → "Private"
  - 例：買い物、飲み会、ゲーム、掃除、美容院、旅行、ジムなど
- 上記に当てはまらない or 判断が難しい → "Others"

# 出力フォーマット
- 出力は必ず **純粋な JSON だけ** にしてください。
- コメントや説明文は一切書かないでください。

# 入力文
{text}

JSON のみを返してください。
"#
    )
}

/// Pull the JSON object out of a model reply.
///
/// Models often wrap the object in prose or code fences. A reply without
/// any `{...}` span, or whose span is not valid JSON, is an error.
pub fn parse_model_reply(reply: &str) -> Result<ExtractedTask> {
    let span = JSON_OBJECT_RE
        .find(reply)
        .ok_or_else(|| AppError::NoJson(reply.to_string()))?
        .as_str();

    let value: Value =
        serde_json::from_str(span).map_err(|_| AppError::InvalidJson(span.to_string()))?;

    Ok(extracted_from_value(&value))
}

/// Read the known fields from a JSON object; wrong types become `None`
pub fn extracted_from_value(value: &Value) -> ExtractedTask {
    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ExtractedTask {
        title: field("title"),
        due_date: field("due_date"),
        priority: field("priority"),
        notes: field("notes"),
        category: field("category"),
    }
}
