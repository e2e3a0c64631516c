use crate::models::{Priority, RemoteTask, TaskStatus};
use chrono::{DateTime, Datelike, NaiveDate};
use reqwest::Url;
use std::sync::LazyLock;

pub const TODO_MARKER: &str = "{{[[TODO]]}}";
pub const DONE_MARKER: &str = "{{[[DONE]]}}";
pub const QUICK_CAPTURE_TAG: &str = "Quick Capture";

const TASK_LINK_LABEL: &str = "[todoist](";
const TASK_URL_BASE: &str = "https://todoist.com/showTask";
const TASK_ID_PARAM: &str = "id";

static TASK_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(TASK_URL_BASE).expect("task url base is a valid url"));

#[derive(Clone, Debug, Default)]
pub struct BlockStyle {
    pub hide_priority: bool,
    pub tag: Option<String>,
}

pub fn encode_task_link(id: &str) -> String {
    let mut url = TASK_URL.clone();
    url.query_pairs_mut().append_pair(TASK_ID_PARAM, id);
    format!("{TASK_LINK_LABEL}{url})")
}

/// Recovers the task id from the last task link in `text`.
pub fn parse_task_id(text: &str) -> Option<String> {
    let start = text.rfind(TASK_LINK_LABEL)? + TASK_LINK_LABEL.len();
    let rest = &text[start..];
    let end = rest.find(')')?;
    let url = Url::parse(&rest[..end]).ok()?;
    if url.as_str().split('?').next() != Some(TASK_URL_BASE) {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == TASK_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

pub fn parse_status(text: &str) -> Option<TaskStatus> {
    let trimmed = text.trim_start();
    if trimmed.starts_with(TODO_MARKER) {
        Some(TaskStatus::Todo)
    } else if trimmed.starts_with(DONE_MARKER) {
        Some(TaskStatus::Done)
    } else {
        None
    }
}

pub fn set_status(text: &str, status: TaskStatus) -> String {
    let marker = match status {
        TaskStatus::Todo => TODO_MARKER,
        TaskStatus::Done => DONE_MARKER,
    };
    let body = strip_status(text);
    if body.is_empty() {
        marker.to_string()
    } else {
        format!("{marker} {body}")
    }
}

pub fn strike_through(text: &str) -> String {
    let body = strip_status(text);
    let (content, link) = split_task_link(body);
    let content = content.trim_end();
    let mut out = String::from(DONE_MARKER);
    if !content.is_empty() {
        out.push_str(" ~~");
        out.push_str(content);
        out.push_str("~~");
    }
    if !link.is_empty() {
        out.push(' ');
        out.push_str(link);
    }
    out
}

pub fn compose_task_block(task: &RemoteTask, style: &BlockStyle) -> String {
    let mut parts = vec![TODO_MARKER.to_string(), task.content.trim().to_string()];
    if !style.hide_priority
        && let Some(priority) = task.priority
    {
        parts.push(priority_tag(priority));
    }
    if let Some(due) = task.due.as_deref() {
        match parse_due_date(due) {
            Some(date) => parts.push(date_link(date)),
            None => {
                tracing::warn!(task_id = %task.id, due, "unreadable due date, skipping date link")
            }
        }
    }
    if let Some(tag) = style.tag.as_deref() {
        parts.push(tag_ref(tag));
    }
    parts.push(encode_task_link(&task.id));
    join_parts(parts)
}

pub fn compose_capture_block(task: &RemoteTask, tag: Option<&str>) -> String {
    let mut parts = vec![task.content.trim().to_string()];
    if let Some(date) = task.created_date() {
        parts.push(format!("created_at: {}", date_link(date)));
    }
    parts.push(tag_ref(QUICK_CAPTURE_TAG));
    if let Some(tag) = tag {
        parts.push(tag_ref(tag));
    }
    parts.push(encode_task_link(&task.id));
    join_parts(parts)
}

pub fn priority_tag(priority: Priority) -> String {
    format!("#[[priority/p{}]]", priority.level())
}

pub fn tag_ref(tag: &str) -> String {
    format!("#[[{}]]", tag.trim())
}

pub fn date_link(date: NaiveDate) -> String {
    format!("[[{}]]", date_page_title(date))
}

/// Daily-note title for a date, e.g. "January 5th, 2024".
pub fn date_page_title(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}

pub(crate) fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    let (date, _) = trimmed.split_once('T')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn strip_status(text: &str) -> &str {
    let trimmed = text.trim_start();
    trimmed
        .strip_prefix(TODO_MARKER)
        .or_else(|| trimmed.strip_prefix(DONE_MARKER))
        .unwrap_or(trimmed)
        .trim()
}

fn split_task_link(text: &str) -> (&str, &str) {
    let Some(start) = text.rfind(TASK_LINK_LABEL) else {
        return (text, "");
    };
    match text[start..].find(')') {
        Some(end) if text[start + end + 1..].trim().is_empty() => {
            (&text[..start], text[start..].trim_end())
        }
        _ => (text, ""),
    }
}

fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, content: &str) -> RemoteTask {
        RemoteTask::new(id, content)
    }

    #[test]
    fn composes_pulled_block_in_fixed_order() {
        let mut t = task("1", "Buy milk");
        t.priority = Priority::new(2);
        t.due = Some("2024-01-05".to_string());
        let style = BlockStyle {
            hide_priority: false,
            tag: Some("work".to_string()),
        };
        assert_eq!(
            compose_task_block(&t, &style),
            "{{[[TODO]]}} Buy milk #[[priority/p2]] [[January 5th, 2024]] #[[work]] \
             [todoist](https://todoist.com/showTask?id=1)"
        );
    }

    #[test]
    fn hide_priority_drops_only_the_priority_tag() {
        let mut t = task("7", "Ship it");
        t.priority = Priority::new(1);
        let style = BlockStyle {
            hide_priority: true,
            tag: None,
        };
        let text = compose_task_block(&t, &style);
        assert!(!text.contains("priority/"));
        assert_eq!(parse_task_id(&text).as_deref(), Some("7"));
    }

    #[test]
    fn malformed_due_date_still_produces_block() {
        let mut t = task("9", "Pay rent");
        t.due = Some("next tuesday-ish".to_string());
        let text = compose_task_block(&t, &BlockStyle::default());
        assert_eq!(
            text,
            "{{[[TODO]]}} Pay rent [todoist](https://todoist.com/showTask?id=9)"
        );
    }

    #[test]
    fn task_id_round_trips_through_awkward_characters() {
        let ids = [
            "2995104339",
            "6Jf8VQXxpwv56VQ7",
            "a)b",
            "x](y",
            "with space",
            "100%",
            "a&id=b",
            "plus+sign",
            "[todoist](https://todoist.com/showTask?id=nested)",
            "ünïcødé",
        ];
        for id in ids {
            let text = format!("{TODO_MARKER} content {}", encode_task_link(id));
            assert_eq!(parse_task_id(&text).as_deref(), Some(id), "id {id:?}");
        }
    }

    #[test]
    fn last_link_wins_when_content_quotes_a_link() {
        let quoted = encode_task_link("decoy");
        let text = format!("{TODO_MARKER} see {quoted} {}", encode_task_link("real"));
        assert_eq!(parse_task_id(&text).as_deref(), Some("real"));
    }

    #[test]
    fn text_without_link_has_no_id() {
        assert_eq!(parse_task_id("{{[[TODO]]}} plain block"), None);
        assert_eq!(parse_task_id("[todoist](https://example.com/?id=1)"), None);
        assert_eq!(parse_task_id("[todoist](https://todoist.com/showTask?id=)"), None);
        assert_eq!(parse_task_id("[todoist](https://todoist.com/showTask?id=4"), None);
    }

    #[test]
    fn status_marker_is_replaced_not_duplicated() {
        let text = format!("{TODO_MARKER} Buy milk {}", encode_task_link("1"));
        let done = set_status(&text, TaskStatus::Done);
        assert!(done.starts_with(DONE_MARKER));
        assert!(!done.contains(TODO_MARKER));
        assert_eq!(parse_status(&done), Some(TaskStatus::Done));
        assert_eq!(set_status("Loose note", TaskStatus::Done), "{{[[DONE]]}} Loose note");
    }

    #[test]
    fn strike_through_keeps_link_readable() {
        let text = format!("{TODO_MARKER} Buy milk #[[priority/p2]] {}", encode_task_link("42"));
        let struck = strike_through(&text);
        assert_eq!(
            struck,
            "{{[[DONE]]}} ~~Buy milk #[[priority/p2]]~~ [todoist](https://todoist.com/showTask?id=42)"
        );
        assert_eq!(parse_task_id(&struck).as_deref(), Some("42"));
    }

    #[test]
    fn date_titles_use_ordinal_suffixes() {
        let cases = [
            (1, "January 1st, 2024"),
            (2, "January 2nd, 2024"),
            (3, "January 3rd, 2024"),
            (11, "January 11th, 2024"),
            (12, "January 12th, 2024"),
            (13, "January 13th, 2024"),
            (21, "January 21st, 2024"),
            (22, "January 22nd, 2024"),
            (31, "January 31st, 2024"),
        ];
        for (day, expected) in cases {
            let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            assert_eq!(date_page_title(date), expected);
        }
    }

    #[test]
    fn due_dates_accept_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_due_date("2024-03-09"), expected);
        assert_eq!(parse_due_date("2024-03-09T10:00:00Z"), expected);
        assert_eq!(parse_due_date("2024-03-09T10:00:00"), expected);
        assert_eq!(parse_due_date("soon"), None);
    }

    #[test]
    fn capture_block_carries_creation_date_and_tags() {
        let mut t = task("5", "Idea");
        t.created_at = Some(Utc.with_ymd_and_hms(2024, 2, 3, 8, 0, 0).unwrap());
        assert_eq!(
            compose_capture_block(&t, Some("inbox")),
            "Idea created_at: [[February 3rd, 2024]] #[[Quick Capture]] #[[inbox]] \
             [todoist](https://todoist.com/showTask?id=5)"
        );
    }
}
