//! Response rendering for tool output: Markdown and JSON, plus truncation of
//! oversize responses.

mod dates;
mod markdown;

use serde::Serialize;

pub use dates::{format_rrule, format_timestamp, is_unset_date};
pub use markdown::{
    format_labels_markdown, format_project_markdown, format_projects_markdown,
    format_relations_markdown, format_reminders_markdown, format_task_markdown,
    format_tasks_list_markdown, format_team_members_markdown, format_teams_markdown,
    priority_label,
};

/// Maximum response size in characters.
pub const CHARACTER_LIMIT: usize = 25_000;

/// Room left for the truncation notice.
const TRUNCATION_MARGIN: usize = 500;

/// Pretty-prints `data` with two-space indentation. Non-ASCII text is kept as is.
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize response: {}\"}}", e))
}

/// Cuts responses over [`CHARACTER_LIMIT`] characters and appends a notice
/// pointing at pagination and filters.
pub fn truncate_response(response: String) -> String {
    if response.chars().count() <= CHARACTER_LIMIT {
        return response;
    }

    let mut truncated: String = response
        .chars()
        .take(CHARACTER_LIMIT - TRUNCATION_MARGIN)
        .collect();
    truncated.push_str(&format!(
        "\n\n---\n**Response Truncated**\n\n\
         The response exceeded {} characters and was truncated. \
         Use pagination parameters (limit, offset) or add filters to reduce the result set.",
        CHARACTER_LIMIT
    ));
    truncated
}
