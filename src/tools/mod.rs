//! Tool handlers: validate parameters, issue one or two client requests,
//! render the result.
//!
//! Every handler has the shape
//! `async fn(&VikunjaClient, Params) -> Result<String, ToolError>`.

pub mod advanced;
mod error;
pub mod labels;
pub mod projects;
pub mod tasks;

use serde_json::Value;

use crate::format::{format_json, format_tasks_list_markdown, truncate_response};
use crate::pagination::paginated_tasks;
use crate::schemas::ResponseFormat;

pub use error::{ToolError, describe_api_error};

pub type ToolResult = Result<String, ToolError>;

/// Items of a list response; anything but an array counts as empty.
pub(crate) fn as_list(response: &Value) -> Vec<Value> {
    response.as_array().cloned().unwrap_or_default()
}

/// Tasks and total from a list response. Arrays carry no total, so their
/// length is used.
pub(crate) fn extract_tasks(response: &Value) -> (Vec<Value>, usize) {
    match response {
        Value::Array(tasks) => (tasks.clone(), tasks.len()),
        Value::Object(map) => {
            let tasks = map
                .get("tasks")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let total = map
                .get("total")
                .and_then(Value::as_u64)
                .and_then(|t| usize::try_from(t).ok())
                .unwrap_or(tasks.len());
            (tasks, total)
        }
        _ => (Vec::new(), 0),
    }
}

/// Renders a page of tasks in the requested format, truncated.
pub(crate) fn render_task_page(
    tasks: &[Value],
    total: usize,
    limit: usize,
    offset: usize,
    format: ResponseFormat,
    detailed: bool,
) -> String {
    let rendered = match format {
        ResponseFormat::Markdown => format_tasks_list_markdown(tasks, total, offset, detailed),
        ResponseFormat::Json => format_json(&paginated_tasks(tasks, total, limit, offset)),
    };
    truncate_response(rendered)
}
