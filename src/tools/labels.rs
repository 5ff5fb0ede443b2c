//! Labels and label assignment.

use serde_json::{Value, json};

use super::{ToolResult, as_list, extract_tasks, render_task_page};
use crate::format::{format_json, format_labels_markdown, truncate_response};
use crate::http::VikunjaClient;
use crate::pagination::{normalize, page_for};
use crate::schemas::{
    CreateLabelParams, DeleteLabelParams, FormatParams, GetTasksByLabelParams, ResponseFormat,
    TaskLabelParams, Validate,
};

#[tracing::instrument(skip(client))]
pub async fn create_label(client: &VikunjaClient, mut params: CreateLabelParams) -> ToolResult {
    params.validate()?;

    let payload = json!({
        "title": params.title,
        "description": params.description,
        "hex_color": params.hex_color,
    });
    let response = client.put("labels", &payload).await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn list_labels(client: &VikunjaClient, mut params: FormatParams) -> ToolResult {
    params.validate()?;

    let response = client.get("labels").await?;
    Ok(match params.response_format {
        ResponseFormat::Markdown => truncate_response(format_labels_markdown(&as_list(&response))),
        ResponseFormat::Json => format_json(&response),
    })
}

#[tracing::instrument(skip(client))]
pub async fn delete_label(client: &VikunjaClient, mut params: DeleteLabelParams) -> ToolResult {
    params.validate()?;

    client.delete(&format!("labels/{}", params.label_id)).await?;
    Ok(format!("Label #{} has been successfully deleted.", params.label_id))
}

#[tracing::instrument(skip(client))]
pub async fn add_label_to_task(client: &VikunjaClient, mut params: TaskLabelParams) -> ToolResult {
    params.validate()?;

    let response = client
        .put(
            &format!("tasks/{}/labels", params.task_id),
            &json!({"label_id": params.label_id}),
        )
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn remove_label_from_task(
    client: &VikunjaClient,
    mut params: TaskLabelParams,
) -> ToolResult {
    params.validate()?;

    client
        .delete(&format!("tasks/{}/labels/{}", params.task_id, params.label_id))
        .await?;
    Ok(format!(
        "Label #{} removed from task #{}.",
        params.label_id, params.task_id
    ))
}

#[tracing::instrument(skip(client))]
pub async fn get_tasks_by_label(
    client: &VikunjaClient,
    mut params: GetTasksByLabelParams,
) -> ToolResult {
    params.validate()?;
    let (limit, offset) = normalize(params.limit, params.offset);

    let query = [
        ("per_page", limit.to_string()),
        ("page", page_for(offset, limit).to_string()),
    ];
    let response: Value = client
        .get_with_query(&format!("labels/{}/tasks", params.label_id), &query)
        .await?;

    let (tasks, total) = extract_tasks(&response);
    Ok(render_task_page(
        &tasks,
        total,
        limit,
        offset,
        params.response_format,
        false,
    ))
}
