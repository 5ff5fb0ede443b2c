//! Projects and moving tasks between them.

use serde_json::{Map, Value, json};

use super::{ToolResult, as_list, extract_tasks, render_task_page};
use crate::format::{format_json, format_projects_markdown, truncate_response};
use crate::http::VikunjaClient;
use crate::pagination::{normalize, page_for};
use crate::schemas::{
    CreateProjectParams, DeleteProjectParams, FormatParams, GetProjectTasksParams,
    MoveTaskParams, ResponseFormat, UpdateProjectParams, Validate,
};

#[tracing::instrument(skip(client))]
pub async fn create_project(client: &VikunjaClient, mut params: CreateProjectParams) -> ToolResult {
    params.validate()?;

    let mut payload = Map::new();
    payload.insert("title".into(), json!(params.title));
    payload.insert("description".into(), json!(params.description));
    if let Some(color) = params.hex_color.filter(|c| !c.is_empty()) {
        payload.insert("hex_color".into(), json!(color));
    }
    if let Some(parent) = params.parent_project_id {
        payload.insert("parent_project_id".into(), json!(parent));
    }

    let response = client.put("projects", &Value::Object(payload)).await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn list_projects(client: &VikunjaClient, mut params: FormatParams) -> ToolResult {
    params.validate()?;

    let response = client.get("projects").await?;
    Ok(match params.response_format {
        ResponseFormat::Markdown => truncate_response(format_projects_markdown(&as_list(&response))),
        ResponseFormat::Json => format_json(&response),
    })
}

#[tracing::instrument(skip(client))]
pub async fn update_project(client: &VikunjaClient, mut params: UpdateProjectParams) -> ToolResult {
    params.validate()?;

    let mut payload = Map::new();
    if let Some(title) = params.title {
        payload.insert("title".into(), json!(title));
    }
    if let Some(description) = params.description {
        payload.insert("description".into(), json!(description));
    }
    if let Some(color) = params.hex_color {
        payload.insert("hex_color".into(), json!(color));
    }

    let response = client
        .post(&format!("projects/{}", params.project_id), &Value::Object(payload))
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn delete_project(client: &VikunjaClient, mut params: DeleteProjectParams) -> ToolResult {
    params.validate()?;

    client.delete(&format!("projects/{}", params.project_id)).await?;
    Ok(format!(
        "Project #{} has been successfully deleted.",
        params.project_id
    ))
}

#[tracing::instrument(skip(client))]
pub async fn get_project_tasks(
    client: &VikunjaClient,
    mut params: GetProjectTasksParams,
) -> ToolResult {
    params.validate()?;
    let (limit, offset) = normalize(params.limit, params.offset);

    let query = [
        ("per_page", limit.to_string()),
        ("page", page_for(offset, limit).to_string()),
    ];
    let response = client
        .get_with_query(&format!("projects/{}/tasks", params.project_id), &query)
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

#[tracing::instrument(skip(client))]
pub async fn move_task_to_project(client: &VikunjaClient, mut params: MoveTaskParams) -> ToolResult {
    params.validate()?;

    let response = client
        .post(
            &format!("tasks/{}", params.task_id),
            &json!({"project_id": params.target_project_id}),
        )
        .await?;
    Ok(format_json(&response))
}
