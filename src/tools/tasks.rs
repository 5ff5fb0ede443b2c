//! Task lifecycle: create, read, list, update, delete.

use serde_json::{Map, Value, json};

use super::{ToolResult, extract_tasks, render_task_page};
use crate::format::{format_json, format_task_markdown};
use crate::http::VikunjaClient;
use crate::pagination::{normalize, page_for};
use crate::schemas::{
    CreateTaskParams, DeleteTaskParams, DetailLevel, GetTaskParams, ListTasksParams,
    ResponseFormat, UpdateTaskParams, Validate,
};

#[tracing::instrument(skip(client))]
pub async fn create_task(client: &VikunjaClient, mut params: CreateTaskParams) -> ToolResult {
    params.validate()?;

    let mut payload = Map::new();
    payload.insert("title".into(), json!(params.title));
    payload.insert("description".into(), json!(params.description));
    payload.insert("priority".into(), json!(params.priority));
    for (key, value) in [
        ("due_date", params.due_date),
        ("start_date", params.start_date),
        ("end_date", params.end_date),
        ("repeats", params.repeats),
    ] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            payload.insert(key.into(), json!(value));
        }
    }
    if let Some(from_current) = params.repeats_from_current_date {
        payload.insert("repeats_from_current_date".into(), json!(from_current));
    }

    let response = client
        .put(
            &format!("projects/{}/tasks", params.project_id),
            &Value::Object(payload),
        )
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn get_task(client: &VikunjaClient, mut params: GetTaskParams) -> ToolResult {
    params.validate()?;

    let task = client.get(&format!("tasks/{}", params.task_id)).await?;
    Ok(match params.response_format {
        ResponseFormat::Markdown => format_task_markdown(&task, true),
        ResponseFormat::Json => format_json(&task),
    })
}

fn list_query(params: &ListTasksParams, limit: usize, offset: usize) -> Vec<(&'static str, String)> {
    let mut filters: Vec<(&str, String, &str)> = Vec::new();
    if let Some(done) = params.filter_done {
        filters.push(("done", done.to_string(), "equals"));
    }
    if let Some(priority) = params.filter_priority {
        filters.push(("priority", priority.to_string(), "greater_equals"));
    }

    let mut query = Vec::new();
    query.extend(filters.iter().map(|(field, _, _)| ("filter_by", field.to_string())));
    query.extend(filters.iter().map(|(_, value, _)| ("filter_value", value.clone())));
    query.extend(filters.iter().map(|(_, _, cmp)| ("filter_comparator", cmp.to_string())));
    query.push(("filter_concat", "and".to_string()));
    query.push(("sort_by", params.sort_by.as_str().to_string()));
    query.push(("order_by", params.sort_order.as_str().to_string()));
    query.push(("per_page", limit.to_string()));
    query.push(("page", page_for(offset, limit).to_string()));
    query
}

#[tracing::instrument(skip(client))]
pub async fn list_tasks(client: &VikunjaClient, mut params: ListTasksParams) -> ToolResult {
    params.validate()?;
    let (limit, offset) = normalize(params.limit, params.offset);

    let endpoint = match params.project_id {
        Some(project_id) => format!("projects/{}/tasks", project_id),
        None => "tasks/all".to_string(),
    };
    let query = list_query(&params, limit, offset);
    let response = client.get_with_query(&endpoint, &query).await?;

    let (tasks, total) = extract_tasks(&response);
    Ok(render_task_page(
        &tasks,
        total,
        limit,
        offset,
        params.response_format,
        params.detail_level == DetailLevel::Detailed,
    ))
}

#[tracing::instrument(skip(client))]
pub async fn update_task(client: &VikunjaClient, mut params: UpdateTaskParams) -> ToolResult {
    params.validate()?;

    let mut payload = Map::new();
    if let Some(title) = params.title {
        payload.insert("title".into(), json!(title));
    }
    if let Some(description) = params.description {
        payload.insert("description".into(), json!(description));
    }
    if let Some(done) = params.done {
        payload.insert("done".into(), json!(done));
    }
    if let Some(priority) = params.priority {
        payload.insert("priority".into(), json!(priority));
    }
    if let Some(due_date) = params.due_date {
        payload.insert("due_date".into(), json!(due_date));
    }
    if let Some(repeats) = params.repeats {
        payload.insert("repeats".into(), json!(repeats));
    }
    if let Some(from_current) = params.repeats_from_current_date {
        payload.insert("repeats_from_current_date".into(), json!(from_current));
    }

    let response = client
        .post(&format!("tasks/{}", params.task_id), &Value::Object(payload))
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn delete_task(client: &VikunjaClient, mut params: DeleteTaskParams) -> ToolResult {
    params.validate()?;

    client.delete(&format!("tasks/{}", params.task_id)).await?;
    Ok(format!("Task #{} has been successfully deleted.", params.task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolError;
    use crate::tools::test_support::client;
    use mockito::Matcher;

    fn params<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_task_sends_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/projects/5/tasks")
            .match_body(Matcher::Json(json!({
                "title": "Deploy v2.0",
                "description": "",
                "priority": 4,
                "due_date": "2025-12-31T23:59:59Z",
                "repeats": "FREQ=WEEKLY"
            })))
            .with_status(201)
            .with_body(r#"{"id": 99, "title": "Deploy v2.0", "done": false}"#)
            .create_async()
            .await;

        let out = create_task(
            &client(&server.url()),
            params(json!({
                "project_id": 5,
                "title": " Deploy v2.0 ",
                "priority": 4,
                "due_date": "2025-12-31T23:59:59Z",
                "repeats": "FREQ=WEEKLY"
            })),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["id"], 99);
    }

    #[tokio::test]
    async fn test_create_task_validation_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = create_task(&client(&server.url()), params(json!({"title": "   "})))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(err.user_message().starts_with("Error: Invalid value for 'title'"));
    }

    #[tokio::test]
    async fn test_get_task_markdown_and_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/1")
            .with_status(200)
            .with_body(r#"{"id": 1, "title": "Test Task", "done": false, "priority": 2}"#)
            .expect(2)
            .create_async()
            .await;
        let c = client(&server.url());

        let md = get_task(&c, params(json!({"task_id": 1}))).await.unwrap();
        assert!(md.starts_with("## ○ Test Task (#1)"));
        assert!(md.contains("- **Priority**: Medium"));

        let raw = get_task(&c, params(json!({"task_id": 1, "response_format": "json"})))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!({"id": 1, "title": "Test Task", "done": false, "priority": 2}));
    }

    #[tokio::test]
    async fn test_get_task_not_found_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/404")
            .with_status(404)
            .create_async()
            .await;

        let err = get_task(&client(&server.url()), params(json!({"task_id": 404})))
            .await
            .unwrap_err();
        assert!(err.user_message().starts_with("Error: Resource not found"));
    }

    #[test]
    fn test_list_query_repeats_filter_keys() {
        let list: ListTasksParams = params(json!({"filter_done": true, "filter_priority": 2}));
        let query = list_query(&list, 20, 40);
        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("filter_by", "done"),
                ("filter_by", "priority"),
                ("filter_value", "true"),
                ("filter_value", "2"),
                ("filter_comparator", "equals"),
                ("filter_comparator", "greater_equals"),
                ("filter_concat", "and"),
                ("sort_by", "id"),
                ("order_by", "asc"),
                ("per_page", "20"),
                ("page", "3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_tasks_builds_filter_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/projects/5/tasks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter_by".into(), "priority".into()),
                Matcher::UrlEncoded("filter_value".into(), "3".into()),
                Matcher::UrlEncoded("filter_comparator".into(), "greater_equals".into()),
                Matcher::UrlEncoded("filter_concat".into(), "and".into()),
                Matcher::UrlEncoded("sort_by".into(), "due_date".into()),
                Matcher::UrlEncoded("order_by".into(), "desc".into()),
                Matcher::UrlEncoded("per_page".into(), "10".into()),
                Matcher::UrlEncoded("page".into(), "3".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": 21, "title": "Late", "priority": 4}]"#)
            .create_async()
            .await;

        let out = list_tasks(
            &client(&server.url()),
            params(json!({
                "project_id": 5,
                "filter_priority": 3,
                "sort_by": "due_date",
                "sort_order": "desc",
                "limit": 10,
                "offset": 25
            })),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert!(out.starts_with("# Tasks (1 of 1)"));
        assert!(out.contains("- ○ **#21**: Late 🔴"));
    }

    #[tokio::test]
    async fn test_list_tasks_all_projects_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tasks/all")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "20".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": 1}, {"id": 2}]"#)
            .create_async()
            .await;

        let out = list_tasks(
            &client(&server.url()),
            params(json!({"response_format": "json"})),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total"], 2);
        assert_eq!(parsed["count"], 2);
        assert_eq!(parsed["has_more"], false);
        assert_eq!(parsed["next_offset"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_tasks_truncates_huge_output() {
        let tasks: Vec<Value> = (1..=100)
            .map(|i| json!({"id": i, "title": "x".repeat(400)}))
            .collect();
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/all")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(Value::Array(tasks).to_string())
            .create_async()
            .await;

        let out = list_tasks(&client(&server.url()), params(json!({"limit": 100})))
            .await
            .unwrap();
        assert!(out.contains("**Response Truncated**"));
    }

    #[tokio::test]
    async fn test_update_task_sends_only_provided_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/tasks/123")
            .match_body(Matcher::Json(json!({"done": true, "priority": 3, "repeats": ""})))
            .with_status(200)
            .with_body(r#"{"id": 123, "done": true}"#)
            .create_async()
            .await;

        update_task(
            &client(&server.url()),
            params(json!({"task_id": 123, "done": true, "priority": 3, "repeats": ""})),
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_task_confirmation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/v1/tasks/7")
            .with_status(200)
            .with_body(r#"{"message": "Successfully deleted."}"#)
            .create_async()
            .await;

        let out = delete_task(&client(&server.url()), params(json!({"task_id": 7})))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, "Task #7 has been successfully deleted.");
    }
}
