//! Reminders, task relations, teams, assignment and sharing.

use serde_json::{Value, json};

use super::{ToolError, ToolResult, as_list};
use crate::format::{
    format_json, format_relations_markdown, format_reminders_markdown, format_team_members_markdown,
    format_teams_markdown, format_timestamp, truncate_response,
};
use crate::http::VikunjaClient;
use crate::schemas::{
    AddReminderParams, AssignTaskParams, DeleteReminderParams, FormatParams, RelationParams,
    ResponseFormat, ShareProjectParams, TaskViewParams, TeamMembersParams, Validate,
};

/// Reminders of a task response; null or missing means none.
fn reminders_of(task: &Value) -> Vec<Value> {
    task.get("reminders").map(as_list).unwrap_or_default()
}

#[tracing::instrument(skip(client))]
pub async fn add_reminder(client: &VikunjaClient, mut params: AddReminderParams) -> ToolResult {
    params.validate()?;
    let endpoint = format!("tasks/{}", params.task_id);

    let task = client.get(&endpoint).await?;
    let mut reminders = reminders_of(&task);
    reminders.push(json!({"reminder": params.reminder_date}));

    let response = client
        .post(&endpoint, &json!({"reminders": reminders}))
        .await?;
    Ok(format_json(&json!({
        "task_id": params.task_id,
        "reminders": reminders_of(&response),
    })))
}

#[tracing::instrument(skip(client))]
pub async fn list_reminders(client: &VikunjaClient, mut params: TaskViewParams) -> ToolResult {
    params.validate()?;

    let task = client.get(&format!("tasks/{}", params.task_id)).await?;
    let reminders = reminders_of(&task);
    Ok(match params.response_format {
        ResponseFormat::Markdown => format_reminders_markdown(params.task_id, &reminders),
        ResponseFormat::Json => format_json(&json!({"reminders": reminders})),
    })
}

#[tracing::instrument(skip(client))]
pub async fn delete_reminder(client: &VikunjaClient, mut params: DeleteReminderParams) -> ToolResult {
    params.validate()?;
    let endpoint = format!("tasks/{}", params.task_id);

    let task = client.get(&endpoint).await?;
    let mut reminders = reminders_of(&task);

    let position = usize::try_from(params.reminder_index - 1)
        .ok()
        .filter(|&i| i < reminders.len())
        .ok_or_else(|| {
            ToolError::Message(format!(
                "Reminder index {} is out of range. Task has {} reminder(s).",
                params.reminder_index,
                reminders.len()
            ))
        })?;

    let removed = reminders.remove(position);
    let removed_date = removed
        .get("reminder")
        .and_then(Value::as_str)
        .map(format_timestamp)
        .unwrap_or_else(|| "unknown".to_string());

    client
        .post(&endpoint, &json!({"reminders": reminders}))
        .await?;
    Ok(format!(
        "Reminder at index {} ({}) deleted from task #{}.",
        params.reminder_index, removed_date, params.task_id
    ))
}

#[tracing::instrument(skip(client))]
pub async fn create_relation(client: &VikunjaClient, mut params: RelationParams) -> ToolResult {
    params.validate()?;

    let payload = json!({
        "other_task_id": params.other_task_id,
        "relation_kind": params.relation_kind.as_str(),
    });
    let response = client
        .put(&format!("tasks/{}/relations", params.task_id), &payload)
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn get_relations(client: &VikunjaClient, mut params: TaskViewParams) -> ToolResult {
    params.validate()?;

    let task = client.get(&format!("tasks/{}", params.task_id)).await?;
    let related = match task.get("related_tasks") {
        Some(Value::Null) | None => json!({}),
        Some(related) => related.clone(),
    };
    Ok(match params.response_format {
        ResponseFormat::Markdown => {
            truncate_response(format_relations_markdown(params.task_id, &related))
        }
        ResponseFormat::Json => format_json(&json!({"related_tasks": related})),
    })
}

#[tracing::instrument(skip(client))]
pub async fn delete_relation(client: &VikunjaClient, mut params: RelationParams) -> ToolResult {
    params.validate()?;
    let kind = params.relation_kind.as_str();

    client
        .delete(&format!(
            "tasks/{}/relations/{}/{}",
            params.task_id, kind, params.other_task_id
        ))
        .await?;
    Ok(format!(
        "Relationship '{}' between task #{} and #{} deleted.",
        kind, params.task_id, params.other_task_id
    ))
}

#[tracing::instrument(skip(client))]
pub async fn list_teams(client: &VikunjaClient, mut params: FormatParams) -> ToolResult {
    params.validate()?;

    let response = client.get("teams").await?;
    Ok(match params.response_format {
        ResponseFormat::Markdown => truncate_response(format_teams_markdown(&as_list(&response))),
        ResponseFormat::Json => format_json(&response),
    })
}

#[tracing::instrument(skip(client))]
pub async fn get_team_members(client: &VikunjaClient, mut params: TeamMembersParams) -> ToolResult {
    params.validate()?;

    let response = client
        .get(&format!("teams/{}/members", params.team_id))
        .await?;
    Ok(match params.response_format {
        ResponseFormat::Markdown => {
            format_team_members_markdown(params.team_id, &as_list(&response))
        }
        ResponseFormat::Json => format_json(&response),
    })
}

#[tracing::instrument(skip(client))]
pub async fn assign_task(client: &VikunjaClient, mut params: AssignTaskParams) -> ToolResult {
    params.validate()?;

    let response = client
        .put(
            &format!("tasks/{}/assignees", params.task_id),
            &json!({"user_id": params.user_id}),
        )
        .await?;
    Ok(format_json(&response))
}

#[tracing::instrument(skip(client))]
pub async fn share_project(client: &VikunjaClient, mut params: ShareProjectParams) -> ToolResult {
    params.validate()?;

    let payload = json!({
        "team_id": params.team_id,
        "right": params.permission_level,
    });
    let response = client
        .put(&format!("projects/{}/teams", params.project_id), &payload)
        .await?;
    Ok(format_json(&response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::client;
    use mockito::Matcher;

    fn params<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_add_reminder_appends_to_existing() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/api/v1/tasks/5")
            .with_status(200)
            .with_body(r#"{"id": 5, "reminders": [{"reminder": "2025-12-24T09:00:00Z"}]}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/api/v1/tasks/5")
            .match_body(Matcher::Json(json!({"reminders": [
                {"reminder": "2025-12-24T09:00:00Z"},
                {"reminder": "2025-12-25T09:00:00Z"}
            ]})))
            .with_status(200)
            .with_body(r#"{"id": 5, "reminders": [{"reminder": "2025-12-24T09:00:00Z"}, {"reminder": "2025-12-25T09:00:00Z"}]}"#)
            .create_async()
            .await;

        let out = add_reminder(
            &client(&server.url()),
            params(json!({"task_id": 5, "reminder_date": "2025-12-25T09:00:00Z"})),
        )
        .await
        .unwrap();

        get.assert_async().await;
        post.assert_async().await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["task_id"], 5);
        assert_eq!(parsed["reminders"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_add_reminder_to_task_with_null_reminders() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/api/v1/tasks/5")
            .with_status(200)
            .with_body(r#"{"id": 5, "reminders": null}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/api/v1/tasks/5")
            .match_body(Matcher::Json(json!({"reminders": [{"reminder": "2025-12-25T09:00:00Z"}]})))
            .with_status(200)
            .with_body(r#"{"id": 5}"#)
            .create_async()
            .await;

        let out = add_reminder(
            &client(&server.url()),
            params(json!({"task_id": 5, "reminder_date": "2025-12-25T09:00:00Z"})),
        )
        .await
        .unwrap();

        post.assert_async().await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["reminders"], json!([]));
    }

    #[tokio::test]
    async fn test_list_reminders_markdown() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/9")
            .with_status(200)
            .with_body(r#"{"id": 9, "reminders": [{"reminder": "2025-12-25T09:00:00Z"}]}"#)
            .create_async()
            .await;

        let out = list_reminders(&client(&server.url()), params(json!({"task_id": 9})))
            .await
            .unwrap();
        assert_eq!(out, "# Reminders for Task #9\n\n1. 2025-12-25 09:00:00 UTC");
    }

    #[tokio::test]
    async fn test_delete_reminder_out_of_range_makes_no_update() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/api/v1/tasks/5")
            .with_status(200)
            .with_body(r#"{"id": 5, "reminders": [{"reminder": "2025-12-25T09:00:00Z"}]}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/api/v1/tasks/5")
            .expect(0)
            .create_async()
            .await;

        let err = delete_reminder(
            &client(&server.url()),
            params(json!({"task_id": 5, "reminder_index": 3})),
        )
        .await
        .unwrap_err();

        post.assert_async().await;
        assert_eq!(
            err.user_message(),
            "Error: Reminder index 3 is out of range. Task has 1 reminder(s)."
        );
    }

    #[tokio::test]
    async fn test_delete_reminder_removes_entry() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/api/v1/tasks/5")
            .with_status(200)
            .with_body(
                r#"{"id": 5, "reminders": [{"reminder": "2025-12-24T09:00:00Z"}, {"reminder": "2025-12-25T09:00:00Z"}]}"#,
            )
            .create_async()
            .await;
        let post = server
            .mock("POST", "/api/v1/tasks/5")
            .match_body(Matcher::Json(json!({"reminders": [{"reminder": "2025-12-25T09:00:00Z"}]})))
            .with_status(200)
            .with_body(r#"{"id": 5}"#)
            .create_async()
            .await;

        let out = delete_reminder(
            &client(&server.url()),
            params(json!({"task_id": 5, "reminder_index": 1})),
        )
        .await
        .unwrap();

        post.assert_async().await;
        assert_eq!(
            out,
            "Reminder at index 1 (2025-12-24 09:00:00 UTC) deleted from task #5."
        );
    }

    #[tokio::test]
    async fn test_create_and_delete_relation() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("PUT", "/api/v1/tasks/1/relations")
            .match_body(Matcher::Json(json!({"other_task_id": 2, "relation_kind": "blocking"})))
            .with_status(201)
            .with_body(r#"{"task_id": 1, "other_task_id": 2, "relation_kind": "blocking"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/v1/tasks/1/relations/blocking/2")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let c = client(&server.url());
        let relation = json!({"task_id": 1, "other_task_id": 2, "relation_kind": "blocking"});

        create_relation(&c, params(relation.clone())).await.unwrap();
        let out = delete_relation(&c, params(relation)).await.unwrap();

        create.assert_async().await;
        delete.assert_async().await;
        assert_eq!(out, "Relationship 'blocking' between task #1 and #2 deleted.");
    }

    #[tokio::test]
    async fn test_relation_rejects_unknown_kind() {
        let result = serde_json::from_value::<RelationParams>(
            json!({"task_id": 1, "other_task_id": 2, "relation_kind": "parent"}),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_relations_formats() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/1")
            .with_status(200)
            .with_body(r#"{"id": 1, "related_tasks": {"subtask": [{"id": 2, "title": "Child"}]}}"#)
            .expect(2)
            .create_async()
            .await;
        let c = client(&server.url());

        let md = get_relations(&c, params(json!({"task_id": 1}))).await.unwrap();
        assert_eq!(md, "# Relationships for Task #1\n\n## Subtask\n- **#2**: Child\n");

        let raw = get_relations(&c, params(json!({"task_id": 1, "response_format": "json"})))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["related_tasks"]["subtask"][0]["id"], 2);
    }

    #[tokio::test]
    async fn test_get_relations_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tasks/1")
            .with_status(200)
            .with_body(r#"{"id": 1, "related_tasks": null}"#)
            .create_async()
            .await;

        let md = get_relations(&client(&server.url()), params(json!({"task_id": 1})))
            .await
            .unwrap();
        assert_eq!(md, "No relationships defined for this task.");
    }

    #[tokio::test]
    async fn test_teams_and_members() {
        let mut server = mockito::Server::new_async().await;
        let _teams = server
            .mock("GET", "/api/v1/teams")
            .with_status(200)
            .with_body(r#"[{"id": 3, "name": "Ops"}]"#)
            .create_async()
            .await;
        let _members = server
            .mock("GET", "/api/v1/teams/3/members")
            .with_status(200)
            .with_body(r#"[{"id": 1, "username": "sam"}]"#)
            .create_async()
            .await;
        let c = client(&server.url());

        let teams = list_teams(&c, params(json!({}))).await.unwrap();
        assert_eq!(teams, "# Teams (1)\n\n## Ops (#3)\n");

        let members = get_team_members(&c, params(json!({"team_id": 3}))).await.unwrap();
        assert_eq!(members, "# Team #3 Members (1)\n\n- **sam** (#1)");
    }

    #[tokio::test]
    async fn test_assign_task_and_share_project() {
        let mut server = mockito::Server::new_async().await;
        let assign = server
            .mock("PUT", "/api/v1/tasks/123/assignees")
            .match_body(Matcher::Json(json!({"user_id": 7})))
            .with_status(201)
            .with_body(r#"{"user_id": 7}"#)
            .create_async()
            .await;
        let share = server
            .mock("PUT", "/api/v1/projects/5/teams")
            .match_body(Matcher::Json(json!({"team_id": 3, "right": 1})))
            .with_status(201)
            .with_body(r#"{"team_id": 3, "right": 1}"#)
            .create_async()
            .await;
        let c = client(&server.url());

        assign_task(&c, params(json!({"task_id": 123, "user_id": 7})))
            .await
            .unwrap();
        share_project(
            &c,
            params(json!({"project_id": 5, "team_id": 3, "permission_level": 1})),
        )
        .await
        .unwrap();

        assign.assert_async().await;
        share.assert_async().await;
    }

    #[tokio::test]
    async fn test_share_project_rejects_admin_plus() {
        let err = share_project(
            &client("http://127.0.0.1:1"),
            params(json!({"project_id": 5, "team_id": 3, "permission_level": 3})),
        )
        .await
        .unwrap_err();
        assert!(err.user_message().contains("'permission_level'"));
    }
}
