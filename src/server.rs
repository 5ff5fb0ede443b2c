//! MCP server exposing the Vikunja tools over rmcp.

use std::future::Future;
use std::sync::Arc;

use log::warn;
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::tool::{Parameters, ToolRouter},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};

use crate::http::VikunjaClient;
use crate::schemas::{
    AddReminderParams, AssignTaskParams, CreateLabelParams, CreateProjectParams,
    CreateTaskParams, DeleteLabelParams, DeleteProjectParams, DeleteReminderParams,
    DeleteTaskParams, FormatParams, GetProjectTasksParams, GetTaskParams, GetTasksByLabelParams,
    ListTasksParams, MoveTaskParams, RelationParams, ShareProjectParams, TaskLabelParams,
    TaskViewParams, TeamMembersParams, UpdateProjectParams, UpdateTaskParams,
};
use crate::tools::{ToolResult, advanced, labels, projects, tasks};

pub const SERVER_NAME: &str = "vikunja-mcp";

const INSTRUCTIONS: &str = "Manage tasks, projects, labels, reminders, relations and teams in a \
Vikunja instance. Project 1 is the Inbox. Use vikunja_list_projects and vikunja_list_labels to \
discover IDs before creating or moving tasks. List tools accept limit/offset for pagination and \
response_format ('markdown' or 'json'). Dates use the form YYYY-MM-DDTHH:MM:SSZ.";

#[derive(Clone)]
pub struct VikunjaServer {
    client: Arc<VikunjaClient>,
    tool_router: ToolRouter<VikunjaServer>,
}

impl VikunjaServer {
    pub fn new(client: Arc<VikunjaClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    pub fn client(&self) -> &VikunjaClient {
        &self.client
    }

    /// Failures become error results carrying the `Error: ...` text, never
    /// protocol errors.
    fn respond(tool: &str, result: ToolResult) -> Result<CallToolResult, ErrorData> {
        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                warn!("{} failed: {}", tool, e);
                Ok(CallToolResult::error(vec![Content::text(e.user_message())]))
            }
        }
    }
}

#[tool_router]
impl VikunjaServer {
    // Tasks

    #[tool(
        description = "Create a new task in a Vikunja project. Supports description, priority (0-5), start/due/end dates and RRULE recurrence. Returns the created task as JSON."
    )]
    async fn vikunja_create_task(
        &self,
        Parameters(params): Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_create_task", tasks::create_task(&self.client, params).await)
    }

    #[tool(
        description = "Get full details of a single task by ID: description, priority, dates, recurrence, labels and assignees."
    )]
    async fn vikunja_get_task(
        &self,
        Parameters(params): Parameters<GetTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_get_task", tasks::get_task(&self.client, params).await)
    }

    #[tool(
        description = "List tasks from one project or across all projects. Filter by completion and minimum priority, sort by id, title, priority, due_date, created or updated, and page with limit/offset."
    )]
    async fn vikunja_list_tasks(
        &self,
        Parameters(params): Parameters<ListTasksParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_list_tasks", tasks::list_tasks(&self.client, params).await)
    }

    #[tool(
        description = "Update an existing task. Only the provided fields change. Set done=true to complete a task; an empty repeats string removes recurrence."
    )]
    async fn vikunja_update_task(
        &self,
        Parameters(params): Parameters<UpdateTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_update_task", tasks::update_task(&self.client, params).await)
    }

    #[tool(description = "Permanently delete a task. This cannot be undone.")]
    async fn vikunja_delete_task(
        &self,
        Parameters(params): Parameters<DeleteTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_delete_task", tasks::delete_task(&self.client, params).await)
    }

    // Projects

    #[tool(
        description = "Create a new project, optionally nested under a parent project and with a #RRGGBB color."
    )]
    async fn vikunja_create_project(
        &self,
        Parameters(params): Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_create_project",
            projects::create_project(&self.client, params).await,
        )
    }

    #[tool(description = "List all projects accessible to the authenticated user.")]
    async fn vikunja_list_projects(
        &self,
        Parameters(params): Parameters<FormatParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_list_projects",
            projects::list_projects(&self.client, params).await,
        )
    }

    #[tool(description = "Update a project's title, description or color. Only the provided fields change.")]
    async fn vikunja_update_project(
        &self,
        Parameters(params): Parameters<UpdateProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_update_project",
            projects::update_project(&self.client, params).await,
        )
    }

    #[tool(description = "Permanently delete a project and all of its tasks. This cannot be undone.")]
    async fn vikunja_delete_project(
        &self,
        Parameters(params): Parameters<DeleteProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_delete_project",
            projects::delete_project(&self.client, params).await,
        )
    }

    #[tool(description = "List the tasks of a single project with limit/offset pagination.")]
    async fn vikunja_get_project_tasks(
        &self,
        Parameters(params): Parameters<GetProjectTasksParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_get_project_tasks",
            projects::get_project_tasks(&self.client, params).await,
        )
    }

    #[tool(description = "Move a task to a different project.")]
    async fn vikunja_move_task_to_project(
        &self,
        Parameters(params): Parameters<MoveTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_move_task_to_project",
            projects::move_task_to_project(&self.client, params).await,
        )
    }

    // Labels

    #[tool(description = "Create a new label with an optional description and #RRGGBB color.")]
    async fn vikunja_create_label(
        &self,
        Parameters(params): Parameters<CreateLabelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_create_label", labels::create_label(&self.client, params).await)
    }

    #[tool(description = "List all labels available to the authenticated user.")]
    async fn vikunja_list_labels(
        &self,
        Parameters(params): Parameters<FormatParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_list_labels", labels::list_labels(&self.client, params).await)
    }

    #[tool(description = "Permanently delete a label and remove it from all tasks.")]
    async fn vikunja_delete_label(
        &self,
        Parameters(params): Parameters<DeleteLabelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_delete_label", labels::delete_label(&self.client, params).await)
    }

    #[tool(description = "Attach an existing label to a task.")]
    async fn vikunja_add_label_to_task(
        &self,
        Parameters(params): Parameters<TaskLabelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_add_label_to_task",
            labels::add_label_to_task(&self.client, params).await,
        )
    }

    #[tool(description = "Remove a label from a task.")]
    async fn vikunja_remove_label_from_task(
        &self,
        Parameters(params): Parameters<TaskLabelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_remove_label_from_task",
            labels::remove_label_from_task(&self.client, params).await,
        )
    }

    #[tool(description = "List the tasks carrying a label, with limit/offset pagination.")]
    async fn vikunja_get_tasks_by_label(
        &self,
        Parameters(params): Parameters<GetTasksByLabelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_get_tasks_by_label",
            labels::get_tasks_by_label(&self.client, params).await,
        )
    }

    // Reminders, relations, teams

    #[tool(description = "Add a reminder to a task at the given date/time. Existing reminders are kept.")]
    async fn vikunja_add_reminder(
        &self,
        Parameters(params): Parameters<AddReminderParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_add_reminder", advanced::add_reminder(&self.client, params).await)
    }

    #[tool(description = "List the reminders of a task, numbered from 1.")]
    async fn vikunja_list_reminders(
        &self,
        Parameters(params): Parameters<TaskViewParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_list_reminders",
            advanced::list_reminders(&self.client, params).await,
        )
    }

    #[tool(
        description = "Delete one reminder from a task by its 1-based index as shown by vikunja_list_reminders."
    )]
    async fn vikunja_delete_reminder(
        &self,
        Parameters(params): Parameters<DeleteReminderParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_delete_reminder",
            advanced::delete_reminder(&self.client, params).await,
        )
    }

    #[tool(
        description = "Create a relationship between two tasks: subtask, parenttask, related, duplicateof, duplicates, blocking, blocked, precedes, follows, copiedfrom or copiedto."
    )]
    async fn vikunja_create_relation(
        &self,
        Parameters(params): Parameters<RelationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_create_relation",
            advanced::create_relation(&self.client, params).await,
        )
    }

    #[tool(description = "Show all relationships of a task, grouped by relation kind.")]
    async fn vikunja_get_relations(
        &self,
        Parameters(params): Parameters<TaskViewParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_get_relations",
            advanced::get_relations(&self.client, params).await,
        )
    }

    #[tool(description = "Delete a relationship between two tasks.")]
    async fn vikunja_delete_relation(
        &self,
        Parameters(params): Parameters<RelationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_delete_relation",
            advanced::delete_relation(&self.client, params).await,
        )
    }

    #[tool(description = "List the teams the authenticated user belongs to.")]
    async fn vikunja_list_teams(
        &self,
        Parameters(params): Parameters<FormatParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_list_teams", advanced::list_teams(&self.client, params).await)
    }

    #[tool(description = "List the members of a team.")]
    async fn vikunja_get_team_members(
        &self,
        Parameters(params): Parameters<TeamMembersParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_get_team_members",
            advanced::get_team_members(&self.client, params).await,
        )
    }

    #[tool(description = "Assign a task to a user.")]
    async fn vikunja_assign_task(
        &self,
        Parameters(params): Parameters<AssignTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond("vikunja_assign_task", advanced::assign_task(&self.client, params).await)
    }

    #[tool(
        description = "Share a project with a team. permission_level: 0=read only, 1=read and write, 2=admin."
    )]
    async fn vikunja_share_project(
        &self,
        Parameters(params): Parameters<ShareProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Self::respond(
            "vikunja_share_project",
            advanced::share_project(&self.client, params).await,
        )
    }
}

#[tool_handler]
impl ServerHandler for VikunjaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::client;
    use crate::tools::ToolError;

    fn server(url: &str) -> VikunjaServer {
        VikunjaServer::new(Arc::new(client(url)))
    }

    #[test]
    fn test_registers_all_tools() {
        let server = server("http://127.0.0.1:1");
        let mut names: Vec<String> = server.tool_router.map.keys().map(|k| k.to_string()).collect();
        names.sort();

        assert_eq!(names.len(), 27);
        assert!(names.iter().all(|n| n.starts_with("vikunja_")));
        for expected in [
            "vikunja_create_task",
            "vikunja_list_tasks",
            "vikunja_move_task_to_project",
            "vikunja_get_tasks_by_label",
            "vikunja_delete_reminder",
            "vikunja_share_project",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_server_info() {
        let info = server("http://127.0.0.1:1").get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap_or_default().contains("vikunja_list_projects"));
    }

    #[test]
    fn test_respond_marks_errors() {
        let ok = VikunjaServer::respond("t", Ok("done".to_string())).unwrap();
        assert_eq!(ok.is_error, Some(false));

        let err = VikunjaServer::respond("t", Err(ToolError::Message("nope".to_string()))).unwrap();
        assert_eq!(err.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_tool_call_reaches_api() {
        let mut mock_server = mockito::Server::new_async().await;
        let mock = mock_server
            .mock("DELETE", "/api/v1/tasks/7")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let server = server(&mock_server.url());
        let result = server
            .vikunja_delete_task(Parameters(DeleteTaskParams { task_id: 7 }))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.is_error, Some(false));
    }

    #[tokio::test]
    async fn test_tool_call_validation_error_is_result() {
        let server = server("http://127.0.0.1:1");
        let result = server
            .vikunja_get_task(Parameters(GetTaskParams {
                task_id: 0,
                response_format: Default::default(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_shares_one_client() {
        let server = server("http://127.0.0.1:1");
        let cloned = server.clone();
        assert!(std::ptr::eq(server.client(), cloned.client()));
    }
}
