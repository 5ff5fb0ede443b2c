use schemars::JsonSchema;
use serde::Deserialize;

use super::{
    MAX_DESCRIPTION_LEN, ResponseFormat, Validate, ValidationError, check_color, check_id,
    check_max_len, check_pagination, check_title, default_limit, trim_in_place,
};

pub const MAX_PROJECT_TITLE_LEN: usize = 250;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectParams {
    #[schemars(description = "Project title (1-250 characters)")]
    pub title: String,

    #[serde(default)]
    #[schemars(description = "Project description in Markdown (optional)")]
    pub description: String,

    #[schemars(description = "Project color as #RRGGBB, e.g. '#1973ff' (optional)")]
    pub hex_color: Option<String>,

    #[schemars(description = "ID of the parent project when creating a sub-project (optional)")]
    pub parent_project_id: Option<i64>,
}

impl Validate for CreateProjectParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_title("title", &mut self.title, MAX_PROJECT_TITLE_LEN)?;
        self.description = self.description.trim().to_string();
        check_max_len("description", &self.description, MAX_DESCRIPTION_LEN)?;
        trim_in_place(&mut self.hex_color);
        if let Some(color) = &self.hex_color {
            check_color("hex_color", color)?;
        }
        if let Some(parent) = self.parent_project_id {
            check_id("parent_project_id", parent)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectParams {
    #[schemars(description = "ID of the project to update")]
    pub project_id: i64,

    #[schemars(description = "New title (only when changing it)")]
    pub title: Option<String>,

    #[schemars(description = "New description (only when changing it)")]
    pub description: Option<String>,

    #[schemars(description = "New color as #RRGGBB (only when changing it)")]
    pub hex_color: Option<String>,
}

impl Validate for UpdateProjectParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("project_id", self.project_id)?;
        if let Some(title) = self.title.as_mut() {
            check_title("title", title, MAX_PROJECT_TITLE_LEN)?;
        }
        trim_in_place(&mut self.description);
        if let Some(description) = &self.description {
            check_max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        trim_in_place(&mut self.hex_color);
        if let Some(color) = &self.hex_color {
            check_color("hex_color", color)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteProjectParams {
    #[schemars(description = "ID of the project to delete. All of its tasks are deleted too.")]
    pub project_id: i64,
}

impl Validate for DeleteProjectParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("project_id", self.project_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetProjectTasksParams {
    #[schemars(description = "ID of the project whose tasks to list")]
    pub project_id: i64,

    #[serde(default = "default_limit")]
    #[schemars(description = "Maximum number of tasks to return (1-100, default: 20)")]
    pub limit: i64,

    #[serde(default)]
    #[schemars(description = "Number of tasks to skip for pagination (default: 0)")]
    pub offset: i64,

    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' or 'json' (default: markdown)")]
    pub response_format: ResponseFormat,
}

impl Validate for GetProjectTasksParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("project_id", self.project_id)?;
        check_pagination(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveTaskParams {
    #[schemars(description = "ID of the task to move")]
    pub task_id: i64,

    #[schemars(description = "ID of the destination project")]
    pub target_project_id: i64,
}

impl Validate for MoveTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        check_id("target_project_id", self.target_project_id)
    }
}
