use schemars::JsonSchema;
use serde::Deserialize;

use super::{
    ResponseFormat, Validate, ValidationError, check_color, check_id, check_max_len,
    check_pagination, check_title, default_limit,
};

pub const MAX_LABEL_TITLE_LEN: usize = 100;
pub const MAX_LABEL_DESCRIPTION_LEN: usize = 1000;
pub const DEFAULT_LABEL_COLOR: &str = "#e8e8e8";

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLabelParams {
    #[schemars(description = "Label title (1-100 characters), e.g. 'bug', 'urgent'")]
    pub title: String,

    #[serde(default)]
    #[schemars(description = "Label description (optional, up to 1000 characters)")]
    pub description: String,

    #[serde(default = "default_label_color")]
    #[schemars(description = "Label color as #RRGGBB (default: #e8e8e8)")]
    pub hex_color: String,
}

impl Validate for CreateLabelParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_title("title", &mut self.title, MAX_LABEL_TITLE_LEN)?;
        self.description = self.description.trim().to_string();
        check_max_len("description", &self.description, MAX_LABEL_DESCRIPTION_LEN)?;
        self.hex_color = self.hex_color.trim().to_string();
        check_color("hex_color", &self.hex_color)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteLabelParams {
    #[schemars(description = "ID of the label to delete")]
    pub label_id: i64,
}

impl Validate for DeleteLabelParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("label_id", self.label_id)
    }
}

/// Shared by add/remove label tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskLabelParams {
    #[schemars(description = "ID of the task")]
    pub task_id: i64,

    #[schemars(description = "ID of the label")]
    pub label_id: i64,
}

impl Validate for TaskLabelParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        check_id("label_id", self.label_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetTasksByLabelParams {
    #[schemars(description = "ID of the label to filter by")]
    pub label_id: i64,

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

impl Validate for GetTasksByLabelParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("label_id", self.label_id)?;
        check_pagination(self.limit, self.offset)
    }
}
