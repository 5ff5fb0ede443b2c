use schemars::JsonSchema;
use serde::Deserialize;

use super::{
    DetailLevel, MAX_DESCRIPTION_LEN, ResponseFormat, SortField, SortOrder, Validate,
    ValidationError, check_date, check_id, check_max_len, check_pagination, check_range,
    check_title, default_limit, trim_in_place,
};

pub const MAX_TASK_TITLE_LEN: usize = 500;
pub const MIN_PRIORITY: i64 = 0;
pub const MAX_PRIORITY: i64 = 5;

fn default_project_id() -> i64 {
    1
}

fn check_priority(value: i64) -> Result<(), ValidationError> {
    check_range("priority", value, MIN_PRIORITY, MAX_PRIORITY)
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskParams {
    #[serde(default = "default_project_id")]
    #[schemars(description = "ID of the project to create the task in (default: 1 = Inbox). Get project IDs with vikunja_list_projects.")]
    pub project_id: i64,

    #[schemars(description = "Task title (1-500 characters), e.g. 'Fix bug in login'")]
    pub title: String,

    #[serde(default)]
    #[schemars(description = "Detailed description of the task in Markdown (optional)")]
    pub description: String,

    #[serde(default)]
    #[schemars(description = "Task priority: 0=None, 1=Low, 2=Medium, 3=High, 4=Urgent, 5=DO NOW (default: 0)")]
    pub priority: i64,

    #[schemars(description = "Due date as YYYY-MM-DDTHH:MM:SSZ, e.g. '2025-12-31T23:59:59Z' (optional)")]
    pub due_date: Option<String>,

    #[schemars(description = "Start date as YYYY-MM-DDTHH:MM:SSZ (optional)")]
    pub start_date: Option<String>,

    #[schemars(description = "End date as YYYY-MM-DDTHH:MM:SSZ (optional)")]
    pub end_date: Option<String>,

    #[schemars(description = "RFC 5545 RRULE recurrence, e.g. 'FREQ=DAILY;INTERVAL=1', 'FREQ=WEEKLY;BYDAY=MO,WE,FR', 'FREQ=MONTHLY;BYMONTHDAY=15' (optional)")]
    pub repeats: Option<String>,

    #[schemars(description = "If true, the next occurrence is calculated from the completion date instead of the original due date")]
    pub repeats_from_current_date: Option<bool>,
}

impl Validate for CreateTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("project_id", self.project_id)?;
        check_title("title", &mut self.title, MAX_TASK_TITLE_LEN)?;
        self.description = self.description.trim().to_string();
        check_max_len("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_priority(self.priority)?;
        for (field, value) in [
            ("due_date", &mut self.due_date),
            ("start_date", &mut self.start_date),
            ("end_date", &mut self.end_date),
        ] {
            trim_in_place(value);
            check_date(field, value.as_deref())?;
        }
        trim_in_place(&mut self.repeats);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetTaskParams {
    #[schemars(description = "ID of the task to retrieve, e.g. 123")]
    pub task_id: i64,

    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' for human-readable or 'json' for machine-readable (default: markdown)")]
    pub response_format: ResponseFormat,
}

impl Validate for GetTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListTasksParams {
    #[schemars(description = "Only list tasks from this project. Lists tasks from all projects when omitted.")]
    pub project_id: Option<i64>,

    #[schemars(description = "Filter by completion: true = completed only, false = incomplete only, omitted = all")]
    pub filter_done: Option<bool>,

    #[schemars(description = "Minimum priority level, e.g. 3 for High and above")]
    pub filter_priority: Option<i64>,

    #[serde(default)]
    #[schemars(description = "Sort field: id, title, priority, due_date, created, updated (default: id)")]
    pub sort_by: SortField,

    #[serde(default)]
    #[schemars(description = "Sort order: asc or desc (default: asc)")]
    pub sort_order: SortOrder,

    #[serde(default = "default_limit")]
    #[schemars(description = "Maximum number of tasks to return (1-100, default: 20)")]
    pub limit: i64,

    #[serde(default)]
    #[schemars(description = "Number of tasks to skip for pagination (default: 0)")]
    pub offset: i64,

    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' or 'json' (default: markdown)")]
    pub response_format: ResponseFormat,

    #[serde(default)]
    #[schemars(description = "Detail level: 'concise' for one line per task or 'detailed' for full info (default: concise)")]
    pub detail_level: DetailLevel,
}

impl Validate for ListTasksParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        if let Some(project_id) = self.project_id {
            check_id("project_id", project_id)?;
        }
        if let Some(priority) = self.filter_priority {
            check_range("filter_priority", priority, MIN_PRIORITY, MAX_PRIORITY)?;
        }
        check_pagination(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskParams {
    #[schemars(description = "ID of the task to update, e.g. 123")]
    pub task_id: i64,

    #[schemars(description = "New title (only when changing it)")]
    pub title: Option<String>,

    #[schemars(description = "New description (only when changing it)")]
    pub description: Option<String>,

    #[schemars(description = "Mark the task done (true) or not done (false)")]
    pub done: Option<bool>,

    #[schemars(description = "New priority 0-5 (only when changing it)")]
    pub priority: Option<i64>,

    #[schemars(description = "New due date as YYYY-MM-DDTHH:MM:SSZ")]
    pub due_date: Option<String>,

    #[schemars(description = "RFC 5545 RRULE recurrence, e.g. 'FREQ=DAILY;INTERVAL=1'. An empty string removes the recurrence.")]
    pub repeats: Option<String>,

    #[schemars(description = "If true, the next occurrence is calculated from the completion date instead of the original due date")]
    pub repeats_from_current_date: Option<bool>,
}

impl Validate for UpdateTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        if let Some(title) = self.title.as_mut() {
            check_title("title", title, MAX_TASK_TITLE_LEN)?;
        }
        trim_in_place(&mut self.description);
        if let Some(description) = &self.description {
            check_max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        if let Some(priority) = self.priority {
            check_priority(priority)?;
        }
        trim_in_place(&mut self.due_date);
        check_date("due_date", self.due_date.as_deref())?;
        trim_in_place(&mut self.repeats);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteTaskParams {
    #[schemars(description = "ID of the task to delete, e.g. 123")]
    pub task_id: i64,
}

impl Validate for DeleteTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)
    }
}
