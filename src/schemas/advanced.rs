//! Reminders, relations, teams and sharing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ResponseFormat, Validate, ValidationError, check_date, check_id, check_range};

pub const MAX_PERMISSION_LEVEL: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Subtask,
    Parenttask,
    Related,
    Duplicateof,
    Duplicates,
    Blocking,
    Blocked,
    Precedes,
    Follows,
    Copiedfrom,
    Copiedto,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Subtask => "subtask",
            RelationKind::Parenttask => "parenttask",
            RelationKind::Related => "related",
            RelationKind::Duplicateof => "duplicateof",
            RelationKind::Duplicates => "duplicates",
            RelationKind::Blocking => "blocking",
            RelationKind::Blocked => "blocked",
            RelationKind::Precedes => "precedes",
            RelationKind::Follows => "follows",
            RelationKind::Copiedfrom => "copiedfrom",
            RelationKind::Copiedto => "copiedto",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddReminderParams {
    #[schemars(description = "ID of the task to add the reminder to")]
    pub task_id: i64,

    #[schemars(description = "Reminder date/time as YYYY-MM-DDTHH:MM:SSZ, e.g. '2025-12-25T09:00:00Z'")]
    pub reminder_date: String,
}

impl Validate for AddReminderParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        self.reminder_date = self.reminder_date.trim().to_string();
        check_date("reminder_date", Some(&self.reminder_date))
    }
}

/// A task ID plus output format, for read-only task sub-resources.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskViewParams {
    #[schemars(description = "ID of the task")]
    pub task_id: i64,

    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' or 'json' (default: markdown)")]
    pub response_format: ResponseFormat,
}

impl Validate for TaskViewParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteReminderParams {
    #[schemars(description = "ID of the task")]
    pub task_id: i64,

    #[schemars(description = "Index of the reminder to delete (1-based, as shown by vikunja_list_reminders)")]
    pub reminder_index: i64,
}

impl Validate for DeleteReminderParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        check_id("reminder_index", self.reminder_index)
    }
}

/// Shared by create/delete relation tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RelationParams {
    #[schemars(description = "ID of the source task")]
    pub task_id: i64,

    #[schemars(description = "ID of the related task")]
    pub other_task_id: i64,

    #[schemars(description = "Type of relationship: subtask, parenttask, related, duplicateof, duplicates, blocking, blocked, precedes, follows, copiedfrom, copiedto")]
    pub relation_kind: RelationKind,
}

impl Validate for RelationParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        check_id("other_task_id", self.other_task_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TeamMembersParams {
    #[schemars(description = "ID of the team")]
    pub team_id: i64,

    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' or 'json' (default: markdown)")]
    pub response_format: ResponseFormat,
}

impl Validate for TeamMembersParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("team_id", self.team_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignTaskParams {
    #[schemars(description = "ID of the task to assign")]
    pub task_id: i64,

    #[schemars(description = "ID of the user to assign the task to")]
    pub user_id: i64,
}

impl Validate for AssignTaskParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("task_id", self.task_id)?;
        check_id("user_id", self.user_id)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ShareProjectParams {
    #[schemars(description = "ID of the project to share")]
    pub project_id: i64,

    #[schemars(description = "ID of the team to share with")]
    pub team_id: i64,

    #[serde(default)]
    #[schemars(description = "Permission level: 0=read, 1=read+write, 2=admin (default: 0)")]
    pub permission_level: i64,
}

impl Validate for ShareProjectParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        check_id("project_id", self.project_id)?;
        check_id("team_id", self.team_id)?;
        check_range("permission_level", self.permission_level, 0, MAX_PERMISSION_LEVEL)
    }
}
