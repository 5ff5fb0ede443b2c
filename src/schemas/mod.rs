//! Tool input parameters.
//!
//! Every tool takes one of these structs, deserialized from the MCP call
//! arguments (unknown fields are rejected) and then checked with
//! [`Validate::validate`], which also trims string fields.

mod advanced;
mod labels;
mod projects;
mod tasks;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub use advanced::*;
pub use labels::*;
pub use projects::*;
pub use tasks::*;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_DESCRIPTION_LEN: usize = 50_000;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").expect("date pattern regex must compile")
});

static COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color regex must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for '{field}': {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub trait Validate {
    /// Trims string fields in place and checks every constraint.
    fn validate(&mut self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    #[default]
    Concise,
    Detailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Title,
    Priority,
    DueDate,
    Created,
    Updated,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Priority => "priority",
            SortField::DueDate => "due_date",
            SortField::Created => "created",
            SortField::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

pub(crate) fn check_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 1 {
        return Err(ValidationError::new(field, format!("must be at least 1, got {}", value)));
    }
    Ok(())
}

pub(crate) fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
    Ok(())
}

/// Trims a required string and checks its length in characters.
pub(crate) fn check_title(
    field: &'static str,
    value: &mut String,
    max_len: usize,
) -> Result<(), ValidationError> {
    *value = value.trim().to_string();
    if value.is_empty() {
        return Err(ValidationError::new(field, "cannot be empty or whitespace only"));
    }
    check_max_len(field, value, max_len)
}

pub(crate) fn check_max_len(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters, got {}", max_len, len),
        ));
    }
    Ok(())
}

pub(crate) fn trim_in_place(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = v.trim().to_string();
    }
}

pub(crate) fn check_date(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !DATE_PATTERN.is_match(v) => Err(ValidationError::new(
            field,
            format!("must match YYYY-MM-DDTHH:MM:SSZ (e.g. 2025-12-31T23:59:59Z), got '{}'", v),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_color(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !COLOR_PATTERN.is_match(value) {
        return Err(ValidationError::new(
            field,
            format!("must be a hex color like #e8e8e8, got '{}'", value),
        ));
    }
    Ok(())
}

pub(crate) fn check_pagination(limit: i64, offset: i64) -> Result<(), ValidationError> {
    check_range("limit", limit, 1, MAX_LIMIT)?;
    if offset < 0 {
        return Err(ValidationError::new("offset", format!("must be at least 0, got {}", offset)));
    }
    Ok(())
}

/// Parameters for tools that only choose an output format.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FormatParams {
    #[serde(default)]
    #[schemars(description = "Output format: 'markdown' for human-readable or 'json' for machine-readable (default: markdown)")]
    pub response_format: ResponseFormat,
}

impl Validate for FormatParams {
    fn validate(&mut self) -> Result<(), ValidationError> {
        Ok(())
    }
}
