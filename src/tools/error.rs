//! Turns tool failures into actionable messages for the calling model.

use serde_json::Value;

use crate::credentials::ConfigError;
use crate::http::ApiError;
use crate::schemas::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request the remote data cannot satisfy, explained in plain text.
    #[error("{0}")]
    Message(String),
}

impl ToolError {
    /// Text returned to the MCP caller. Always starts with `Error:`.
    pub fn user_message(&self) -> String {
        match self {
            ToolError::Validation(e) => format!("Error: {}", e),
            ToolError::Api(e) => describe_api_error(e),
            ToolError::Config(e) => format!("Error: {}", e),
            ToolError::Message(msg) => format!("Error: {}", msg),
        }
    }
}

pub fn describe_api_error(error: &ApiError) -> String {
    match error {
        ApiError::RateLimitExhausted { .. } => describe_status(429, ""),
        ApiError::HttpStatus { status, body } => describe_status(*status, body),
        ApiError::Timeout(_) => "Error: Request timed out. The Vikunja server took too long to respond. \
             Please check your network connection and try again."
            .to_string(),
        ApiError::Connection(_) => "Error: Cannot connect to Vikunja server. Please check that VIKUNJA_URL \
             is correct and the server is accessible."
            .to_string(),
        ApiError::Unexpected { kind, .. } => {
            format!("Error: Unexpected error occurred - {}. Please try again.", kind)
        }
    }
}

fn describe_status(status: u16, body: &str) -> String {
    match status {
        401 => "Error: Invalid or expired authentication token. \
                Please check that VIKUNJA_TOKEN is correct and has not expired."
            .to_string(),
        403 => "Error: Permission denied. You don't have access to this resource. \
                Please check your user permissions in Vikunja."
            .to_string(),
        404 => "Error: Resource not found. Please check the ID is correct and \
                try listing available resources first."
            .to_string(),
        429 => "Error: Rate limit exceeded. The Vikunja API is receiving too many requests. \
                Please wait a moment before making more requests."
            .to_string(),
        422 => match validation_message(body) {
            Some(message) => format!("Error: Validation failed - {}", message),
            None => "Error: Invalid request data. Please check that all required parameters \
                     are provided and have valid values."
                .to_string(),
        },
        500 => "Error: Vikunja server error (500). The server encountered an internal error. \
                Please try again later or contact the Vikunja administrator."
            .to_string(),
        503 => "Error: Vikunja service unavailable (503). The server may be under maintenance. \
                Please try again later."
            .to_string(),
        other => format!("Error: API request failed with status {}. Please try again.", other),
    }
}

fn validation_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
