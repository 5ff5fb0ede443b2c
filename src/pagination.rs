//! Offset/limit pagination helpers.
//!
//! Tools expose `limit`/`offset`; the Vikunja API pages with 1-based
//! `page`/`per_page`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schemas::{DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
    pub next_offset: Option<usize>,
}

pub fn build_pagination(count: usize, total: usize, limit: usize, offset: usize) -> Pagination {
    let shown_until = offset + count;
    let has_more = shown_until < total;
    Pagination {
        total,
        count,
        limit,
        offset,
        has_more,
        next_offset: has_more.then_some(shown_until),
    }
}

/// Clamps `limit` to `1..=max_limit` and `offset` to `>= 0`, applying defaults
/// for missing values.
pub fn validate_pagination_params(
    limit: Option<i64>,
    offset: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> (usize, usize) {
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
    let offset = offset.unwrap_or(0).max(0);
    (
        usize::try_from(limit).unwrap_or(1),
        usize::try_from(offset).unwrap_or(0),
    )
}

/// Same as [`validate_pagination_params`] with the tool defaults (20, max 100).
pub fn normalize(limit: i64, offset: i64) -> (usize, usize) {
    validate_pagination_params(Some(limit), Some(offset), DEFAULT_LIMIT, MAX_LIMIT)
}

/// 1-based page number containing `offset`.
pub fn page_for(offset: usize, limit: usize) -> usize {
    offset / limit.max(1) + 1
}

/// `{total, count, limit, offset, has_more, next_offset, tasks}` for JSON list output.
pub fn paginated_tasks(tasks: &[Value], total: usize, limit: usize, offset: usize) -> Value {
    let pagination = build_pagination(tasks.len(), total, limit, offset);
    let mut body = match serde_json::to_value(pagination) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    body.insert("tasks".to_string(), Value::Array(tasks.to_vec()));
    Value::Object(body)
}
