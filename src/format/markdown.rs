//! Markdown rendering of Vikunja resources.
//!
//! Resources stay `serde_json::Value`; missing or null fields fall back to
//! placeholders instead of failing.

use serde_json::Value;

use super::dates::{format_rrule, format_timestamp, is_unset_date};

/// Python-style truthiness: null, false, 0, "" and empty collections are falsy.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Display text for a scalar field, or `default` when absent or null.
fn text(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn date_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !is_unset_date(s))
        .map(format_timestamp)
}

fn done_marker(task: &Value) -> &'static str {
    if truthy(task.get("done")) { "✓" } else { "○" }
}

pub fn priority_label(priority: i64) -> String {
    match priority {
        0 => "None".to_string(),
        1 => "Low".to_string(),
        2 => "Medium".to_string(),
        3 => "High".to_string(),
        4 => "Urgent".to_string(),
        5 => "DO NOW".to_string(),
        other => other.to_string(),
    }
}

fn priority_icon(priority: i64) -> &'static str {
    match priority {
        1 => "🔵",
        2 => "🟡",
        3 => "🟠",
        4 => "🔴",
        5 => "🚨",
        _ => "",
    }
}

pub fn format_task_markdown(task: &Value, detailed: bool) -> String {
    let mut lines = vec![format!(
        "## {} {} (#{})",
        done_marker(task),
        text(task.get("title"), "Untitled"),
        text(task.get("id"), "?")
    )];

    if detailed && truthy(task.get("description")) {
        lines.push(format!("\n{}", text(task.get("description"), "")));
    }

    lines.push(String::new());

    if truthy(task.get("project_id")) {
        lines.push(format!("- **Project**: {}", text(task.get("project_id"), "")));
    }

    if truthy(task.get("priority")) {
        let label = match task.get("priority").and_then(Value::as_i64) {
            Some(p) => priority_label(p),
            None => text(task.get("priority"), ""),
        };
        lines.push(format!("- **Priority**: {}", label));
    }

    if let Some(due) = date_field(task, "due_date") {
        lines.push(format!("- **Due**: {}", due));
    }

    if let Some(rule) = task.get("repeats").and_then(Value::as_str).filter(|r| !r.is_empty()) {
        let mut repeat = format_rrule(rule);
        if truthy(task.get("repeats_from_current_date")) {
            repeat.push_str(" (from completion)");
        }
        lines.push(format!("- **Repeats**: {}", repeat));
    }

    if let Some(labels) = task.get("labels").and_then(Value::as_array).filter(|l| !l.is_empty()) {
        let names: Vec<String> = labels
            .iter()
            .map(|label| format!("`{}`", text(label.get("title"), "Unknown")))
            .collect();
        lines.push(format!("- **Labels**: {}", names.join(", ")));
    }

    if detailed {
        if let Some(assignees) = task
            .get("assignees")
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
        {
            let names: Vec<String> = assignees
                .iter()
                .map(|a| text(a.get("username"), "Unknown"))
                .collect();
            lines.push(format!("- **Assigned to**: {}", names.join(", ")));
        }
        if let Some(created) = date_field(task, "created") {
            lines.push(format!("- **Created**: {}", created));
        }
        if let Some(updated) = date_field(task, "updated") {
            lines.push(format!("- **Updated**: {}", updated));
        }
    }

    lines.join("\n")
}

fn format_task_line(task: &Value) -> String {
    let mut line = format!(
        "- {} **#{}**: {}",
        done_marker(task),
        text(task.get("id"), "?"),
        text(task.get("title"), "Untitled")
    );

    let priority = task.get("priority").and_then(Value::as_i64).unwrap_or(0);
    if priority > 0 {
        line.push(' ');
        line.push_str(priority_icon(priority));
    }
    if truthy(task.get("repeats")) {
        line.push_str(" 🔁");
    }
    line
}

pub fn format_tasks_list_markdown(
    tasks: &[Value],
    total: usize,
    offset: usize,
    detailed: bool,
) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut lines = vec![format!("# Tasks ({} of {})", tasks.len(), total), String::new()];

    for task in tasks {
        if detailed {
            lines.push(format_task_markdown(task, true));
            lines.push(String::new());
        } else {
            lines.push(format_task_line(task));
        }
    }

    let shown_until = offset + tasks.len();
    if shown_until < total {
        lines.push(String::new());
        lines.push(format!(
            "*Showing tasks {}-{} of {}. Use offset={} to see more.*",
            offset + 1,
            shown_until,
            total,
            shown_until
        ));
    }

    lines.join("\n")
}

pub fn format_project_markdown(project: &Value, detailed: bool) -> String {
    let mut lines = vec![format!(
        "## 📁 {} (#{})",
        text(project.get("title"), "Untitled"),
        text(project.get("id"), "?")
    )];

    if detailed && truthy(project.get("description")) {
        lines.push(format!("\n{}", text(project.get("description"), "")));
    }

    lines.push(String::new());

    if truthy(project.get("parent_project_id")) {
        lines.push(format!(
            "- **Parent Project**: {}",
            text(project.get("parent_project_id"), "")
        ));
    }
    if truthy(project.get("hex_color")) {
        lines.push(format!("- **Color**: {}", text(project.get("hex_color"), "")));
    }

    if detailed {
        if let Some(created) = date_field(project, "created") {
            lines.push(format!("- **Created**: {}", created));
        }
        if let Some(updated) = date_field(project, "updated") {
            lines.push(format!("- **Updated**: {}", updated));
        }
    }

    lines.join("\n")
}

pub fn format_projects_markdown(projects: &[Value]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }

    let mut lines = vec![format!("# Projects ({})", projects.len()), String::new()];
    for project in projects {
        lines.push(format_project_markdown(project, false));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn format_labels_markdown(labels: &[Value]) -> String {
    if labels.is_empty() {
        return "No labels found.".to_string();
    }

    let mut lines = vec![format!("# Labels ({})", labels.len()), String::new()];
    for label in labels {
        lines.push(format!(
            "## {} (#{})",
            text(label.get("title"), "Untitled"),
            text(label.get("id"), "?")
        ));
        lines.push(format!("- **Color**: {}", text(label.get("hex_color"), "#e8e8e8")));
        if truthy(label.get("description")) {
            lines.push(format!("- **Description**: {}", text(label.get("description"), "")));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn format_reminders_markdown(task_id: i64, reminders: &[Value]) -> String {
    if reminders.is_empty() {
        return "No reminders set for this task.".to_string();
    }

    let mut lines = vec![format!("# Reminders for Task #{}", task_id), String::new()];
    for (index, reminder) in reminders.iter().enumerate() {
        let date = reminder
            .get("reminder")
            .and_then(Value::as_str)
            .map(format_timestamp)
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!("{}. {}", index + 1, date));
    }
    lines.join("\n")
}

/// "copied_from" becomes "Copied From".
fn relation_heading(kind: &str) -> String {
    kind.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relations_markdown(task_id: i64, related_tasks: &Value) -> String {
    let groups: Vec<(&String, &Vec<Value>)> = related_tasks
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(kind, tasks)| tasks.as_array().map(|t| (kind, t)))
                .filter(|(_, tasks)| !tasks.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if groups.is_empty() {
        return "No relationships defined for this task.".to_string();
    }

    let mut lines = vec![format!("# Relationships for Task #{}", task_id), String::new()];
    for (kind, tasks) in groups {
        lines.push(format!("## {}", relation_heading(kind)));
        for task in tasks {
            lines.push(format!(
                "- **#{}**: {}",
                text(task.get("id"), "?"),
                text(task.get("title"), "Untitled")
            ));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn format_teams_markdown(teams: &[Value]) -> String {
    if teams.is_empty() {
        return "No teams found.".to_string();
    }

    let mut lines = vec![format!("# Teams ({})", teams.len()), String::new()];
    for team in teams {
        lines.push(format!(
            "## {} (#{})",
            text(team.get("name"), "Untitled"),
            text(team.get("id"), "?")
        ));
        if truthy(team.get("description")) {
            lines.push(text(team.get("description"), ""));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn format_team_members_markdown(team_id: i64, members: &[Value]) -> String {
    if members.is_empty() {
        return "No members in this team.".to_string();
    }

    let mut lines = vec![
        format!("# Team #{} Members ({})", team_id, members.len()),
        String::new(),
    ];
    for member in members {
        lines.push(format!(
            "- **{}** (#{})",
            text(member.get("username"), "Unknown"),
            text(member.get("id"), "?")
        ));
        if truthy(member.get("email")) {
            lines.push(format!("  Email: {}", text(member.get("email"), "")));
        }
    }
    lines.join("\n")
}
