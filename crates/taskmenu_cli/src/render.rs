use tabled::{Table, Tabled, settings::Style};
use taskmenu_core::dates;
use taskmenu_core::error::AppError;
use taskmenu_core::model::Task;

const TITLE_WIDTH: usize = 30;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn status_label(task: &Task) -> &'static str {
    if task.is_completed() {
        "COMPLETED"
    } else {
        "PENDING"
    }
}

pub fn task_table(tasks: &[Task]) -> String {
    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id(),
            status: status_label(task),
            title: truncate(task.title(), TITLE_WIDTH),
            created: dates::format_for_display(Some(task.created_at())),
            deadline: match task.deadline() {
                Some(deadline) => dates::format_for_display(Some(deadline)),
                None => "No deadline".to_string(),
            },
            description: task.description().unwrap_or_default().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Full field listing for a single task, with exact timestamps.
pub fn task_details(task: &Task) -> String {
    let lines = [
        format!("ID:          {}", task.id()),
        format!("Title:       {}", task.title()),
        format!("Description: {}", task.description().unwrap_or("None")),
        format!("Status:      {}", status_label(task)),
        format!("Created:     {}", dates::format_datetime(Some(task.created_at()))),
        format!("Updated:     {}", dates::format_datetime(Some(task.updated_at()))),
        format!("Deadline:    {}", deadline_label(task)),
    ];
    lines.join("\n")
}

pub fn deadline_label(task: &Task) -> String {
    match task.deadline() {
        Some(deadline) => format!(
            "{} at {}",
            dates::format_date(Some(deadline)),
            dates::format_time(Some(deadline))
        ),
        None => "None".to_string(),
    }
}

pub fn tasks_json(tasks: &[Task]) -> Result<String, AppError> {
    let records = tasks
        .iter()
        .map(Task::to_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::Value::Array(records).to_string())
}

pub fn task_json(task: &Task) -> Result<String, AppError> {
    Ok(task.to_record()?.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::{task_details, task_table, tasks_json, truncate};
    use taskmenu_core::model::{Task, TaskFields};
    use time::macros::datetime;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 30), "short");
        let long = "é".repeat(40);
        let cut = truncate(&long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn table_lists_every_task() {
        let tasks = vec![
            Task::new(1, "Buy milk").unwrap(),
            Task::with_fields(
                2,
                "Call mom",
                TaskFields {
                    completed: true,
                    description: Some("Sunday".to_string()),
                    ..TaskFields::default()
                },
            )
            .unwrap(),
        ];

        let rendered = task_table(&tasks);

        assert!(rendered.contains("Buy milk"));
        assert!(rendered.contains("COMPLETED"));
        assert!(rendered.contains("No deadline"));
        assert!(rendered.contains("Sunday"));
    }

    #[test]
    fn json_output_uses_stored_layout() {
        let tasks = vec![Task::new(5, "demo").unwrap()];

        let rendered = tasks_json(&tasks).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed[0]["id"], 5);
        assert!(parsed[0]["deadline"].is_null());
    }

    #[test]
    fn details_show_exact_timestamps() {
        let task = Task::with_fields(
            3,
            "Wrap gifts",
            TaskFields {
                created_at: Some(datetime!(2025-12-20 08:15:00 UTC)),
                updated_at: Some(datetime!(2025-12-21 09:30:45 UTC)),
                deadline: Some(datetime!(2025-12-24 18:00:00 UTC)),
                ..TaskFields::default()
            },
        )
        .unwrap();
        let undated = Task::new(4, "Someday").unwrap();

        let rendered = task_details(&task);

        assert!(rendered.contains("ID:          3"));
        assert!(rendered.contains("Status:      PENDING"));
        assert!(rendered.contains("Description: None"));
        assert!(rendered.contains("Created:     2025-12-20 08:15:00"));
        assert!(rendered.contains("Updated:     2025-12-21 09:30:45"));
        assert!(rendered.contains("Deadline:    2025-12-24 at 18:00:00"));
        assert!(task_details(&undated).contains("Deadline:    None"));
    }
}
