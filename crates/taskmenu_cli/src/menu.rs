use crate::app::{App, non_blank};
use crate::render;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use taskmenu_core::dates;
use taskmenu_core::error::AppError;
use taskmenu_core::model::TaskUpdate;
use taskmenu_core::task_service::{SortKey, SortOrder, filter_tasks_by_status, sort_tasks};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddTask,
    ListTasks,
    CompleteTask,
    IncompleteTask,
    UpdateTask,
    DeleteTask,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 7] = [
        MenuAction::AddTask,
        MenuAction::ListTasks,
        MenuAction::CompleteTask,
        MenuAction::IncompleteTask,
        MenuAction::UpdateTask,
        MenuAction::DeleteTask,
        MenuAction::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AddTask => "Add Task",
            Self::ListTasks => "List All Tasks",
            Self::CompleteTask => "Complete Task",
            Self::IncompleteTask => "Mark Task Incomplete",
            Self::UpdateTask => "Update Task",
            Self::DeleteTask => "Delete Task",
            Self::Exit => "Exit",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListView {
    All,
    Sorted,
    Filtered,
}

const LIST_VIEWS: [(ListView, &str); 3] = [
    (ListView::All, "List all"),
    (ListView::Sorted, "Sort tasks"),
    (ListView::Filtered, "Filter tasks"),
];

const STATUS_CHOICES: [(Option<bool>, &str); 3] = [
    (Some(true), "Completed"),
    (Some(false), "Incomplete"),
    (None, "All"),
];

fn prompt_error(err: dialoguer::Error) -> AppError {
    AppError::io(err.to_string())
}

pub fn run(app: &mut App) -> Result<(), AppError> {
    let theme = ColorfulTheme::default();
    println!("{}", app.palette.accentize("\nWelcome to Todo Application!"));

    loop {
        println!("\n{}", app.palette.accentize(&"=".repeat(60)));
        println!("{}", app.palette.accentize("                   TODO TASKS"));
        println!("{}", app.palette.accentize(&"=".repeat(60)));
        app.print_tasks(&app.service.get_all_tasks())?;

        let labels: Vec<&str> = MenuAction::ALL.iter().map(|action| action.label()).collect();
        let selection = Select::with_theme(&theme)
            .with_prompt("TODO APPLICATION - SELECT AN ACTION")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;

        let action = selection
            .and_then(|index| MenuAction::from_label(labels[index]))
            .unwrap_or(MenuAction::Exit);
        debug!(action = action.label(), "menu selection");

        let result = match action {
            MenuAction::AddTask => add_task(app, &theme),
            MenuAction::ListTasks => list_tasks(app, &theme),
            MenuAction::CompleteTask => set_status(app, &theme, true),
            MenuAction::IncompleteTask => set_status(app, &theme, false),
            MenuAction::UpdateTask => update_task(app, &theme),
            MenuAction::DeleteTask => delete_task(app, &theme),
            MenuAction::Exit => {
                if selection.is_none() || confirm(&theme, "Are you sure you want to exit?")? {
                    println!("\nGoodbye!");
                    return Ok(());
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            eprintln!("{}", app.palette.fail(&format!("ERROR: {err}")));
        }
    }
}

fn confirm(theme: &ColorfulTheme, prompt: &str) -> Result<bool, AppError> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_error)
}

fn text(theme: &ColorfulTheme, prompt: &str) -> Result<String, AppError> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    Ok(value.trim().to_string())
}

fn task_id(theme: &ColorfulTheme) -> Result<u64, AppError> {
    Input::<u64>::with_theme(theme)
        .with_prompt("Enter task ID")
        .interact_text()
        .map_err(prompt_error)
}

fn add_task(app: &mut App, theme: &ColorfulTheme) -> Result<(), AppError> {
    println!("{}", app.palette.accentize("\n--- ADD TASK ---"));
    let title = text(theme, "Enter task title")?;
    if title.is_empty() {
        println!("{}", app.palette.fail("Error: Title cannot be empty"));
        return Ok(());
    }

    let description = non_blank(Some(text(
        theme,
        "Enter task description (optional, press Enter to skip)",
    )?));

    let mut deadline = None;
    if confirm(theme, "Add deadline?")? {
        let raw = text(theme, "Enter deadline (YYYY-MM-DD or MM/DD/YYYY)")?;
        deadline = dates::parse_datetime(&raw);
        if deadline.is_none() {
            println!(
                "{}",
                app.palette
                    .warn("Invalid date format. Task will be created without deadline.")
            );
        }
    }

    let added = app.service.add_task(&title, description, deadline)?;
    app.report_save(&added);
    println!(
        "{}",
        app.palette.succeed(&format!(
            "✓ Added task: '{}' with ID {}",
            added.value.title(),
            added.value.id()
        ))
    );
    Ok(())
}

fn list_tasks(app: &mut App, theme: &ColorfulTheme) -> Result<(), AppError> {
    println!("{}", app.palette.accentize("\n--- TASK LIST ---"));
    let view_labels: Vec<&str> = LIST_VIEWS.iter().map(|(_, label)| *label).collect();
    let view = Select::with_theme(theme)
        .with_prompt("Choose an option")
        .items(&view_labels)
        .default(0)
        .interact_opt()
        .map_err(prompt_error)?
        .map(|index| LIST_VIEWS[index].0)
        .unwrap_or(ListView::All);

    let mut tasks = app.service.get_all_tasks();
    match view {
        ListView::All => {}
        ListView::Sorted => {
            let key_labels: Vec<&str> = SortKey::ALL.iter().map(|key| key.label()).collect();
            let default_key = SortKey::ALL
                .iter()
                .position(|key| *key == app.config.sort_key())
                .unwrap_or(0);
            let key = Select::with_theme(theme)
                .with_prompt("Sort by")
                .items(&key_labels)
                .default(default_key)
                .interact_opt()
                .map_err(prompt_error)?;

            let order_labels: Vec<&str> =
                SortOrder::ALL.iter().map(|order| order.label()).collect();
            let default_order = SortOrder::ALL
                .iter()
                .position(|order| *order == app.config.sort_order())
                .unwrap_or(0);
            let order = Select::with_theme(theme)
                .with_prompt("Order")
                .items(&order_labels)
                .default(default_order)
                .interact_opt()
                .map_err(prompt_error)?;

            if let (Some(key), Some(order)) = (key, order) {
                tasks = sort_tasks(&tasks, SortKey::ALL[key], SortOrder::ALL[order]);
            }
        }
        ListView::Filtered => {
            let status_labels: Vec<&str> = STATUS_CHOICES.iter().map(|(_, label)| *label).collect();
            let choice = Select::with_theme(theme)
                .with_prompt("Filter by status")
                .items(&status_labels)
                .default(0)
                .interact_opt()
                .map_err(prompt_error)?;

            if let Some((Some(completed), _)) = choice.map(|index| STATUS_CHOICES[index]) {
                tasks = filter_tasks_by_status(&tasks, completed);
            }
        }
    }

    app.print_tasks(&tasks)
}

fn set_status(app: &mut App, theme: &ColorfulTheme, completed: bool) -> Result<(), AppError> {
    let heading = if completed {
        "\n--- COMPLETE TASK ---"
    } else {
        "\n--- MARK TASK INCOMPLETE ---"
    };
    println!("{}", app.palette.accentize(heading));
    let id = task_id(theme)?;

    let result = if completed {
        app.service.complete_task(id)
    } else {
        app.service.incomplete_task(id)
    };

    match result {
        Some(persisted) => {
            app.report_save(&persisted);
            let state = if completed { "complete" } else { "incomplete" };
            println!(
                "{}",
                app.palette
                    .succeed(&format!("✓ Task {id} marked as {state}"))
            );
        }
        None => println!(
            "{}",
            app.palette
                .fail(&format!("✗ Error: Task with ID {id} not found"))
        ),
    }
    Ok(())
}

fn update_task(app: &mut App, theme: &ColorfulTheme) -> Result<(), AppError> {
    println!("{}", app.palette.accentize("\n--- UPDATE TASK ---"));
    let id = task_id(theme)?;
    let Some(current) = app.service.get_task_by_id(id) else {
        println!(
            "{}",
            app.palette
                .fail(&format!("✗ Error: Task with ID {id} not found"))
        );
        return Ok(());
    };

    println!("{}", app.palette.mutedize(&format!("Current title: {}", current.title())));
    println!(
        "{}",
        app.palette.mutedize(&format!(
            "Current description: {}",
            current.description().unwrap_or("None")
        ))
    );
    let current_deadline = render::deadline_label(&current);
    println!(
        "{}",
        app.palette
            .mutedize(&format!("Current deadline: {current_deadline}"))
    );

    let mut changes = TaskUpdate::default();
    let title = text(theme, "Enter new title (or press Enter to keep current)")?;
    if !title.is_empty() {
        changes = changes.with_title(title);
    }

    if confirm(theme, "Update description?")? {
        let description = text(theme, "Enter new description (or press Enter to remove)")?;
        changes = changes.with_description(non_blank(Some(description)));
    }

    if confirm(theme, "Update deadline?")? {
        let raw = text(
            theme,
            "Enter new deadline (YYYY-MM-DD or MM/DD/YYYY, or press Enter to remove)",
        )?;
        if raw.is_empty() {
            changes = changes.with_deadline(None);
        } else if let Some(deadline) = dates::parse_datetime(&raw) {
            changes = changes.with_deadline(Some(deadline));
        } else {
            println!(
                "{}",
                app.palette
                    .warn("Invalid date format. Deadline will not be changed.")
            );
        }
    }

    match app.service.update_task(id, &changes)? {
        Some(persisted) => {
            app.report_save(&persisted);
            println!("{}", app.palette.succeed(&format!("✓ Task {id} updated")));
        }
        None => println!(
            "{}",
            app.palette
                .fail(&format!("✗ Error: Task with ID {id} not found"))
        ),
    }
    Ok(())
}

fn delete_task(app: &mut App, theme: &ColorfulTheme) -> Result<(), AppError> {
    println!("{}", app.palette.accentize("\n--- DELETE TASK ---"));
    let id = task_id(theme)?;
    if let Some(task) = app.service.get_task_by_id(id) {
        println!("{}", render::task_table(std::slice::from_ref(&task)));
    }

    if !confirm(theme, &format!("Are you sure you want to delete task {id}?"))? {
        println!("{}", app.palette.mutedize("Deletion cancelled."));
        return Ok(());
    }

    let deleted = app.service.delete_task(id);
    if deleted.value {
        app.report_save(&deleted);
        println!("{}", app.palette.succeed(&format!("✓ Task {id} deleted")));
    } else {
        println!(
            "{}",
            app.palette
                .fail(&format!("✗ Error: Task with ID {id} not found"))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MenuAction;

    #[test]
    fn menu_labels_round_trip() {
        for action in MenuAction::ALL {
            assert_eq!(MenuAction::from_label(action.label()), Some(action));
        }
    }

    #[test]
    fn menu_label_lookup_ignores_case_and_whitespace() {
        assert_eq!(
            MenuAction::from_label("  mark task incomplete "),
            Some(MenuAction::IncompleteTask)
        );
        assert_eq!(MenuAction::from_label("Archive Task"), None);
    }

    #[test]
    fn exit_is_last_choice() {
        assert_eq!(MenuAction::ALL.last(), Some(&MenuAction::Exit));
    }
}
