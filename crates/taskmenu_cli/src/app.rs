use crate::cli::{Command, StatusFilter};
use crate::render;
use taskmenu_core::config::{Config, Palette};
use taskmenu_core::dates;
use taskmenu_core::error::AppError;
use taskmenu_core::model::{Task, TaskUpdate};
use taskmenu_core::storage::Persisted;
use taskmenu_core::task_service::{SortKey, SortOrder, TaskService, filter_tasks_by_status};
use time::OffsetDateTime;

pub struct App {
    pub service: TaskService,
    pub config: Config,
    pub palette: Palette,
    pub json: bool,
}

impl App {
    pub fn new(service: TaskService, config: Config, json: bool) -> Self {
        let palette = config.palette();
        Self {
            service,
            config,
            palette,
            json,
        }
    }

    /// Prints a warning when a change only exists in memory.
    pub fn report_save<T>(&self, persisted: &Persisted<T>) {
        if let Some(err) = &persisted.save_error {
            eprintln!(
                "{}",
                self.palette
                    .warn(&format!("WARNING: change not saved to disk: {err}"))
            );
        }
    }

    pub fn print_tasks(&self, tasks: &[Task]) -> Result<(), AppError> {
        if self.json {
            println!("{}", render::tasks_json(tasks)?);
        } else if tasks.is_empty() {
            println!("{}", self.palette.warn("No tasks found."));
        } else {
            println!("{}", render::task_table(tasks));
        }
        Ok(())
    }

    fn print_task(&self, task: &Task, message: &str) -> Result<(), AppError> {
        if self.json {
            println!("{}", render::task_json(task)?);
        } else {
            println!("{}", self.palette.succeed(message));
        }
        Ok(())
    }

    pub fn run_command(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Add {
                title,
                description,
                deadline,
            } => {
                let title = title.unwrap_or_default();
                let deadline = deadline.as_deref().map(parse_deadline).transpose()?;
                let added = self.service.add_task(&title, non_blank(description), deadline)?;
                self.report_save(&added);
                let task = &added.value;
                self.print_task(
                    task,
                    &format!("Added task: '{}' with ID {}", task.title(), task.id()),
                )?;
            }
            Command::List {
                sort_by,
                order,
                status,
            } => {
                let sort_by = sort_by
                    .as_deref()
                    .map(SortKey::from_label)
                    .unwrap_or_else(|| self.config.sort_key());
                let order = order
                    .as_deref()
                    .map(SortOrder::from_label)
                    .unwrap_or_else(|| self.config.sort_order());
                let mut tasks = self.service.get_sorted_tasks(sort_by, order);
                if let Some(completed) = StatusFilter::completed(status) {
                    tasks = filter_tasks_by_status(&tasks, completed);
                }
                self.print_tasks(&tasks)?;
            }
            Command::Show { id } => {
                let task = self.service.get_task_by_id(id).ok_or_else(|| not_found(id))?;
                if self.json {
                    println!("{}", render::task_json(&task)?);
                } else {
                    println!("{}", render::task_details(&task));
                }
            }
            Command::Done { id } => {
                let done = self.service.complete_task(id).ok_or_else(|| not_found(id))?;
                self.report_save(&done);
                self.print_task(&done.value, &format!("Task {id} marked as complete"))?;
            }
            Command::Undone { id } => {
                let undone = self
                    .service
                    .incomplete_task(id)
                    .ok_or_else(|| not_found(id))?;
                self.report_save(&undone);
                self.print_task(&undone.value, &format!("Task {id} marked as incomplete"))?;
            }
            Command::Update {
                id,
                title,
                description,
                clear_description,
                deadline,
                clear_deadline,
            } => {
                let mut changes = TaskUpdate::default();
                if let Some(title) = title {
                    changes = changes.with_title(title);
                }
                if clear_description {
                    changes = changes.with_description(None);
                } else if let Some(description) = description {
                    changes = changes.with_description(Some(description));
                }
                if clear_deadline {
                    changes = changes.with_deadline(None);
                } else if let Some(deadline) = deadline.as_deref() {
                    changes = changes.with_deadline(Some(parse_deadline(deadline)?));
                }

                let updated = self
                    .service
                    .update_task(id, &changes)?
                    .ok_or_else(|| not_found(id))?;
                self.report_save(&updated);
                self.print_task(&updated.value, &format!("Task {id} updated"))?;
            }
            Command::Delete { id } => {
                let deleted = self.service.delete_task(id);
                if !deleted.value {
                    return Err(not_found(id));
                }
                self.report_save(&deleted);
                if self.json {
                    println!("{}", serde_json::json!({ "id": id, "deleted": true }));
                } else {
                    println!("{}", self.palette.succeed(&format!("Task {id} deleted")));
                }
            }
        }

        Ok(())
    }
}

pub fn not_found(id: u64) -> AppError {
    AppError::invalid_input(format!("task {id} not found"))
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_deadline(raw: &str) -> Result<OffsetDateTime, AppError> {
    dates::parse_datetime(raw)
        .ok_or_else(|| AppError::invalid_input(format!("unrecognised date '{}'", raw.trim())))
}
