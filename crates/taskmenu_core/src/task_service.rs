use crate::error::AppError;
use crate::model::{Task, TaskFields, TaskUpdate};
use crate::storage::{Persisted, TaskStore};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Deadline,
    Status,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::CreatedAt, SortKey::Deadline, SortKey::Status];

    /// Case-insensitive; anything unrecognised sorts by creation time.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "deadline" => Self::Deadline,
            "status" => Self::Status,
            _ => Self::CreatedAt,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Deadline => "deadline",
            Self::Status => "status",
        }
    }
}

impl From<&str> for SortKey {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 2] = [SortOrder::Asc, SortOrder::Desc];

    /// Case-insensitive; anything other than `desc` is ascending.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl From<&str> for SortOrder {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task operations on top of a [`TaskStore`].
///
/// Nothing is cached here: every call reads the current copy from the store.
#[derive(Debug)]
pub struct TaskService {
    store: TaskStore,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(TaskStore::open(path))
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn add_task(
        &mut self,
        title: &str,
        description: Option<String>,
        deadline: Option<OffsetDateTime>,
    ) -> Result<Persisted<Task>, AppError> {
        let task = Task::with_fields(
            0,
            title,
            TaskFields {
                description,
                deadline,
                ..TaskFields::default()
            },
        )?;
        self.store.add(task)
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.store.get_all()
    }

    pub fn get_task_by_id(&self, id: u64) -> Option<Task> {
        self.store.get_by_id(id)
    }

    pub fn get_tasks_by_status(&self, completed: bool) -> Vec<Task> {
        self.store.get_by_status(completed)
    }

    /// Applies `changes` to task `id`, keeping its completion status.
    ///
    /// `Ok(None)` means there is no such task. A blank title fails without
    /// touching the stored copy.
    pub fn update_task(
        &mut self,
        id: u64,
        changes: &TaskUpdate,
    ) -> Result<Option<Persisted<Task>>, AppError> {
        let Some(mut task) = self.store.get_by_id(id) else {
            return Ok(None);
        };

        let completed = task.is_completed();
        task.update(changes)?;
        task.restore_status(completed);

        Ok(self.store.update(task))
    }

    pub fn complete_task(&mut self, id: u64) -> Option<Persisted<Task>> {
        let mut task = self.store.get_by_id(id)?;
        task.complete();
        self.store.update(task)
    }

    pub fn incomplete_task(&mut self, id: u64) -> Option<Persisted<Task>> {
        let mut task = self.store.get_by_id(id)?;
        task.incomplete();
        self.store.update(task)
    }

    pub fn delete_task(&mut self, id: u64) -> Persisted<bool> {
        self.store.delete(id)
    }

    pub fn get_sorted_tasks(&self, sort_by: SortKey, order: SortOrder) -> Vec<Task> {
        sort_tasks(&self.get_all_tasks(), sort_by, order)
    }

    pub fn get_filtered_tasks(&self, completed: bool) -> Vec<Task> {
        filter_tasks_by_status(&self.get_all_tasks(), completed)
    }
}

/// Stable sort of `tasks`.
///
/// For [`SortKey::Deadline`], tasks without a deadline count as the latest
/// possible deadline: last when ascending, first when descending.
pub fn sort_tasks(tasks: &[Task], sort_by: SortKey, order: SortOrder) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match sort_by {
            SortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortKey::Deadline => compare_deadlines(a.deadline(), b.deadline()),
            SortKey::Status => a.is_completed().cmp(&b.is_completed()),
        };
        order.apply(ordering)
    });
    sorted
}

pub fn filter_tasks_by_status(tasks: &[Task], completed: bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.is_completed() == completed)
        .cloned()
        .collect()
}

fn compare_deadlines(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
