use crate::dates;
use crate::error::AppError;
use crate::model::timestamp;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single to-do record.
///
/// Fields are read through accessors so the title can never be blank and
/// `updated_at` never falls behind `created_at`. An `id` of `0` means the
/// store has not assigned one yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    id: u64,
    title: String,
    description: Option<String>,
    completed: bool,
    #[serde(with = "timestamp")]
    created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    updated_at: OffsetDateTime,
    #[serde(with = "timestamp::option")]
    deadline: Option<OffsetDateTime>,
}

/// Optional values accepted when constructing a [`Task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub deadline: Option<OffsetDateTime>,
}

/// Partial update for [`Task::update`].
///
/// `None` leaves a field untouched. For description and deadline,
/// `Some(None)` clears the field; a blank description clears it as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<OffsetDateTime>>,
}

impl TaskUpdate {
    pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<OffsetDateTime>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Deserialize)]
struct TaskRecord {
    id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default, with = "timestamp::option")]
    created_at: Option<OffsetDateTime>,
    #[serde(default, with = "timestamp::option")]
    updated_at: Option<OffsetDateTime>,
    #[serde(default, with = "timestamp::option")]
    deadline: Option<OffsetDateTime>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = AppError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if record.id == 0 {
            return Err(AppError::invalid_data("stored task id must be positive"));
        }
        Task::with_fields(
            record.id,
            &record.title,
            TaskFields {
                description: record.description,
                completed: record.completed,
                created_at: record.created_at,
                updated_at: record.updated_at,
                deadline: record.deadline,
            },
        )
    }
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

impl Task {
    pub fn new(id: u64, title: &str) -> Result<Self, AppError> {
        Self::with_fields(id, title, TaskFields::default())
    }

    /// Builds a task, defaulting missing timestamps to the current time.
    pub fn with_fields(id: u64, title: &str, fields: TaskFields) -> Result<Self, AppError> {
        let title = validate_title(title)?;
        let now = dates::now();
        let created_at = fields.created_at.unwrap_or(now);
        let updated_at = fields.updated_at.unwrap_or(now).max(created_at);

        Ok(Self {
            id,
            title,
            description: fields.description,
            completed: fields.completed,
            created_at,
            updated_at,
            deadline: fields.deadline,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.deadline
    }

    pub fn complete(&mut self) {
        self.completed = true;
        self.touch();
    }

    pub fn incomplete(&mut self) {
        self.completed = false;
        self.touch();
    }

    /// Applies the provided fields. Nothing changes if the new title is blank.
    pub fn update(&mut self, changes: &TaskUpdate) -> Result<(), AppError> {
        let title = changes.title.as_deref().map(validate_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = &changes.description {
            self.description = description
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string);
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = deadline;
        }
        self.touch();

        Ok(())
    }

    pub fn to_record(&self) -> Result<serde_json::Value, AppError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_record(record: serde_json::Value) -> Result<Self, AppError> {
        Ok(serde_json::from_value(record)?)
    }

    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    pub(crate) fn restore_status(&mut self, completed: bool) {
        self.completed = completed;
    }

    fn touch(&mut self) {
        self.updated_at = dates::now().max(self.created_at);
    }
}
