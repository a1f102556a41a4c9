use crate::error::AppError;
use crate::model::Task;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STORE_ENV_VAR: &str = "TASKMENU_STORE_PATH";
const STORE_FILE_NAME: &str = "todos.json";

/// Result of a mutation whose in-memory effect has been applied.
///
/// `save_error` carries the failure of the follow-up file rewrite, if any.
/// The mutation is not rolled back in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted<T> {
    pub value: T,
    pub save_error: Option<AppError>,
}

impl<T> Persisted<T> {
    pub fn is_durable(&self) -> bool {
        self.save_error.is_none()
    }
}

/// Authoritative task collection, mirrored to a JSON file on every change.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: IndexMap<u64, Task>,
    next_id: u64,
}

pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskmenu").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskmenu")
            .join(STORE_FILE_NAME))
    }
}

/// Reads every task from `path`. A missing file is an empty list.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let tasks: Vec<Task> = serde_json::from_str(&content)?;
    if let Some(task) = tasks.iter().find(|task| id_after(task.id()).is_err()) {
        return Err(AppError::invalid_data(format!(
            "task id {} leaves no room for new ids",
            task.id()
        )));
    }
    Ok(tasks)
}

fn id_after(id: u64) -> Result<u64, AppError> {
    id.checked_add(1)
        .ok_or_else(|| AppError::invalid_input(format!("task id {id} is out of range")))
}

pub fn save_tasks<'a, I>(path: &Path, tasks: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = &'a Task>,
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let records: Vec<&Task> = tasks.into_iter().collect();
    let content = serde_json::to_string_pretty(&records)?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    Ok(())
}

impl TaskStore {
    /// Opens the store at `path`, loading whatever is already there.
    ///
    /// An unreadable or malformed file leaves the store empty with the
    /// allocator at 1; the file itself is only replaced by the next write.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let loaded = match load_tasks(&path) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "task file unreadable, starting empty");
                Vec::new()
            }
        };

        let mut tasks = IndexMap::with_capacity(loaded.len());
        let mut next_id = 1;
        for task in loaded {
            if task.id() >= next_id {
                next_id = task.id().saturating_add(1);
            }
            tasks.insert(task.id(), task);
        }
        debug!(path = %path.display(), count = tasks.len(), next_id, "loaded tasks");

        Self {
            path,
            tasks,
            next_id,
        }
    }

    /// Id the next unnumbered task will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Inserts `task`, numbering it first if its id is `0`.
    ///
    /// Fails without touching the store when no id can follow the task's.
    pub fn add(&mut self, mut task: Task) -> Result<Persisted<Task>, AppError> {
        if task.id() == 0 {
            task.assign_id(self.next_id);
        }
        let following = id_after(task.id())?;
        if following > self.next_id {
            self.next_id = following;
        }
        info!(id = task.id(), "task stored");

        self.tasks.insert(task.id(), task.clone());
        Ok(Persisted {
            value: task,
            save_error: self.save().err(),
        })
    }

    pub fn get_by_id(&self, id: u64) -> Option<Task> {
        self.tasks.get(&id).cloned()
    }

    pub fn get_all(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Replaces an existing task. Returns `None` when the id is unknown.
    pub fn update(&mut self, task: Task) -> Option<Persisted<Task>> {
        let slot = self.tasks.get_mut(&task.id())?;
        *slot = task.clone();

        Some(Persisted {
            value: task,
            save_error: self.save().err(),
        })
    }

    pub fn delete(&mut self, id: u64) -> Persisted<bool> {
        if self.tasks.shift_remove(&id).is_none() {
            return Persisted {
                value: false,
                save_error: None,
            };
        }
        info!(id, "task deleted");

        Persisted {
            value: true,
            save_error: self.save().err(),
        }
    }

    pub fn get_by_status(&self, completed: bool) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|task| task.is_completed() == completed)
            .cloned()
            .collect()
    }

    fn save(&self) -> Result<(), AppError> {
        match save_tasks(&self.path, self.tasks.values()) {
            Ok(()) => {
                debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
                Ok(())
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to save tasks");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskStore, load_tasks, save_tasks};
    use crate::model::{Task, TaskFields};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskmenu-{nanos}-{file_name}"))
    }

    fn task(id: u64, title: &str, completed: bool) -> Task {
        Task::with_fields(
            id,
            title,
            TaskFields {
                completed,
                created_at: Some(datetime!(2025-12-20 00:00 UTC)),
                ..TaskFields::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn missing_file_starts_empty() {
        let path = temp_path("missing.json");
        let store = TaskStore::open(&path);

        assert!(store.is_empty());
        assert_eq!(store.next_id(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn add_assigns_monotonic_ids_and_persists() {
        let path = temp_path("add.json");
        let mut store = TaskStore::open(&path);

        let first = store.add(Task::new(0, "first").unwrap()).unwrap();
        let second = store.add(Task::new(0, "second").unwrap()).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(first.is_durable());
        assert_eq!(first.value.id(), 1);
        assert_eq!(second.value.id(), 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1], second.value);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let path = temp_path("reuse.json");
        let mut store = TaskStore::open(&path);
        store.add(Task::new(0, "one").unwrap()).unwrap();
        store.add(Task::new(0, "two").unwrap()).unwrap();

        assert!(store.delete(2).value);
        let third = store.add(Task::new(0, "three").unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(third.value.id(), 3);
    }

    #[test]
    fn explicit_ids_advance_the_allocator() {
        let path = temp_path("explicit.json");
        let mut store = TaskStore::open(&path);

        store.add(task(10, "imported", false)).unwrap();
        let next = store.add(Task::new(0, "fresh").unwrap()).unwrap();
        let low = store.add(task(4, "backfilled", false)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(next.value.id(), 11);
        assert_eq!(low.value.id(), 4);
        assert_eq!(store.next_id(), 12);
    }

    #[test]
    fn add_rejects_ids_with_no_successor() {
        let path = temp_path("max-id.json");
        let mut store = TaskStore::open(&path);
        store.add(task(u64::MAX - 1, "penultimate", false)).unwrap();

        let explicit = store.add(task(u64::MAX, "last", false)).unwrap_err();
        let numbered = store.add(Task::new(0, "overflow").unwrap()).unwrap_err();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(explicit.code(), "invalid_input");
        assert_eq!(numbered.code(), "invalid_input");
        assert_eq!(store.len(), 1);
        assert_eq!(store.next_id(), u64::MAX);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn reopening_continues_after_highest_id() {
        let path = temp_path("reopen.json");
        save_tasks(&path, &[task(3, "c", false), task(8, "h", true)]).unwrap();

        let mut store = TaskStore::open(&path);
        let added = store.add(Task::new(0, "next").unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(store.len(), 3);
        assert_eq!(added.value.id(), 9);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "[{\"id\": 1, \"title\": \"half").unwrap();

        let store = TaskStore::open(&path);
        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(store.is_empty());
        assert_eq!(store.next_id(), 1);
        assert!(content.starts_with("[{"));
    }

    #[test]
    fn invalid_records_fall_back_to_empty() {
        let cases = [
            "[{\"title\": \"no id\"}]",
            "[{\"id\": 1, \"title\": \"   \"}]",
            "[{\"id\": 1, \"title\": \"a\", \"created_at\": \"not a time\"}]",
            "{\"schema_version\": 5, \"tasks\": []}",
            "[{\"id\": 0, \"title\": \"unnumbered\"}]",
            "[{\"id\": 18446744073709551615, \"title\": \"last\"}]",
        ];

        for (index, content) in cases.iter().enumerate() {
            let path = temp_path(&format!("invalid-{index}.json"));
            fs::write(&path, content).unwrap();

            let store = TaskStore::open(&path);
            fs::remove_file(&path).ok();

            assert!(store.is_empty(), "case {index} should be rejected");
            assert_eq!(store.next_id(), 1);
        }
    }

    #[test]
    fn update_replaces_only_known_ids() {
        let path = temp_path("update.json");
        let mut store = TaskStore::open(&path);
        let mut stored = store.add(Task::new(0, "draft").unwrap()).unwrap().value;

        stored.complete();
        let updated = store.update(stored.clone()).unwrap();
        let missing = store.update(task(42, "ghost", false));
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(updated.value, stored);
        assert!(missing.is_none());
        assert_eq!(store.len(), 1);
        assert!(loaded[0].is_completed());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let path = temp_path("delete.json");
        let mut store = TaskStore::open(&path);
        store.add(Task::new(0, "a").unwrap()).unwrap();
        store.add(Task::new(0, "b").unwrap()).unwrap();
        store.add(Task::new(0, "c").unwrap()).unwrap();

        assert!(store.delete(2).value);
        assert!(!store.delete(2).value);
        let ids: Vec<u64> = store.get_all().iter().map(Task::id).collect();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn get_by_status_preserves_insertion_order() {
        let path = temp_path("status.json");
        let mut store = TaskStore::open(&path);
        store.add(task(5, "e", true)).unwrap();
        store.add(task(1, "a", false)).unwrap();
        store.add(task(3, "c", true)).unwrap();

        let done: Vec<u64> = store.get_by_status(true).iter().map(Task::id).collect();
        let open: Vec<u64> = store.get_by_status(false).iter().map(Task::id).collect();
        fs::remove_file(&path).ok();

        assert_eq!(done, vec![5, 3]);
        assert_eq!(open, vec![1]);
    }

    #[test]
    fn write_failure_keeps_in_memory_change() {
        let dir = temp_path("store-dir");
        fs::create_dir_all(&dir).unwrap();

        let mut store = TaskStore::open(&dir);
        let added = store.add(Task::new(0, "volatile").unwrap()).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert!(!added.is_durable());
        assert_eq!(added.save_error.as_ref().map(|err| err.code()), Some("io_error"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id(1).map(|task| task.title().to_string()), Some("volatile".to_string()));
    }

    #[test]
    fn file_uses_the_fixed_record_layout() {
        let path = temp_path("layout.json");
        let mut store = TaskStore::open(&path);
        store.add(Task::new(0, "demo").unwrap()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        let records: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(content.starts_with("[\n  {\n    \"id\": 1,"));
        let record = &records[0];
        for key in [
            "id",
            "title",
            "description",
            "completed",
            "created_at",
            "updated_at",
            "deadline",
        ] {
            assert!(record.get(key).is_some(), "missing {key}");
        }
        assert!(record["deadline"].is_null());
    }
}
