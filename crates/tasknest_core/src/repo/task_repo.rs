//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD + ordering APIs over `tasks` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every statement is scoped by `user_id`.
//! - Position updates are issued one record at a time; reordering carries no
//!   transaction guarantee.

use crate::model::task::{
    BucketId, Effort, Priority, RecurrenceInterval, Subtask, Task, TaskId, UserId,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    bucket_uuid,
    title,
    description,
    priority,
    effort,
    due_date,
    completed,
    recurring,
    recurrence,
    position,
    created_at,
    updated_at
FROM tasks";

/// Bucket scoping for task list queries.
///
/// `Bucket(None)` selects tasks of the implicit default bucket
/// (`bucket_uuid IS NULL`); `Any` disables bucket scoping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketFilter {
    #[default]
    Any,
    Bucket(Option<BucketId>),
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub bucket: BucketFilter,
    /// `None` returns complete and incomplete tasks alike.
    pub completed: Option<bool>,
    /// Exact match against the normalized label set.
    pub label: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task CRUD and ordering operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Full-record replacement, labels and subtasks included.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Results are ordered by bucket, then position.
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Persists one position index. Reorder flows call this per affected
    /// record, sequentially.
    fn update_position(&self, id: TaskId, position: u32) -> RepoResult<()>;
    /// Next free (append-at-end) position within the given bucket.
    fn next_position(&self, bucket: Option<BucketId>) -> RepoResult<u32>;
}

/// SQLite-backed task repository scoped to one owner.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
    user_id: UserId,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection, user_id: UserId) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, user_id })
    }

    fn replace_children(&self, task: &Task) -> RepoResult<()> {
        let task_uuid = task.id.to_string();
        self.conn.execute(
            "DELETE FROM subtasks WHERE task_uuid = ?1;",
            [task_uuid.as_str()],
        )?;
        for (index, subtask) in task.subtasks.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO subtasks (uuid, task_uuid, title, completed, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    subtask.id.to_string(),
                    task_uuid.as_str(),
                    subtask.title.as_str(),
                    bool_to_int(subtask.completed),
                    index as i64,
                ],
            )?;
        }

        self.conn.execute(
            "DELETE FROM task_labels WHERE task_uuid = ?1;",
            [task_uuid.as_str()],
        )?;
        for label in &task.labels {
            self.conn.execute(
                "INSERT OR IGNORE INTO task_labels (task_uuid, label) VALUES (?1, ?2);",
                params![task_uuid.as_str(), label.as_str()],
            )?;
        }

        Ok(())
    }

    fn load_children(&self, task: &mut Task) -> RepoResult<()> {
        let task_uuid = task.id.to_string();

        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, completed
             FROM subtasks
             WHERE task_uuid = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([task_uuid.as_str()])?;
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            task.subtasks.push(Subtask {
                id: parse_uuid(&uuid_text, "subtasks.uuid")?,
                title: row.get("title")?,
                completed: int_to_bool(row.get("completed")?, "subtasks.completed")?,
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT label
             FROM task_labels
             WHERE task_uuid = ?1
             ORDER BY label ASC;",
        )?;
        let mut rows = stmt.query([task_uuid.as_str()])?;
        while let Some(row) = rows.next()? {
            task.labels.push(row.get("label")?);
        }

        Ok(())
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                user_id,
                bucket_uuid,
                title,
                description,
                priority,
                effort,
                due_date,
                completed,
                recurring,
                recurrence,
                position,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                task.id.to_string(),
                self.user_id.to_string(),
                task.bucket_id.map(|id| id.to_string()),
                task.title.as_str(),
                task.description.as_deref(),
                priority_to_db(task.priority),
                effort_to_db(task.effort),
                task.due_date.map(date_to_db),
                bool_to_int(task.completed),
                bool_to_int(task.recurring),
                task.recurrence.map(recurrence_to_db),
                i64::from(task.position),
                task.created_at,
                task.updated_at,
            ],
        )?;
        self.replace_children(task)?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                bucket_uuid = ?1,
                title = ?2,
                description = ?3,
                priority = ?4,
                effort = ?5,
                due_date = ?6,
                completed = ?7,
                recurring = ?8,
                recurrence = ?9,
                position = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?11 AND user_id = ?12;",
            params![
                task.bucket_id.map(|id| id.to_string()),
                task.title.as_str(),
                task.description.as_deref(),
                priority_to_db(task.priority),
                effort_to_db(task.effort),
                task.due_date.map(date_to_db),
                bool_to_int(task.completed),
                bool_to_int(task.recurring),
                task.recurrence.map(recurrence_to_db),
                i64::from(task.position),
                task.id.to_string(),
                self.user_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        self.replace_children(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE uuid = ?1 AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), self.user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            self.load_children(&mut task)?;
            task.validate()?;
            return Ok(Some(task));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(self.user_id.to_string())];

        match query.bucket {
            BucketFilter::Any => {}
            BucketFilter::Bucket(None) => sql.push_str(" AND bucket_uuid IS NULL"),
            BucketFilter::Bucket(Some(bucket_id)) => {
                sql.push_str(" AND bucket_uuid = ?");
                bind_values.push(Value::Text(bucket_id.to_string()));
            }
        }

        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }

        if let Some(label) = query.label.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM task_labels tl
                    WHERE tl.task_uuid = tasks.uuid
                      AND tl.label = ?
                )",
            );
            bind_values.push(Value::Text(label.clone()));
        }

        if let Some(due_from) = query.due_from {
            sql.push_str(" AND due_date >= ?");
            bind_values.push(Value::Text(date_to_db(due_from)));
        }
        if let Some(due_to) = query.due_to {
            sql.push_str(" AND due_date <= ?");
            bind_values.push(Value::Text(date_to_db(due_to)));
        }

        sql.push_str(" ORDER BY COALESCE(bucket_uuid, '') ASC, position ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            self.load_children(&mut task)?;
            task.validate()?;
            tasks.push(task);
        }

        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        // Subtasks and labels go with the row via ON DELETE CASCADE.
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), self.user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn update_position(&self, id: TaskId, position: u32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                position = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2 AND user_id = ?3;",
            params![
                i64::from(position),
                id.to_string(),
                self.user_id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn next_position(&self, bucket: Option<BucketId>) -> RepoResult<u32> {
        let position: i64 = match bucket {
            Some(bucket_id) => self.conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0)
                 FROM tasks
                 WHERE user_id = ?1 AND bucket_uuid = ?2;",
                params![self.user_id.to_string(), bucket_id.to_string()],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0)
                 FROM tasks
                 WHERE user_id = ?1 AND bucket_uuid IS NULL;",
                [self.user_id.to_string()],
                |row| row.get(0),
            )?,
        };

        Ok(position as u32)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_id")?;
    let bucket_text: Option<String> = row.get("bucket_uuid")?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in tasks.priority"))
    })?;

    let effort_text: String = row.get("effort")?;
    let effort = parse_effort(&effort_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid effort `{effort_text}` in tasks.effort"))
    })?;

    let recurrence = match row.get::<_, Option<String>>("recurrence")? {
        Some(value) => Some(parse_recurrence(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid recurrence `{value}` in tasks.recurrence"
            ))
        })?),
        None => None,
    };

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_date(&value)?),
        None => None,
    };

    Ok(Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        user_id: parse_uuid(&user_text, "tasks.user_id")?,
        bucket_id: match bucket_text {
            Some(value) => Some(parse_uuid(&value, "tasks.bucket_uuid")?),
            None => None,
        },
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        effort,
        labels: Vec::new(),
        due_date,
        completed: int_to_bool(row.get("completed")?, "tasks.completed")?,
        recurring: int_to_bool(row.get("recurring")?, "tasks.recurring")?,
        recurrence,
        position: parse_position(row.get("position")?, "tasks.position")?,
        subtasks: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_position(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid position value `{value}` in {column}"))
    })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{value}` in tasks.due_date"))
    })
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
        Priority::Urgent => "urgent",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "low" => Some(Priority::Low),
        "medium" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        "urgent" => Some(Priority::Urgent),
        _ => None,
    }
}

fn effort_to_db(effort: Effort) -> &'static str {
    match effort {
        Effort::Quick => "quick",
        Effort::Medium => "medium",
        Effort::Long => "long",
        Effort::Massive => "massive",
    }
}

fn parse_effort(value: &str) -> Option<Effort> {
    match value {
        "quick" => Some(Effort::Quick),
        "medium" => Some(Effort::Medium),
        "long" => Some(Effort::Long),
        "massive" => Some(Effort::Massive),
        _ => None,
    }
}

fn recurrence_to_db(interval: RecurrenceInterval) -> &'static str {
    match interval {
        RecurrenceInterval::Daily => "daily",
        RecurrenceInterval::Weekly => "weekly",
        RecurrenceInterval::Monthly => "monthly",
        RecurrenceInterval::Yearly => "yearly",
    }
}

fn parse_recurrence(value: &str) -> Option<RecurrenceInterval> {
    match value {
        "daily" => Some(RecurrenceInterval::Daily),
        "weekly" => Some(RecurrenceInterval::Weekly),
        "monthly" => Some(RecurrenceInterval::Monthly),
        "yearly" => Some(RecurrenceInterval::Yearly),
        _ => None,
    }
}
