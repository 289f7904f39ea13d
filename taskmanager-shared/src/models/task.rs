/// Task model and database operations
///
/// A task belongs to exactly one user. Ownership is set at creation and never
/// changes, and every query here is scoped by the owner's ID so a user can
/// never read or modify another user's task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL CHECK (btrim(title) <> ''),
///     description TEXT,
///     done BOOLEAN NOT NULL DEFAULT FALSE,
///     deadline TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskmanager_shared::models::task::{NewTask, Task};
/// use taskmanager_shared::query::TaskQuery;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, owner, NewTask {
///     title: "Buy a new notebook".to_string(),
///     description: None,
///     done: false,
///     deadline: None,
/// }).await?;
///
/// let all = Task::list_for_owner(&pool, owner, &TaskQuery::all()).await?;
/// assert!(all.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::query::TaskQuery;

/// Number of characters kept in [`Task::short_description`]
pub const SHORT_DESCRIPTION_LENGTH: usize = 40;

/// Maximum title length (matches the `VARCHAR(255)` column)
pub const MAX_TITLE_LENGTH: usize = 255;

/// Task owned by a user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owner; immutable after creation
    pub user_id: Uuid,

    /// Non-blank title
    pub title: String,

    /// Free-form description
    pub description: Option<String>,

    /// Completion flag
    pub done: bool,

    /// Optional due date
    pub deadline: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// First 40 characters of the description
    ///
    /// Shorter descriptions are returned unaltered; a missing description
    /// yields an empty string.
    pub fn short_description(&self) -> String {
        self.description
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(SHORT_DESCRIPTION_LENGTH)
            .collect()
    }
}

/// Validated input for creating a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    pub deadline: Option<DateTime<Utc>>,
}

/// Validated partial update
///
/// `None` leaves a field untouched. For nullable columns `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub done: Option<bool>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    /// Writes the supplied fields onto an in-memory task
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
    }
}

/// Task attributes as sent by clients inside `{"task": {...}}`
///
/// Anything else in the payload (including `user_id`) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskParams {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default)]
    pub done: Option<bool>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`)
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl TaskParams {
    /// Validates the payload for creation
    ///
    /// # Errors
    ///
    /// Returns field errors keyed by attribute name when the title is
    /// missing, blank or too long.
    pub fn into_new_task(self) -> Result<NewTask, ValidationErrors> {
        check_title(self.title.as_deref(), true)?;

        Ok(NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description.flatten(),
            done: self.done.unwrap_or(false),
            deadline: self.deadline.flatten(),
        })
    }

    /// Validates the payload for a partial update
    ///
    /// A title is only checked when supplied.
    pub fn into_changes(self) -> Result<TaskChanges, ValidationErrors> {
        check_title(self.title.as_deref(), false)?;

        Ok(TaskChanges {
            title: self.title,
            description: self.description,
            done: self.done,
            deadline: self.deadline,
        })
    }
}

fn check_title(title: Option<&str>, required: bool) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match title {
        Some(title) if title.trim().is_empty() => {
            errors.add("title", field_error("blank", "can't be blank"));
        }
        Some(title) if title.chars().count() > MAX_TITLE_LENGTH => {
            errors.add(
                "title",
                field_error("too_long", "is too long (maximum is 255 characters)"),
            );
        }
        None if required => {
            errors.add("title", field_error("blank", "can't be blank"));
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, done, deadline, created_at, updated_at";

impl Task {
    /// Inserts a task owned by `owner`
    pub async fn create(pool: &PgPool, owner: Uuid, data: NewTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (user_id, title, description, done, deadline)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(owner)
            .bind(data.title)
            .bind(data.description)
            .bind(data.done)
            .bind(data.deadline)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID, only if `owner` owns it
    pub async fn find_for_owner(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// Lists the owner's tasks, filtered and sorted by `query`
    ///
    /// Without a sort, tasks come back in creation order. Substring matching
    /// uses `strpos`, which is case-sensitive and needs no LIKE escaping.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner: Uuid,
        query: &TaskQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);

        if let Some((field, _)) = &query.contains {
            sql.push_str(&format!(" AND strpos({}, $2) > 0", field.column()));
        }

        match query.sort {
            Some((field, direction)) => sql.push_str(&format!(
                " ORDER BY {} {}, created_at ASC, id ASC",
                field.column(),
                direction.sql()
            )),
            None => sql.push_str(" ORDER BY created_at ASC, id ASC"),
        }

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner);

        if let Some((_, needle)) = &query.contains {
            q = q.bind(needle.as_str());
        }

        q.fetch_all(pool).await
    }

    /// Applies a partial update to an owned task
    ///
    /// # Returns
    ///
    /// The updated task, or None if it doesn't exist or isn't owned by `owner`
    pub async fn update(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        data: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = clock_timestamp()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.done.is_some() {
            bind_count += 1;
            query.push_str(&format!(", done = ${}", bind_count));
        }
        if data.deadline.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deadline = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(done) = data.done {
            q = q.bind(done);
        }
        if let Some(deadline) = data.deadline {
            q = q.bind(deadline);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an owned task
    ///
    /// # Returns
    ///
    /// True if a task was deleted, false if it didn't exist or isn't owned
    /// by `owner`
    pub async fn delete(pool: &PgPool, owner: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
