/// Task list filtering and sorting
///
/// Parses the `q[...]` query-string mini-language accepted by the v2 task
/// list into a [`TaskQuery`]:
///
/// - `q[title_cont]=note`: case-sensitive substring match on `title`
/// - `q[description_cont]=milk`: case-sensitive substring match on `description`
/// - `q[s]=title ASC`: sort by a field, direction optional (default ascending)
///
/// Filtering always happens before sorting. Without a sort the store's
/// creation order is kept.
///
/// # Example
///
/// ```
/// use taskmanager_shared::query::{SortDirection, TaskField, TaskQuery, TaskQueryParams};
///
/// let params = TaskQueryParams {
///     title_cont: Some("note".to_string()),
///     description_cont: None,
///     sort: Some("title DESC".to_string()),
/// };
///
/// let query = TaskQuery::from_params(&params);
/// assert_eq!(query.contains, Some((TaskField::Title, "note".to_string())));
/// assert_eq!(query.sort, Some((TaskField::Title, SortDirection::Desc)));
/// ```

use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::task::Task;

/// Task attribute usable in filters and sorts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Title,
    Description,
    Done,
    Deadline,
    CreatedAt,
    UpdatedAt,
}

impl TaskField {
    /// Parses an attribute name as it appears on the wire
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(TaskField::Id),
            "title" => Some(TaskField::Title),
            "description" => Some(TaskField::Description),
            "done" => Some(TaskField::Done),
            "deadline" => Some(TaskField::Deadline),
            "created_at" => Some(TaskField::CreatedAt),
            "updated_at" => Some(TaskField::UpdatedAt),
            _ => None,
        }
    }

    /// Column name in the `tasks` table
    pub fn column(&self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Done => "done",
            TaskField::Deadline => "deadline",
            TaskField::CreatedAt => "created_at",
            TaskField::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskField::Id => a.id.cmp(&b.id),
            TaskField::Title => a.title.cmp(&b.title),
            TaskField::Description => a.description.cmp(&b.description),
            TaskField::Done => a.done.cmp(&b.done),
            TaskField::Deadline => a.deadline.cmp(&b.deadline),
            TaskField::CreatedAt => a.created_at.cmp(&b.created_at),
            TaskField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }

    fn text<'a>(&self, task: &'a Task) -> Option<&'a str> {
        match self {
            TaskField::Title => Some(task.title.as_str()),
            TaskField::Description => task.description.as_deref(),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `ASC` / `DESC` in any letter case
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    /// SQL keyword, with NULL placement matching `Option`'s ordering
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        }
    }
}

/// Raw `q[...]` query-string parameters
///
/// `+` in `q[s]=title+ASC` is decoded to a space by the form decoder before
/// it reaches [`TaskQuery::from_params`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQueryParams {
    #[serde(rename = "q[title_cont]")]
    pub title_cont: Option<String>,

    #[serde(rename = "q[description_cont]")]
    pub description_cont: Option<String>,

    #[serde(rename = "q[s]")]
    pub sort: Option<String>,
}

/// Parsed filter and sort for a task list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Substring filter: field and the value it must contain
    pub contains: Option<(TaskField, String)>,

    /// Sort field and direction
    pub sort: Option<(TaskField, SortDirection)>,
}

impl TaskQuery {
    /// A query that returns the full ownership set in creation order
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a query from raw parameters
    ///
    /// An empty filter value matches everything and is dropped. When both
    /// `title_cont` and `description_cont` are given the title filter wins.
    /// Unknown sort fields and directions are ignored.
    pub fn from_params(params: &TaskQueryParams) -> Self {
        let contains = params
            .title_cont
            .as_ref()
            .filter(|value| !value.is_empty())
            .map(|value| (TaskField::Title, value.clone()))
            .or_else(|| {
                params
                    .description_cont
                    .as_ref()
                    .filter(|value| !value.is_empty())
                    .map(|value| (TaskField::Description, value.clone()))
            });

        let sort = params.sort.as_deref().and_then(parse_sort);

        Self { contains, sort }
    }

    /// Whether a task passes the filter
    pub fn matches(&self, task: &Task) -> bool {
        match &self.contains {
            Some((field, needle)) => field
                .text(task)
                .map(|haystack| haystack.contains(needle.as_str()))
                .unwrap_or(false),
            None => true,
        }
    }

    /// Applies filter then sort to tasks given in creation order
    ///
    /// The sort is stable, so ties keep creation order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|task| self.matches(task)).collect();

        if let Some((field, direction)) = self.sort {
            tasks.sort_by(|a, b| {
                let ordering = field.compare(a, b);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        tasks
    }
}

/// Parses `"<field> [ASC|DESC]"`
fn parse_sort(value: &str) -> Option<(TaskField, SortDirection)> {
    let mut parts = value.split_whitespace();
    let field = TaskField::parse(parts.next()?)?;

    let direction = match parts.next() {
        Some(direction) => SortDirection::parse(direction)?,
        None => SortDirection::Asc,
    };

    Some((field, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn task(title: &str, description: Option<&str>, offset_secs: i64) -> Task {
        let created_at = Utc::now() + Duration::seconds(offset_secs);
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            title: title.to_string(),
            description: description.map(str::to_string),
            done: false,
            deadline: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    fn fixture() -> Vec<Task> {
        vec![
            task("Check is the notebook is broken", None, 0),
            task("Buy a new notebook", Some("the cheap one"), 1),
            task("Fix the door", None, 2),
            task("Buy a new car", Some("electric"), 3),
        ]
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_sort("title ASC"),
            Some((TaskField::Title, SortDirection::Asc))
        );
        assert_eq!(
            parse_sort("created_at desc"),
            Some((TaskField::CreatedAt, SortDirection::Desc))
        );
        assert_eq!(parse_sort("title"), Some((TaskField::Title, SortDirection::Asc)));
        assert_eq!(parse_sort("password ASC"), None);
        assert_eq!(parse_sort("title sideways"), None);
        assert_eq!(parse_sort(""), None);
    }

    #[test]
    fn test_from_params_empty() {
        let query = TaskQuery::from_params(&TaskQueryParams::default());
        assert_eq!(query, TaskQuery::all());
    }

    #[test]
    fn test_from_params_drops_empty_filter() {
        let params = TaskQueryParams {
            title_cont: Some(String::new()),
            ..Default::default()
        };
        assert!(TaskQuery::from_params(&params).contains.is_none());
    }

    #[test]
    fn test_filter_keeps_creation_order() {
        let params = TaskQueryParams {
            title_cont: Some("note".to_string()),
            ..Default::default()
        };

        let result = TaskQuery::from_params(&params).apply(fixture());
        assert_eq!(
            titles(&result),
            vec!["Check is the notebook is broken", "Buy a new notebook"]
        );
    }

    #[test]
    fn test_filter_then_sort() {
        let params = TaskQueryParams {
            title_cont: Some("note".to_string()),
            sort: Some("title ASC".to_string()),
            ..Default::default()
        };

        let result = TaskQuery::from_params(&params).apply(fixture());
        assert_eq!(
            titles(&result),
            vec!["Buy a new notebook", "Check is the notebook is broken"]
        );
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let params = TaskQueryParams {
            title_cont: Some("Note".to_string()),
            ..Default::default()
        };

        let result = TaskQuery::from_params(&params).apply(fixture());
        assert!(result.is_empty());
    }

    #[test]
    fn test_description_filter_skips_missing_descriptions() {
        let params = TaskQueryParams {
            description_cont: Some("e".to_string()),
            ..Default::default()
        };

        let result = TaskQuery::from_params(&params).apply(fixture());
        assert_eq!(titles(&result), vec!["Buy a new notebook", "Buy a new car"]);
    }

    #[test]
    fn test_sort_descending_without_filter() {
        let query = TaskQuery {
            contains: None,
            sort: Some((TaskField::CreatedAt, SortDirection::Desc)),
        };

        let result = query.apply(fixture());
        assert_eq!(
            titles(&result),
            vec![
                "Buy a new car",
                "Fix the door",
                "Buy a new notebook",
                "Check is the notebook is broken",
            ]
        );
    }

    #[test]
    fn test_sort_direction_sql() {
        assert_eq!(SortDirection::Asc.sql(), "ASC NULLS FIRST");
        assert_eq!(SortDirection::Desc.sql(), "DESC NULLS LAST");
    }
}
