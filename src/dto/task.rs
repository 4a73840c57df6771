use crate::domain;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Optional fields may be left out, but an explicit `null` is not a value
fn reject_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[cfg_attr(test, derive(Serialize, Debug))]
pub struct NewTask {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 300))]
    #[serde(default, deserialize_with = "reject_null")]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask {
            title: value.title,
            description: value.description,
            done: value.done,
        }
    }
}

/// DTO for a returned task on the API. Whether the task is done is never reported back.
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct TodoTask {
    pub todo_id: i32,
    pub title: String,
    pub description: Option<String>,
}

impl From<domain::todo::TodoTask> for TodoTask {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoTask {
            todo_id: value.id,
            title: value.title,
            description: value.description,
        }
    }
}

/// DTO for the list of the caller's tasks
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TaskList {
    pub todo: Vec<TodoTask>,
}

/// DTO for updating a task's content via the API. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 100))]
    #[serde(default, deserialize_with = "reject_null")]
    pub title: Option<String>,
    #[validate(length(max = 300))]
    #[serde(default, deserialize_with = "reject_null")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub done: Option<bool>,
}

impl From<UpdateTask> for domain::todo::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::todo::UpdateTask {
            title: value.title,
            description: value.description,
            done: value.done,
        }
    }
}
