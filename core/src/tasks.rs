//! Task operations on top of the dispatcher.
//!
//! Each method fixes a method and path and hands everything else to
//! [`Dispatcher::request`]. Nothing is validated here; the backend decides
//! what a well-formed task is.

use crate::dispatcher::{ApiRequest, Dispatcher};
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{CompletionToggle, NewTask, NoContent, Task, TaskFilter, TaskUpdate};

const TASKS_PATH: &str = "/tasks";

/// Typed facade over the `/tasks` resource.
#[derive(Debug, Clone)]
pub struct TasksApi<T = ReqwestTransport> {
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> TasksApi<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.dispatcher
            .request(ApiRequest::get(TASKS_PATH).query(filter.to_query()))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Task, ApiError> {
        self.dispatcher.request(ApiRequest::get(task_path(id))).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.dispatcher.request(ApiRequest::post(TASKS_PATH).json(task)).await
    }

    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.dispatcher.request(ApiRequest::put(task_path(id)).json(update)).await
    }

    pub async fn delete(&self, id: &str) -> Result<NoContent, ApiError> {
        self.dispatcher.request(ApiRequest::delete(task_path(id))).await
    }

    pub async fn toggle_completion(&self, id: &str, completed: bool) -> Result<Task, ApiError> {
        let path = format!("{}/complete", task_path(id));
        self.dispatcher
            .request(ApiRequest::patch(path).json(&CompletionToggle { completed }))
            .await
    }
}

fn task_path(id: &str) -> String {
    format!("{TASKS_PATH}/{id}")
}
