//! HTTP task store
//!
//! `TaskStore` over the `/api/tasks` collection.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use dotask_core::task::{NewTask, Task, TaskStore, UpdatableTask};
use dotask_core::{Error, Result};

use crate::api::ApiClient;

const TASKS_PATH: &str = "/api/tasks";

pub struct HttpTaskStore {
    api: ApiClient,
}

impl HttpTaskStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn task_path(id: i64) -> String {
        format!("{}/{}", TASKS_PATH, id)
    }

    /// Decoded tasks must satisfy the completion invariant
    fn validated(tasks: Vec<Task>) -> Result<Vec<Task>> {
        for task in &tasks {
            task.check_invariants()?;
        }
        Ok(tasks)
    }

    async fn fetch_list(&self, path: &str) -> Result<Vec<Task>> {
        let request = self.api.request(Method::GET, path);
        let response = self.api.send_authorized(request).await?;
        let tasks: Vec<Task> = ApiClient::decode(response).await?;
        debug!("Received {} tasks from {}", tasks.len(), path);
        Self::validated(tasks)
    }
}

/// Map a 404 on a single-task endpoint to `TaskNotFound`
fn not_found_as(id: i64) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::Http { status: 404, .. } => Error::TaskNotFound(id),
        other => other,
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        self.fetch_list(TASKS_PATH).await
    }

    async fn list_all(&self) -> Result<Vec<Task>> {
        self.fetch_list(&format!("{}/all", TASKS_PATH)).await
    }

    async fn list_completed(&self) -> Result<Vec<Task>> {
        self.fetch_list(&format!("{}/completed", TASKS_PATH)).await
    }

    async fn get(&self, id: i64) -> Result<Option<Task>> {
        let request = self.api.request(Method::GET, &Self::task_path(id));
        match self.api.send_authorized(request).await {
            Ok(response) => {
                let task: Task = ApiClient::decode(response).await?;
                task.check_invariants()?;
                Ok(Some(task))
            }
            Err(Error::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        let request = self.api.request(Method::POST, TASKS_PATH).json(task);
        let response = self.api.send_authorized(request).await?;
        let created: Task = ApiClient::decode(response).await?;
        created.check_invariants()?;
        Ok(created)
    }

    async fn update(&self, id: i64, task: &UpdatableTask) -> Result<Task> {
        let request = self
            .api
            .request(Method::PUT, &Self::task_path(id))
            .json(task);
        let response = self
            .api
            .send_authorized(request)
            .await
            .map_err(not_found_as(id))?;
        let updated: Task = ApiClient::decode(response).await?;
        updated.check_invariants()?;
        Ok(updated)
    }

    async fn complete(&self, id: i64) -> Result<()> {
        let path = format!("{}/complete", Self::task_path(id));
        let request = self.api.request(Method::PUT, &path);
        self.api
            .send_authorized(request)
            .await
            .map_err(not_found_as(id))?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let request = self.api.request(Method::DELETE, &Self::task_path(id));
        self.api
            .send_authorized(request)
            .await
            .map_err(not_found_as(id))?;
        Ok(())
    }
}
