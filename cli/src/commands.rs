//! Subcommand handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;

use dotask_client::{
    ApiClient, AuthClient, ClientConfig, HttpTaskStore, LoginRequest, RegisterRequest,
};
use dotask_core::session::{FileSessionStore, SessionStore};
use dotask_core::task::{NewTask, TaskFilter, TaskPriority, UpdatableTask};
use dotask_core::{DashboardRefresher, TaskManager};

use crate::render;

/// Field changes for `edit`; `None` leaves the field alone
pub struct Edit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    /// `Some(None)` clears the due date
    pub due: Option<Option<NaiveDate>>,
    pub reopen: bool,
}

impl Edit {
    fn apply(self, task: &mut UpdatableTask) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due {
            task.due_date = due;
        }
        if self.reopen {
            task.completed = false;
        }
    }
}

pub struct App {
    config: ClientConfig,
    auth: AuthClient,
    manager: Arc<TaskManager>,
}

impl App {
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let session: Arc<dyn SessionStore> = Arc::new(
            FileSessionStore::new(config.session_path())
                .await
                .with_context(|| {
                    format!("Failed to open session file {:?}", config.session_path())
                })?,
        );
        let api = ApiClient::new(&config, session);
        let manager = Arc::new(TaskManager::new(Arc::new(HttpTaskStore::new(api.clone()))));
        Ok(Self {
            config,
            auth: AuthClient::new(api),
            manager,
        })
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<()> {
        let user = self
            .auth
            .login(&LoginRequest::new(username_or_email, password))
            .await?;
        println!("Signed in as {} <{}>", user.username, user.email);
        Ok(())
    }

    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
        confirm_password: String,
    ) -> Result<()> {
        let user = self
            .auth
            .register(&RegisterRequest {
                username,
                email,
                password,
                confirm_password,
            })
            .await?;
        println!("Welcome, {}! You are signed in.", user.username);
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        println!("Signed out");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        match self.auth.current_user().await? {
            Some(user) => println!("{} <{}> (id {})", user.username, user.email, user.id),
            None => println!("Not signed in"),
        }
        Ok(())
    }

    async fn require_session(&self) -> Result<()> {
        if !self.auth.is_authenticated().await {
            bail!("Not signed in. Run `dotask login` first.");
        }
        Ok(())
    }

    /// Surface the manager's error slot when an operation reports failure
    fn check(&self, ok: bool) -> Result<()> {
        if ok {
            return Ok(());
        }
        bail!(self
            .manager
            .error()
            .unwrap_or_else(|| "Request failed".to_string()))
    }

    async fn load(&self) -> Result<()> {
        self.require_session().await?;
        let ok = self.manager.refresh().await;
        self.check(ok)
    }

    pub async fn list(&self, filter: &str, search: &str) -> Result<()> {
        self.load().await?;
        let filter = TaskFilter::parse(filter);
        let tasks = self.manager.view(filter, search);
        print!("{}", render::task_table(&tasks, filter));
        Ok(())
    }

    pub async fn add(
        &self,
        title: String,
        description: String,
        priority: TaskPriority,
        due: Option<NaiveDate>,
    ) -> Result<()> {
        self.require_session().await?;
        let task = NewTask::new(title)
            .with_description(description)
            .with_priority(priority)
            .with_due_date(due);
        let ok = self.manager.create(&task).await;
        self.check(ok)?;
        println!("Added \"{}\"", task.title);
        Ok(())
    }

    pub async fn complete(&self, id: i64) -> Result<()> {
        self.require_session().await?;
        let ok = self.manager.complete(id).await;
        self.check(ok)?;
        println!("Completed task {}", id);
        Ok(())
    }

    pub async fn edit(&self, id: i64, edit: Edit) -> Result<()> {
        self.load().await?;
        let Some(current) = self.manager.tasks().into_iter().find(|t| t.id == id) else {
            bail!("No task with id {}", id);
        };
        let mut task = UpdatableTask::from(&current);
        edit.apply(&mut task);
        let ok = self.manager.update(id, &task).await;
        self.check(ok)?;
        println!("Updated task {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.require_session().await?;
        let ok = self.manager.delete(id).await;
        self.check(ok)?;
        println!("Deleted task {}", id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<()> {
        self.load().await?;
        print!("{}", render::dashboard(&self.manager.stats()));
        Ok(())
    }

    pub async fn watch(&self, period: Option<Duration>) -> Result<()> {
        self.require_session().await?;
        let period = period.unwrap_or(self.config.refresh_interval);
        info!("Refreshing every {:?}; press Ctrl-C to stop", period);

        let mut updates = self.manager.subscribe();
        let refresher = DashboardRefresher::spawn(self.manager.clone(), period);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().clone();
                    if state.is_loading() {
                        continue;
                    }
                    match state.error() {
                        Some(message) => eprintln!("{}", message),
                        None => print!("{}", render::dashboard(&state.lists().stats())),
                    }
                }
            }
        }

        refresher.stop().await;
        self.manager.close();
        Ok(())
    }
}
