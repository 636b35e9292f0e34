//! In-memory task store for tests

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use crate::task::{NewTask, Task, TaskStore, UpdatableTask};
use crate::{Error, Result};

/// Holds `list_all` calls until released
pub struct ReadGate {
    tx: watch::Sender<bool>,
}

impl ReadGate {
    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Default)]
pub struct FakeTaskStore {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    list_all_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reject_session: AtomicBool,
    gate: Mutex<Option<watch::Receiver<bool>>>,
}

impl FakeTaskStore {
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            tasks: Mutex::new(tasks),
            next_id: AtomicI64::new(next_id),
            ..Default::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reject_session(&self, reject: bool) {
        self.reject_session.store(reject, Ordering::SeqCst);
    }

    pub fn hold_reads(&self) -> ReadGate {
        let (tx, rx) = watch::channel(false);
        *self.gate.lock().unwrap() = Some(rx);
        ReadGate { tx }
    }

    pub fn list_all_calls(&self) -> usize {
        self.list_all_calls.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool) -> Result<()> {
        if self.reject_session.load(Ordering::SeqCst) {
            return Err(Error::Unauthorized("session rejected".to_string()));
        }
        if flag.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn with_task<T>(&self, id: i64, f: impl FnOnce(&mut Task) -> T) -> Result<T> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks
            .iter_mut()
            .find(|t| t.id == id)
            .map(f)
            .ok_or(Error::TaskNotFound(id))
    }
}

#[async_trait]
impl TaskStore for FakeTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        self.check(&self.fail_reads)?;
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().filter(|t| !t.completed).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Task>> {
        self.list_all_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(mut rx) = gate {
            let _ = rx.wait_for(|open| *open).await;
        }
        self.check(&self.fail_reads)?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn list_completed(&self) -> Result<Vec<Task>> {
        self.check(&self.fail_reads)?;
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().filter(|t| t.completed).cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Task>> {
        self.check(&self.fail_reads)?;
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        self.check(&self.fail_writes)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = Task::new(id, task.title.clone())
            .with_description(task.description.clone())
            .with_priority(task.priority);
        created.due_date = task.due_date;
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, task: &UpdatableTask) -> Result<Task> {
        self.check(&self.fail_writes)?;
        self.with_task(id, |existing| {
            existing.title = task.title.clone();
            existing.description = task.description.clone();
            existing.priority = task.priority;
            existing.due_date = task.due_date;
            if task.completed && !existing.completed {
                existing.completed_at = Some(Utc::now());
            } else if !task.completed {
                existing.completed_at = None;
            }
            existing.completed = task.completed;
            existing.clone()
        })
    }

    async fn complete(&self, id: i64) -> Result<()> {
        self.check(&self.fail_writes)?;
        self.with_task(id, |task| {
            if !task.completed {
                task.completed = true;
                task.completed_at = Some(Utc::now());
            }
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check(&self.fail_writes)?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(Error::TaskNotFound(id));
        }
        Ok(())
    }
}
