//! In-process task API for tests
//!
//! Speaks the same routes and JSON shapes as the real server, on an
//! ephemeral local port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use dotask_core::task::{NewTask, Task, UpdatableTask};

use crate::api::USER_ID_HEADER;

type RouteError = (StatusCode, Json<Value>);

fn route_error(status: StatusCode, message: impl Into<String>) -> RouteError {
    (status, Json(json!({ "message": message.into() })))
}

#[derive(Debug, Clone)]
struct Account {
    id: i64,
    username: String,
    email: String,
    password: String,
}

impl Account {
    fn token(&self) -> String {
        format!("token-{}", self.id)
    }

    fn auth_body(&self) -> Value {
        json!({
            "token": self.token(),
            "type": "Bearer",
            "id": self.id,
            "username": self.username,
            "email": self.email,
        })
    }
}

#[derive(Default)]
struct Shared {
    accounts: Mutex<Vec<Account>>,
    tasks: Mutex<Vec<Task>>,
    next_task_id: Mutex<i64>,
    hits: Mutex<HashMap<String, usize>>,
    forced: Mutex<Option<StatusCode>>,
}

pub struct FakeServer {
    url: String,
    shared: Arc<Shared>,
}

impl FakeServer {
    /// Start with one account: `alice` / `alice@example.com`, password `secret`
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        shared.accounts.lock().unwrap().push(Account {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret".to_string(),
        });
        *shared.next_task_id.lock().unwrap() = 1;

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/tasks", get(list_pending).post(create_task))
            .route("/api/tasks/all", get(list_all))
            .route("/api/tasks/completed", get(list_completed))
            .route(
                "/api/tasks/{id}",
                get(get_task).put(update_task).delete(delete_task),
            )
            .route("/api/tasks/{id}/complete", put(complete_task))
            .layer(middleware::from_fn_with_state(shared.clone(), record))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            shared,
        }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// Token issued to the seeded account
    pub fn token(&self) -> String {
        self.shared.accounts.lock().unwrap()[0].token()
    }

    pub fn user_id(&self) -> i64 {
        self.shared.accounts.lock().unwrap()[0].id
    }

    /// Seed a task as stored, bypassing validation
    pub fn insert_task(&self, task: Task) {
        let mut next = self.shared.next_task_id.lock().unwrap();
        *next = (*next).max(task.id + 1);
        self.shared.tasks.lock().unwrap().push(task);
    }

    /// Answer every request with `status` until cleared
    pub fn force_status(&self, status: Option<StatusCode>) {
        *self.shared.forced.lock().unwrap() = status;
    }

    /// Requests seen for `"<METHOD> <path>"`
    pub fn hits(&self, route: &str) -> usize {
        self.shared
            .hits
            .lock()
            .unwrap()
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.shared.hits.lock().unwrap().values().sum()
    }
}

async fn record(State(shared): State<Arc<Shared>>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    *shared.hits.lock().unwrap().entry(key).or_insert(0) += 1;

    let forced = *shared.forced.lock().unwrap();
    if let Some(status) = forced {
        return route_error(status, "forced failure").into_response();
    }
    next.run(request).await
}

/// Resolve the caller from either identity header
fn caller(shared: &Shared, headers: &HeaderMap) -> Result<i64, RouteError> {
    let accounts = shared.accounts.lock().unwrap();
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    accounts
        .iter()
        .find(|a| Some(a.token().as_str()) == bearer || Some(a.id) == user_id)
        .map(|a| a.id)
        .ok_or_else(|| route_error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    username_or_email: String,
    password: String,
}

async fn login(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, RouteError> {
    let accounts = shared.accounts.lock().unwrap();
    accounts
        .iter()
        .find(|a| {
            (a.username == body.username_or_email || a.email == body.username_or_email)
                && a.password == body.password
        })
        .map(|a| Json(a.auth_body()))
        .ok_or_else(|| route_error(StatusCode::UNAUTHORIZED, "Bad credentials"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, RouteError> {
    let mut accounts = shared.accounts.lock().unwrap();
    if accounts.iter().any(|a| a.username == body.username) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "username": "Username is already taken" })),
        ));
    }
    if accounts.iter().any(|a| a.email == body.email) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "email": "Email is already in use" })),
        ));
    }
    let account = Account {
        id: accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1,
        username: body.username,
        email: body.email,
        password: body.password,
    };
    let response = Json(account.auth_body());
    accounts.push(account);
    Ok(response)
}

async fn list_pending(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, RouteError> {
    caller(&shared, &headers)?;
    let tasks = shared.tasks.lock().unwrap();
    Ok(Json(tasks.iter().filter(|t| !t.completed).cloned().collect()))
}

async fn list_completed(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, RouteError> {
    caller(&shared, &headers)?;
    let tasks = shared.tasks.lock().unwrap();
    Ok(Json(tasks.iter().filter(|t| t.completed).cloned().collect()))
}

async fn list_all(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, RouteError> {
    caller(&shared, &headers)?;
    Ok(Json(shared.tasks.lock().unwrap().clone()))
}

async fn create_task(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), RouteError> {
    caller(&shared, &headers)?;
    if body.title.trim().is_empty() {
        return Err(route_error(
            StatusCode::BAD_REQUEST,
            "Task title cannot be empty",
        ));
    }

    let id = {
        let mut next = shared.next_task_id.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    };
    let mut task = Task::new(id, body.title)
        .with_description(body.description)
        .with_priority(body.priority);
    task.due_date = body.due_date;
    shared.tasks.lock().unwrap().push(task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

fn with_task<T>(
    shared: &Shared,
    id: i64,
    f: impl FnOnce(&mut Task) -> T,
) -> Result<T, RouteError> {
    let mut tasks = shared.tasks.lock().unwrap();
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .map(f)
        .ok_or_else(|| route_error(StatusCode::NOT_FOUND, "Task not found"))
}

async fn get_task(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Task>, RouteError> {
    caller(&shared, &headers)?;
    with_task(&shared, id, |task| Json(task.clone()))
}

async fn update_task(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdatableTask>,
) -> Result<Json<Task>, RouteError> {
    caller(&shared, &headers)?;
    with_task(&shared, id, |task| {
        task.title = body.title;
        task.description = body.description;
        task.priority = body.priority;
        task.due_date = body.due_date;
        match (task.completed, body.completed) {
            (false, true) => task.completed_at = Some(Utc::now()),
            (_, false) => task.completed_at = None,
            _ => {}
        }
        task.completed = body.completed;
        Json(task.clone())
    })
}

async fn complete_task(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Task>, RouteError> {
    caller(&shared, &headers)?;
    with_task(&shared, id, |task| {
        if !task.completed {
            task.completed = true;
            task.completed_at = Some(Utc::now());
        }
        Json(task.clone())
    })
}

async fn delete_task(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, RouteError> {
    caller(&shared, &headers)?;
    let mut tasks = shared.tasks.lock().unwrap();
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == before {
        return Err(route_error(StatusCode::NOT_FOUND, "Task not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
