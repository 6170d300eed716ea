use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const PRIORITIES: &[&str] = &["low", "medium", "high"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub completed: bool,
    #[serde(skip)]
    seq: u64,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct ToggleComplete {
    pub completed: bool,
}

#[derive(Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
}

/// Error body in the shape the client reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

type HandlerError = (StatusCode, Json<Detail>);

fn error(status: StatusCode, detail: &str) -> HandlerError {
    (
        status,
        Json(Detail {
            detail: detail.to_string(),
        }),
    )
}

fn not_found() -> HandlerError {
    error(StatusCode::NOT_FOUND, "Task not found")
}

/// How the mock backend is mounted.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Bearer token every request must carry. `None` disables auth.
    pub token: Option<String>,
    /// Serve routes under `/api`, like a deployed backend.
    pub api_prefix: bool,
}

#[derive(Default)]
struct AppState {
    tasks: RwLock<HashMap<Uuid, Task>>,
    next_seq: AtomicU64,
    token: Option<String>,
}

type Db = Arc<AppState>;

pub fn app() -> Router {
    app_with(ServerConfig::default())
}

pub fn app_with(config: ServerConfig) -> Router {
    let state: Db = Arc::new(AppState {
        token: config.token,
        ..AppState::default()
    });

    let mut routes = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/tasks/{id}/complete", patch(toggle_complete));
    if state.token.is_some() {
        routes = routes.route_layer(middleware::from_fn_with_state(state.clone(), require_token));
    }
    let routes = routes.with_state(state);

    if config.api_prefix {
        Router::new().nest("/api", routes)
    } else {
        routes
    }
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, ServerConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn require_token(State(db): State<Db>, request: Request, next: Next) -> Response {
    let expected = db.token.as_deref().map(|t| format!("Bearer {t}"));
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if expected.is_some() && provided != expected.as_deref() {
        tracing::warn!(path = %request.uri().path(), "rejected unauthenticated request");
        return error(StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }
    next.run(request).await
}

fn priority_rank(priority: &str) -> usize {
    PRIORITIES.iter().position(|p| *p == priority).unwrap_or(0)
}

fn check_priority(priority: &str) -> Result<(), HandlerError> {
    if PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid priority"))
    }
}

fn check_title(title: &str) -> Result<(), HandlerError> {
    if title.trim().is_empty() {
        Err(error(StatusCode::UNPROCESSABLE_ENTITY, "Title is required"))
    } else {
        Ok(())
    }
}

async fn list_tasks(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Task>> {
    let tasks = db.tasks.read().await;
    let search = params.search.as_deref().map(str::to_lowercase);

    let mut found: Vec<Task> = tasks
        .values()
        .filter(|t| match params.status.as_deref() {
            Some("pending") => !t.completed,
            Some("completed") => t.completed,
            _ => true,
        })
        .filter(|t| params.priority.as_deref().map_or(true, |p| t.priority == p))
        .filter(|t| {
            search.as_deref().map_or(true, |needle| {
                t.title.to_lowercase().contains(needle)
                    || t
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(needle))
            })
        })
        .cloned()
        .collect();

    match params.sort_by.as_deref() {
        Some("title") => found.sort_by(|a, b| a.title.cmp(&b.title)),
        Some("priority") => found.sort_by(|a, b| {
            priority_rank(&b.priority)
                .cmp(&priority_rank(&a.priority))
                .then(a.seq.cmp(&b.seq))
        }),
        _ => found.sort_by_key(|t| t.seq),
    }
    Json(found)
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), HandlerError> {
    check_title(&input.title)?;
    let priority = input.priority.unwrap_or_else(|| "medium".to_string());
    check_priority(&priority)?;

    let task = Task {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        priority,
        completed: false,
        seq: db.next_seq.fetch_add(1, Ordering::Relaxed),
    };
    db.tasks.write().await.insert(task.id, task.clone());
    tracing::info!(id = %task.id, "created task");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Task>, HandlerError> {
    let tasks = db.tasks.read().await;
    tasks.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, HandlerError> {
    if let Some(title) = &input.title {
        check_title(title)?;
    }
    if let Some(priority) = &input.priority {
        check_priority(priority)?;
    }

    let mut tasks = db.tasks.write().await;
    let task = tasks.get_mut(&id).ok_or_else(not_found)?;
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(description) = input.description {
        task.description = Some(description);
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }
    Ok(Json(task.clone()))
}

async fn delete_task(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, HandlerError> {
    let mut tasks = db.tasks.write().await;
    tasks.remove(&id).ok_or_else(not_found)?;
    tracing::info!(%id, "deleted task");
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_complete(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<ToggleComplete>,
) -> Result<Json<Task>, HandlerError> {
    let mut tasks = db.tasks.write().await;
    let task = tasks.get_mut(&id).ok_or_else(not_found)?;
    task.completed = input.completed;
    Ok(Json(task.clone()))
}
