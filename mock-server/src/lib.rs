//! In-memory task backend used for local development and tests.
//!
//! Tasks are kept newest-first in a `Vec` behind a `RwLock`, so listing
//! returns a stable order.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

pub type Db = Arc<RwLock<Vec<Task>>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router preloaded with `tasks`.
pub fn app_with(tasks: Vec<Task>) -> Router {
    let db: Db = Arc::new(RwLock::new(tasks));
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    Json(db.read().await.clone())
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), StatusCode> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let task = Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        completed: false,
    };
    info!(id = %task.id, title = %task.title, "task created");
    db.write().await.insert(0, task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, StatusCode> {
    let mut tasks = db.write().await;
    let task = tasks.iter_mut().find(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
        task.title = title.to_string();
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }
    info!(%id, completed = task.completed, "task updated");
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let mut tasks = db.write().await;
    match tasks.iter().position(|t| t.id == id) {
        Some(pos) => {
            tasks.remove(pos);
            info!(%id, "task deleted");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}
