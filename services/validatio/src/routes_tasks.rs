use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use annotation::{
    examples_for_task, Example, FileSummary, NewTask, Task, TaskEvent, TaskFile, TaskStatus,
};

use crate::error::{annotation_error, api_error, ApiResult};
use crate::state::SharedState;
use crate::store_exec::mutate_store;

/// Task as listed to clients: file contents replaced by summaries.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub files: Vec<FileSummary>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            project_id: task.project_id,
            status: task.status,
            created_at: task.created_at,
            files: FileSummary::of_task(task),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
}

pub async fn list_tasks(
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Query(q): Query<TaskQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let store = state.store.read().await;
    store.project(project_id).map_err(annotation_error)?;
    let tasks = store
        .project_tasks(project_id, q.status)
        .into_iter()
        .map(TaskView::from)
        .collect();
    Ok(Json(tasks))
}

#[derive(Debug, Serialize)]
pub struct CreatedTask {
    pub task: TaskView,
    /// Uploaded files ignored for not being `.json`.
    pub skipped: Vec<String>,
}

fn is_json_file(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".json")
}

pub async fn create_task(
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    mut mp: Multipart,
) -> ApiResult<(StatusCode, Json<CreatedTask>)> {
    let bad_request = |e: axum::extract::multipart::MultipartError| api_error(StatusCode::BAD_REQUEST, e);

    let mut name = String::new();
    let mut uploads: Vec<(String, bytes::Bytes)> = Vec::new();
    let mut skipped = Vec::new();

    while let Some(field) = mp.next_field().await.map_err(bad_request)? {
        match field.name() {
            Some("name") => name = field.text().await.map_err(bad_request)?,
            Some("file") | Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !is_json_file(&file_name) {
                    tracing::debug!(file = %file_name, "skipping non-json upload");
                    skipped.push(file_name);
                    continue;
                }
                let bytes = field.bytes().await.map_err(bad_request)?;
                uploads.push((file_name, bytes));
            }
            _ => {}
        }
    }

    let task = mutate_store(&state, move |store| {
        let files = uploads
            .iter()
            .map(|(file_name, bytes)| TaskFile::from_upload(file_name.as_str(), bytes))
            .collect();
        store
            .create_task(NewTask {
                project_id,
                name,
                files,
            })
            .map(|t| TaskView::from(&t))
    })
    .await?;

    if !skipped.is_empty() {
        tracing::info!(task_id = %task.id, skipped = ?skipped, "non-json uploads ignored");
    }
    Ok((StatusCode::CREATED, Json(CreatedTask { task, skipped })))
}

pub async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let store = state.store.read().await;
    let task = store.task(id).map_err(annotation_error)?;
    Ok(Json(TaskView::from(task)))
}

/// New -> InProgress.
pub async fn start_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = mutate_store(&state, move |store| {
        store
            .apply_task_event(id, TaskEvent::SendToAnnotation)
            .map(|t| TaskView::from(&t))
    })
    .await?;
    Ok(Json(task))
}

pub async fn get_examples(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Example>>> {
    let store = state.store.read().await;
    let task = store.task(id).map_err(annotation_error)?;
    Ok(Json(examples_for_task(task)))
}
