use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use annotation::{examples_for_task, kipp, AnnotationError, Example, KippConfig, ProjectPatch};

use crate::error::{annotation_error, api_error, ApiResult};
use crate::state::SharedState;
use crate::store_exec::mutate_store;

pub async fn get_kipp(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let config = {
        let store = state.store.read().await;
        store.project(id).map_err(annotation_error)?.kipp.clone()
    };
    Ok(Json(json!({ "config": config, "provider": state.kipp.info() })))
}

/// Quick prompts arrive either as a list or as the settings textarea,
/// one prompt per line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuickPrompts {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct KippUpdate {
    pub model: String,
    pub system_prompt: String,
    pub quick_prompts: QuickPrompts,
}

impl From<KippUpdate> for KippConfig {
    fn from(u: KippUpdate) -> Self {
        let quick_prompts = match u.quick_prompts {
            QuickPrompts::List(list) => list,
            QuickPrompts::Text(text) => kipp::parse_quick_prompts(&text),
        };
        KippConfig {
            model: u.model,
            system_prompt: u.system_prompt,
            quick_prompts,
        }
    }
}

pub async fn put_kipp(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(update): Json<KippUpdate>,
) -> ApiResult<Json<KippConfig>> {
    let patch = ProjectPatch {
        kipp: Some(update.into()),
        ..Default::default()
    };
    let project = mutate_store(&state, move |store| store.update_project(id, patch)).await?;
    Ok(Json(project.kipp))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub task_id: Option<Uuid>,
    pub example_index: Option<usize>,
}

pub async fn chat(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<Value>> {
    let prompt = kipp::validate_prompt(&req.prompt).map_err(annotation_error)?.to_string();

    let (project, context) = {
        let store = state.store.read().await;
        let project = store.project(id).map_err(annotation_error)?.clone();
        let context: Option<Example> = match req.task_id {
            Some(task_id) => {
                let task = store.task(task_id).map_err(annotation_error)?;
                if task.project_id != id {
                    return Err(annotation_error(AnnotationError::InvalidInput(format!(
                        "task {task_id} does not belong to project {id}"
                    ))));
                }
                examples_for_task(task)
                    .into_iter()
                    .nth(req.example_index.unwrap_or(0))
            }
            None => None,
        };
        (project, context)
    };

    let reply = state
        .kipp
        .reply(&project, &prompt, context.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(project_id = %id, error = %e, "kipp provider failed");
            api_error(StatusCode::BAD_GATEWAY, format!("{e:#}"))
        })?;

    Ok(Json(json!({
        "reply": reply,
        "model": project.kipp.model,
        "messages": [
            { "role": "user", "text": prompt },
            { "role": "assistant", "text": reply },
        ],
    })))
}
