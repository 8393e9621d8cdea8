use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use annotation::{Dashboard, NewProject, Project, ProjectPatch, Question};

use crate::error::{annotation_error, ApiResult};
use crate::state::SharedState;
use crate::store_exec::mutate_store;

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({ "status": "ok", "persist_failures": store.persist_failures() }))
}

pub async fn get_dashboard(State(state): State<SharedState>) -> Json<Dashboard> {
    Json(state.store.read().await.dashboard())
}

pub async fn list_projects(State(state): State<SharedState>) -> Json<Vec<Project>> {
    Json(state.store.read().await.projects().to_vec())
}

pub async fn create_project(
    State(state): State<SharedState>,
    Json(new): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = mutate_store(&state, move |store| store.create_project(new)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let store = state.store.read().await;
    store.project(id).cloned().map(Json).map_err(annotation_error)
}

pub async fn patch_project(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    let project = mutate_store(&state, move |store| store.update_project(id, patch)).await?;
    Ok(Json(project))
}

/// Replaces the whole questionnaire.
pub async fn put_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(questionnaire): Json<Vec<Question>>,
) -> ApiResult<Json<Project>> {
    let patch = ProjectPatch {
        questionnaire: Some(questionnaire),
        ..Default::default()
    };
    let project = mutate_store(&state, move |store| store.update_project(id, patch)).await?;
    tracing::info!(project_id = %id, questions = project.questionnaire.len(), "questionnaire saved");
    Ok(Json(project))
}
