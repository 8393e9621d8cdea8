//! Annotation session: one live cursor per task, answers persisted on
//! every edit.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use annotation::{Answer, Finalize, SessionSnapshot};

use crate::error::{ApiError, ApiResult};
use crate::routes_tasks::TaskView;
use crate::state::SharedState;
use crate::store_exec::with_session;

pub async fn get_session(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snap = with_session(&state, task_id, |s, _| Ok(s.snapshot(Instant::now()))).await?;
    Ok(Json(snap))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub value: Answer,
    /// Defaults to the session's current example.
    pub example_index: Option<usize>,
}

pub async fn put_answer(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snap = with_session(&state, task_id, move |s, store| {
        let index = req.example_index.unwrap_or(s.index());
        s.set_answer(store, index, &req.question_id, req.value)?;
        Ok(s.snapshot(Instant::now()))
    })
    .await?;
    Ok(Json(snap))
}

pub async fn next(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snap = with_session(&state, task_id, |s, _| {
        s.advance()?;
        Ok(s.snapshot(Instant::now()))
    })
    .await?;
    Ok(Json(snap))
}

pub async fn prev(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snap = with_session(&state, task_id, |s, _| {
        s.retreat();
        Ok(s.snapshot(Instant::now()))
    })
    .await?;
    Ok(Json(snap))
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn finalize(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
    body: Option<Json<FinalizeRequest>>,
) -> Result<Json<Value>, ApiError> {
    let confirm = body.map(|Json(b)| b.confirm).unwrap_or(false);
    let (outcome, task) = with_session(&state, task_id, move |s, store| {
        let outcome = s.finalize(store, confirm)?;
        let task = TaskView::from(store.task(task_id)?);
        Ok((outcome, task))
    })
    .await?;

    match outcome {
        Finalize::Done => Ok(Json(json!({ "state": "done", "task": task }))),
        Finalize::NeedsConfirmation { incomplete } => Err((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Some examples are not fully answered. Finalize anyway?",
                "confirm_required": true,
                "incomplete": incomplete,
            })),
        )),
    }
}
