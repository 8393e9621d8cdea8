use std::collections::hash_map::Entry;
use std::sync::Arc;

use annotation::AnnotationSession;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{annotation_error, join_error, ApiResult};
use crate::state::{AppState, AppStore};

/// Runs `f` under the write lock on a blocking thread; file-backed storage
/// does synchronous IO on every mutation.
pub async fn with_store_blocking<S, R, F>(
    lock: Arc<RwLock<S>>,
    f: F,
) -> Result<R, tokio::task::JoinError>
where
    S: Send + Sync + 'static,
    R: Send + 'static,
    F: FnOnce(&mut S) -> R + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = lock.blocking_write();
        f(&mut *guard)
    })
    .await
}

pub async fn mutate_store<R, F>(state: &AppState, f: F) -> ApiResult<R>
where
    R: Send + 'static,
    F: FnOnce(&mut AppStore) -> annotation::Result<R> + Send + 'static,
{
    with_store_blocking(state.store.clone(), f)
        .await
        .map_err(join_error)?
        .map_err(annotation_error)
}

/// Runs `f` against the task's session, opening it on first use.
pub async fn with_session<R, F>(state: &AppState, task_id: Uuid, f: F) -> ApiResult<R>
where
    R: Send + 'static,
    F: FnOnce(&mut AnnotationSession, &mut AppStore) -> annotation::Result<R> + Send + 'static,
{
    let sessions = state.sessions.clone();
    with_store_blocking(state.store.clone(), move |store: &mut AppStore| {
        let mut sessions = sessions.blocking_write();
        let session = match sessions.entry(task_id) {
            Entry::Occupied(e) => {
                let session = e.into_mut();
                session.sync(store)?;
                session
            }
            Entry::Vacant(v) => v.insert(AnnotationSession::open(store, task_id)?),
        };
        f(session, store)
    })
    .await
    .map_err(join_error)?
    .map_err(annotation_error)
}
