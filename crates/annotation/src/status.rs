//! Task lifecycle as a pure (state, event) -> (state, effect) function.

use serde::{Deserialize, Serialize};

use crate::{AnnotationError, Result};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskEvent {
    /// Hand a new task over to annotators.
    SendToAnnotation,
    /// Close the task; the completeness gate is enforced by the session.
    Finalize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    PersistAnswers,
}

pub fn transition(from: TaskStatus, event: TaskEvent) -> Result<(TaskStatus, Effect)> {
    match (from, event) {
        (TaskStatus::New, TaskEvent::SendToAnnotation) => Ok((TaskStatus::InProgress, Effect::None)),
        (_, TaskEvent::Finalize) => Ok((TaskStatus::Done, Effect::PersistAnswers)),
        (from, event) => Err(AnnotationError::InvalidTransition { from, event }),
    }
}
