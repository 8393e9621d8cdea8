use thiserror::Error;

use crate::status::{TaskEvent, TaskStatus};

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot apply {event:?} to a task in status {from:?}")]
    InvalidTransition { from: TaskStatus, event: TaskEvent },

    #[error("Answer every question to move to the next example.")]
    IncompleteExample { index: usize },

    #[error("Prompt is empty")]
    EmptyPrompt,
}

impl AnnotationError {
    pub(crate) fn project_not_found(id: impl ToString) -> Self {
        AnnotationError::NotFound { kind: "project", id: id.to_string() }
    }

    pub(crate) fn task_not_found(id: impl ToString) -> Self {
        AnnotationError::NotFound { kind: "task", id: id.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, AnnotationError>;
