//! Annotation session: walks one task's examples and collects answers.

use std::time::{Duration, Instant};

use kv::Storage;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::normalize::{examples_for_task, Example};
use crate::schema::{Answer, AnswerSet, ExampleAnswers, Question, QuestionKind};
use crate::status::{TaskEvent, TaskStatus};
use crate::store::Store;
use crate::{AnnotationError, Result};

/// How long a fresh edit shows as a draft before it reads as saved.
pub const SETTLE_DELAY: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    None,
    Draft,
    Saved,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Finalize {
    /// Task is now Done.
    Done,
    /// Some examples are incomplete; nothing changed until the caller confirms.
    NeedsConfirmation { incomplete: Vec<usize> },
}

pub fn is_answered(question: &Question, value: Option<&Answer>) -> bool {
    match (&question.kind, value) {
        (QuestionKind::Stars { .. }, Some(Answer::Score(n))) => *n > 0.0,
        (QuestionKind::Binary, Some(Answer::Flag(_))) => true,
        (QuestionKind::Text, Some(Answer::Text(s))) => !s.trim().is_empty(),
        _ => false,
    }
}

fn example_complete(questionnaire: &[Question], answers: Option<&ExampleAnswers>) -> bool {
    questionnaire
        .iter()
        .all(|q| is_answered(q, answers.and_then(|a| a.get(&q.id))))
}

pub struct AnnotationSession {
    task_id: Uuid,
    questionnaire: Vec<Question>,
    examples: Vec<Example>,
    index: usize,
    answers: AnswerSet,
    last_edit: Option<Instant>,
}

/// Serializable view of the session at one instant.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub task_id: Uuid,
    pub index: usize,
    pub total: usize,
    pub example: Option<Example>,
    pub questionnaire: Vec<Question>,
    pub answers: ExampleAnswers,
    pub save_status: SaveStatus,
    pub current_complete: bool,
    pub all_complete: bool,
    pub completed_examples: usize,
}

impl AnnotationSession {
    pub fn open<S: Storage>(store: &Store<S>, task_id: Uuid) -> Result<Self> {
        let task = store.task(task_id)?;
        let project = store.project(task.project_id)?;
        let examples = examples_for_task(task);
        debug!(task_id = %task_id, examples = examples.len(), "session opened");
        Ok(Self {
            task_id,
            questionnaire: project.questionnaire.clone(),
            examples,
            index: 0,
            answers: store.answers(task_id),
            last_edit: None,
        })
    }

    /// Picks up questionnaire edits made since the session was opened.
    pub fn sync<S: Storage>(&mut self, store: &Store<S>) -> Result<()> {
        let task = store.task(self.task_id)?;
        self.questionnaire = store.project(task.project_id)?.questionnaire.clone();
        Ok(())
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn current(&self) -> Option<&Example> {
        self.examples.get(self.index)
    }

    pub fn example(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Merges one answer and persists the whole set right away.
    pub fn set_answer<S: Storage>(
        &mut self,
        store: &mut Store<S>,
        example_index: usize,
        question_id: &str,
        value: Answer,
    ) -> Result<()> {
        if example_index >= self.examples.len() {
            return Err(AnnotationError::InvalidInput(format!(
                "example index {example_index} out of range (0..{})",
                self.examples.len()
            )));
        }
        if !self.questionnaire.iter().any(|q| q.id == question_id) {
            return Err(AnnotationError::InvalidInput(format!(
                "unknown question id {question_id}"
            )));
        }
        self.answers
            .entry(example_index)
            .or_default()
            .insert(question_id.to_string(), value);
        store.save_answers(self.task_id, &self.answers);
        self.last_edit = Some(Instant::now());
        Ok(())
    }

    pub fn save_status(&self, now: Instant) -> SaveStatus {
        match self.last_edit {
            None => SaveStatus::None,
            Some(at) if now.saturating_duration_since(at) < SETTLE_DELAY => SaveStatus::Draft,
            Some(_) => SaveStatus::Saved,
        }
    }

    pub fn is_example_complete(&self, index: usize) -> bool {
        example_complete(&self.questionnaire, self.answers.get(&index))
    }

    pub fn incomplete_examples(&self) -> Vec<usize> {
        (0..self.examples.len())
            .filter(|i| !self.is_example_complete(*i))
            .collect()
    }

    pub fn all_complete(&self) -> bool {
        (0..self.examples.len()).all(|i| self.is_example_complete(i))
    }

    /// Moves forward once every question of the current example is answered.
    /// Stays on the last example instead of wrapping.
    pub fn advance(&mut self) -> Result<usize> {
        if self.examples.is_empty() {
            return Ok(self.index);
        }
        if !self.is_example_complete(self.index) {
            warn!(task_id = %self.task_id, index = self.index, "advance blocked: example incomplete");
            return Err(AnnotationError::IncompleteExample { index: self.index });
        }
        self.index = (self.index + 1).min(self.examples.len() - 1);
        Ok(self.index)
    }

    pub fn retreat(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    /// Closes the task. Without `confirmed`, an incomplete questionnaire
    /// stops here and reports which examples are missing answers.
    pub fn finalize<S: Storage>(&self, store: &mut Store<S>, confirmed: bool) -> Result<Finalize> {
        let incomplete = self.incomplete_examples();
        if !incomplete.is_empty() && !confirmed {
            return Ok(Finalize::NeedsConfirmation { incomplete });
        }
        store.save_answers(self.task_id, &self.answers);
        let task = store.apply_task_event(self.task_id, TaskEvent::Finalize)?;
        debug_assert_eq!(task.status, TaskStatus::Done);
        Ok(Finalize::Done)
    }

    /// (completed examples, total examples).
    pub fn progress(&self) -> (usize, usize) {
        let total = self.examples.len();
        let done = (0..total).filter(|i| self.is_example_complete(*i)).count();
        (done, total)
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let (completed_examples, total) = self.progress();
        SessionSnapshot {
            task_id: self.task_id,
            index: self.index,
            total,
            example: self.current().cloned(),
            questionnaire: self.questionnaire.clone(),
            answers: self.answers.get(&self.index).cloned().unwrap_or_default(),
            save_status: self.save_status(now),
            current_complete: self.is_example_complete(self.index),
            all_complete: self.all_complete(),
            completed_examples,
        }
    }
}
