use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kipp::KippConfig;
use crate::status::TaskStatus;
use crate::{AnnotationError, Result};

pub const KEY_PROJECTS: &str = "validatio:projects";
pub const KEY_TASKS: &str = "validatio:tasks";

/// Per-task answer set key: validatio:answers:<task_id>
pub fn answers_key(task_id: Uuid) -> String {
    format!("validatio:answers:{task_id}")
}

pub const MIN_SCALE: u8 = 3;
pub const MAX_SCALE: u8 = 10;
pub const DEFAULT_SCALE: u8 = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Stars { scale: u8 },
    Binary,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "QuestionWire")]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn new(label: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            kind,
        }
    }

    pub fn stars(label: impl Into<String>) -> Self {
        Self::new(label, QuestionKind::Stars { scale: DEFAULT_SCALE })
    }

    pub fn scale(&self) -> Option<u8> {
        match self.kind {
            QuestionKind::Stars { scale } => Some(scale),
            _ => None,
        }
    }
}

/// Incoming question shape; `scale` is accepted only on stars questions.
#[derive(Deserialize)]
struct QuestionWire {
    id: String,
    label: String,
    #[serde(rename = "type")]
    kind: String,
    scale: Option<u8>,
}

impl TryFrom<QuestionWire> for Question {
    type Error = String;

    fn try_from(w: QuestionWire) -> std::result::Result<Self, Self::Error> {
        let kind = match (w.kind.as_str(), w.scale) {
            ("stars", Some(scale)) => QuestionKind::Stars { scale },
            ("stars", None) => return Err("stars question requires a scale".to_string()),
            ("binary" | "text", Some(_)) => {
                return Err(format!("{} question must not have a scale", w.kind))
            }
            ("binary", None) => QuestionKind::Binary,
            ("text", None) => QuestionKind::Text,
            (other, _) => return Err(format!("unknown question type {other}")),
        };
        Ok(Question {
            id: w.id,
            label: w.label,
            kind,
        })
    }
}

/// Questionnaire every new project starts with.
pub fn default_questionnaire() -> Vec<Question> {
    vec![
        Question::new("Answer quality", QuestionKind::Stars { scale: DEFAULT_SCALE }),
        Question::new("Is the answer relevant?", QuestionKind::Binary),
        Question::new("Comment", QuestionKind::Text),
    ]
}

pub fn validate_questionnaire(questions: &[Question]) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, q) in questions.iter().enumerate() {
        let n = i + 1;
        if q.id.trim().is_empty() {
            return Err(AnnotationError::InvalidInput(format!("question {n}: id is required")));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(AnnotationError::InvalidInput(format!(
                "question {n}: duplicate id {}",
                q.id
            )));
        }
        if q.label.trim().is_empty() {
            return Err(AnnotationError::InvalidInput(format!("question {n}: label is required")));
        }
        if let Some(scale) = q.scale() {
            if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
                return Err(AnnotationError::InvalidInput(format!(
                    "question {n}: scale must be between {MIN_SCALE} and {MAX_SCALE}, got {scale}"
                )));
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub instruction: String,
    pub questionnaire: Vec<Question>,
    pub task_ids: Vec<Uuid>, // newest first
    pub created_at: DateTime<Utc>,
    pub kipp: KippConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub instruction: String,
}

/// Partial update; absent fields are left as they are.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub instruction: Option<String>,
    pub questionnaire: Option<Vec<Question>>,
    pub kipp: Option<KippConfig>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AnnotationError::InvalidInput("project name is required".into()));
            }
        }
        if let Some(questions) = &self.questionnaire {
            validate_questionnaire(questions)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(instruction) = self.instruction {
            project.instruction = instruction;
        }
        if let Some(questionnaire) = self.questionnaire {
            project.questionnaire = questionnaire;
        }
        if let Some(kipp) = self.kipp {
            project.kipp = kipp.normalized();
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskFile {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    /// Parsed JSON; `None` when the upload could not be parsed.
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub content_hash: String, // BLAKE3(file_bytes), hex
}

impl TaskFile {
    /// Builds the stored record for one uploaded file.
    pub fn from_upload(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size: bytes.len() as u64,
            content: crate::normalize::parse_upload(bytes).into_content(),
            content_hash: blake3::hash(bytes).to_hex().to_string(),
        }
    }

    pub fn parsed(&self) -> bool {
        self.content.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub status: TaskStatus,
    pub files: Vec<TaskFile>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub files: Vec<TaskFile>,
}

/// A single judgment; the JSON shape is the bare value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Score(f64),
    Text(String),
}

/// Question id -> answer, for one example.
pub type ExampleAnswers = BTreeMap<String, Answer>;

/// Example index -> answers.
pub type AnswerSet = BTreeMap<usize, ExampleAnswers>;
