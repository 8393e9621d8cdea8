//! In-memory projects and tasks mirrored to a key-value backend.
//!
//! Loading never fails: a missing or unreadable collection starts empty.
//! Writes never fail either: when the backend rejects a write the in-memory
//! state stays authoritative for this process and the failure is counted.

use chrono::Utc;
use kv::{KvError, Storage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::kipp::KippConfig;
use crate::schema::{
    answers_key, default_questionnaire, AnswerSet, NewProject, NewTask, Project, ProjectPatch,
    Task, KEY_PROJECTS, KEY_TASKS,
};
use crate::status::{transition, TaskEvent, TaskStatus};
use crate::{AnnotationError, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dashboard {
    pub projects: usize,
    pub tasks: usize,
    pub in_progress: usize,
    pub done: usize,
}

pub struct Store<S: Storage> {
    storage: S,
    projects: Vec<Project>, // newest first
    tasks: Vec<Task>,       // newest first
    persist_failures: u64,
}

impl<S: Storage> Store<S> {
    pub fn open(storage: S) -> Self {
        let projects: Vec<Project> = load_or_default(&storage, KEY_PROJECTS);
        let tasks: Vec<Task> = load_or_default(&storage, KEY_TASKS);
        info!(projects = projects.len(), tasks = tasks.len(), "store loaded");
        Self {
            storage,
            projects,
            tasks,
            persist_failures: 0,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the backend rejected since this store was opened.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    // ----- Projects -----

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: Uuid) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AnnotationError::project_not_found(id))
    }

    pub fn create_project(&mut self, new: NewProject) -> Result<Project> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AnnotationError::InvalidInput("project name is required".into()));
        }
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            instruction: new.instruction,
            questionnaire: default_questionnaire(),
            task_ids: Vec::new(),
            created_at: Utc::now(),
            kipp: KippConfig::default(),
        };
        self.projects.insert(0, project.clone());
        self.persist_projects();
        info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn update_project(&mut self, id: Uuid, patch: ProjectPatch) -> Result<Project> {
        patch.validate()?;
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AnnotationError::project_not_found(id))?;
        patch.apply(project);
        let updated = project.clone();
        self.persist_projects();
        Ok(updated)
    }

    // ----- Tasks -----

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| AnnotationError::task_not_found(id))
    }

    /// Tasks of one project, optionally narrowed to a status.
    pub fn project_tasks(&self, project_id: Uuid, status: Option<TaskStatus>) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect()
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AnnotationError::InvalidInput("task name is required".into()));
        }
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == new.project_id)
            .ok_or_else(|| AnnotationError::project_not_found(new.project_id))?;

        let task = Task {
            id: Uuid::new_v4(),
            name: name.to_string(),
            project_id: new.project_id,
            status: TaskStatus::New,
            files: new.files,
            created_at: Utc::now(),
        };
        project.task_ids.insert(0, task.id);
        self.tasks.insert(0, task.clone());
        self.persist_tasks();
        self.persist_projects();
        info!(task_id = %task.id, project_id = %task.project_id, files = task.files.len(), "task created");
        Ok(task)
    }

    pub fn apply_task_event(&mut self, id: Uuid, event: TaskEvent) -> Result<Task> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AnnotationError::task_not_found(id))?;
        let from = task.status;
        let (to, _effect) = transition(from, event)?;
        task.status = to;
        let updated = task.clone();
        self.persist_tasks();
        info!(task_id = %id, ?from, ?to, "task status changed");
        Ok(updated)
    }

    // ----- Answers -----

    pub fn answers(&self, task_id: Uuid) -> AnswerSet {
        load_or_default(&self.storage, &answers_key(task_id))
    }

    pub fn save_answers(&mut self, task_id: Uuid, answers: &AnswerSet) {
        let raw = serde_json::to_string(answers);
        self.commit(&answers_key(task_id), raw);
    }

    pub fn dashboard(&self) -> Dashboard {
        let count = |s: TaskStatus| self.tasks.iter().filter(|t| t.status == s).count();
        Dashboard {
            projects: self.projects.len(),
            tasks: self.tasks.len(),
            in_progress: count(TaskStatus::InProgress),
            done: count(TaskStatus::Done),
        }
    }

    fn persist_projects(&mut self) {
        let raw = serde_json::to_string(&self.projects);
        self.commit(KEY_PROJECTS, raw);
    }

    fn persist_tasks(&mut self) {
        let raw = serde_json::to_string(&self.tasks);
        self.commit(KEY_TASKS, raw);
    }

    fn commit(&mut self, key: &str, raw: serde_json::Result<String>) {
        let outcome = raw
            .map_err(KvError::from)
            .and_then(|value| self.storage.put(key, &value));
        if let Err(e) = outcome {
            self.persist_failures += 1;
            warn!(key, error = %e, "persist failed; keeping in-memory state");
        }
    }
}

fn load_or_default<S: Storage, T: DeserializeOwned + Default>(storage: &S, key: &str) -> T {
    match storage.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored value unreadable; starting empty");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "storage read failed; starting empty");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Answer, Question, QuestionKind, TaskFile};
    use kv::InMemoryStorage;

    fn new_project(name: &str) -> NewProject {
        NewProject { name: name.into(), instruction: "rate carefully".into() }
    }

    #[test]
    fn test_create_project_defaults() {
        let mut store = Store::open(InMemoryStorage::new());
        let p = store.create_project(new_project("  Dialogs v1 ")).unwrap();

        assert_eq!(p.name, "Dialogs v1");
        assert_eq!(p.questionnaire.len(), 3);
        assert_eq!(p.kipp.model, "gpt-4o-mini");
        assert!(p.task_ids.is_empty());
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut store = Store::open(InMemoryStorage::new());
        assert!(matches!(
            store.create_project(new_project("   ")),
            Err(AnnotationError::InvalidInput(_))
        ));

        let p = store.create_project(new_project("p")).unwrap();
        let res = store.create_task(NewTask { project_id: p.id, name: " ".into(), files: vec![] });
        assert!(matches!(res, Err(AnnotationError::InvalidInput(_))));
    }

    #[test]
    fn test_newest_first() {
        let mut store = Store::open(InMemoryStorage::new());
        store.create_project(new_project("first")).unwrap();
        store.create_project(new_project("second")).unwrap();
        assert_eq!(store.projects()[0].name, "second");
    }

    #[test]
    fn test_create_task_links_project() {
        let mut store = Store::open(InMemoryStorage::new());
        let p = store.create_project(new_project("p")).unwrap();
        let t1 = store
            .create_task(NewTask { project_id: p.id, name: "t1".into(), files: vec![] })
            .unwrap();
        let t2 = store
            .create_task(NewTask {
                project_id: p.id,
                name: "t2".into(),
                files: vec![TaskFile::from_upload("a.json", b"[]")],
            })
            .unwrap();

        assert_eq!(t1.status, TaskStatus::New);
        assert_eq!(store.project(p.id).unwrap().task_ids, vec![t2.id, t1.id]);
        assert_eq!(store.project_tasks(p.id, None).len(), 2);
    }

    #[test]
    fn test_create_task_unknown_project() {
        let mut store = Store::open(InMemoryStorage::new());
        let res = store.create_task(NewTask {
            project_id: Uuid::new_v4(),
            name: "t".into(),
            files: vec![],
        });
        assert!(matches!(res, Err(AnnotationError::NotFound { kind: "project", .. })));
    }

    #[test]
    fn test_update_project_patch() {
        let mut store = Store::open(InMemoryStorage::new());
        let p = store.create_project(new_project("p")).unwrap();

        let updated = store
            .update_project(
                p.id,
                ProjectPatch {
                    instruction: Some("new instruction".into()),
                    questionnaire: Some(vec![Question::new("Fluency", QuestionKind::Stars { scale: 10 })]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "p");
        assert_eq!(updated.instruction, "new instruction");
        assert_eq!(updated.questionnaire.len(), 1);

        let bad = store.update_project(
            p.id,
            ProjectPatch {
                questionnaire: Some(vec![Question::new("x", QuestionKind::Stars { scale: 2 })]),
                ..Default::default()
            },
        );
        assert!(bad.is_err());
        assert_eq!(store.project(p.id).unwrap().questionnaire.len(), 1);
    }

    #[test]
    fn test_status_filter_and_dashboard() {
        let mut store = Store::open(InMemoryStorage::new());
        let p = store.create_project(new_project("p")).unwrap();
        let a = store.create_task(NewTask { project_id: p.id, name: "a".into(), files: vec![] }).unwrap();
        let b = store.create_task(NewTask { project_id: p.id, name: "b".into(), files: vec![] }).unwrap();
        store.create_task(NewTask { project_id: p.id, name: "c".into(), files: vec![] }).unwrap();

        store.apply_task_event(a.id, TaskEvent::SendToAnnotation).unwrap();
        store.apply_task_event(b.id, TaskEvent::Finalize).unwrap();

        assert_eq!(store.project_tasks(p.id, Some(TaskStatus::InProgress)).len(), 1);
        assert_eq!(store.project_tasks(p.id, Some(TaskStatus::New)).len(), 1);
        assert_eq!(
            store.dashboard(),
            Dashboard { projects: 1, tasks: 3, in_progress: 1, done: 1 }
        );
    }

    #[test]
    fn test_reload_from_same_backend() {
        let backend = InMemoryStorage::new();
        let mut store = Store::open(backend.clone());
        let p = store.create_project(new_project("p")).unwrap();
        let t = store.create_task(NewTask { project_id: p.id, name: "t".into(), files: vec![] }).unwrap();

        let mut answers = AnswerSet::new();
        answers.entry(2).or_default().insert("q".into(), Answer::Score(3.0));
        store.save_answers(t.id, &answers);

        let reopened = Store::open(backend);
        assert_eq!(reopened.projects().len(), 1);
        assert_eq!(reopened.task(t.id).unwrap().name, "t");
        assert_eq!(reopened.answers(t.id), answers);
    }

    #[test]
    fn test_corrupt_collections_load_empty() {
        let mut backend = InMemoryStorage::new();
        backend.put(KEY_PROJECTS, "{not json").unwrap();
        backend.put(KEY_TASKS, "42").unwrap();
        let id = Uuid::new_v4();
        backend.put(&answers_key(id), "[").unwrap();

        let store = Store::open(backend);
        assert!(store.projects().is_empty());
        assert!(store.tasks().is_empty());
        assert!(store.answers(id).is_empty());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut store = Store::open(InMemoryStorage::with_quota(64));
        let p = store.create_project(new_project("over quota")).unwrap();

        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.project(p.id).unwrap().name, "over quota");
        assert!(store.persist_failures() >= 1);
        assert_eq!(store.storage().get(KEY_PROJECTS).unwrap(), None);
    }
}
