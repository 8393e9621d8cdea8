use annotation::{
    AnnotationSession, Answer, Finalize, FileSummary, NewProject, NewTask, Store, TaskEvent,
    TaskFile, TaskStatus,
};
use kv::FileBackedStorage;

const DATASET: &str = r#"[
  {"data": {"input": [{"role": "user", "content": "What is the weather?"},
                      {"role": "function_call", "name": "weather.get_weather", "content": "{\"t\": 21}"},
                      {"role": "assistant", "content": "It is 21 degrees."}],
            "input_2": [{"role": "user", "content": "What is the weather?"},
                        {"role": "assistant", "content": "No idea."}]}},
  {"input": [{"role": "user", "content": "   "}]},
  {"input_2": [{"role": "assistant", "text": "only B"}]}
]"#;

#[test]
fn test_upload_annotate_finalize_with_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("validatio.json");

    let (task_id, questions) = {
        let mut store = Store::open(FileBackedStorage::new(&path).unwrap());
        let project = store
            .create_project(NewProject { name: "Weather bots".into(), instruction: "Compare A and B".into() })
            .unwrap();
        let files = vec![
            TaskFile::from_upload("batch.json", DATASET.as_bytes()),
            TaskFile::from_upload("broken.json", b"[{\"input\": "),
        ];
        let task = store
            .create_task(NewTask { project_id: project.id, name: "Batch 1".into(), files })
            .unwrap();

        let summary = FileSummary::of_task(&task);
        assert!(summary[0].parsed);
        assert_eq!(summary[0].examples, 2);
        assert!(!summary[1].parsed);
        assert_eq!(summary[1].examples, 0);

        store.apply_task_event(task.id, TaskEvent::SendToAnnotation).unwrap();

        let mut session = AnnotationSession::open(&store, task.id).unwrap();
        assert_eq!(session.len(), 2);
        let first = session.current().unwrap().clone();
        let a = first.dialogue_a.unwrap();
        assert_eq!(a[1].speaker, "get_weather");
        assert_eq!(a[1].text, "{\"t\": 21}");

        let stars = project.questionnaire[0].id.clone();
        session.set_answer(&mut store, 0, &stars, Answer::Score(5.0)).unwrap();
        (task.id, project.questionnaire)
    };

    // fresh process: everything comes back from the file
    let mut store = Store::open(FileBackedStorage::new(&path).unwrap());
    assert_eq!(store.task(task_id).unwrap().status, TaskStatus::InProgress);

    let mut session = AnnotationSession::open(&store, task_id).unwrap();
    assert_eq!(session.answers()[&0][&questions[0].id], Answer::Score(5.0));
    assert!(session.advance().is_err());

    session.set_answer(&mut store, 0, &questions[1].id, Answer::Flag(true)).unwrap();
    session.set_answer(&mut store, 0, &questions[2].id, Answer::Text("A is better".into())).unwrap();
    assert_eq!(session.advance().unwrap(), 1);

    match session.finalize(&mut store, false).unwrap() {
        Finalize::NeedsConfirmation { incomplete } => assert_eq!(incomplete, vec![1]),
        other => panic!("expected confirmation gate, got {other:?}"),
    }
    assert_eq!(session.finalize(&mut store, true).unwrap(), Finalize::Done);

    let store = Store::open(FileBackedStorage::new(&path).unwrap());
    assert_eq!(store.task(task_id).unwrap().status, TaskStatus::Done);
    assert_eq!(store.dashboard().done, 1);
}
