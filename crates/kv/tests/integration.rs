use kv::{FileBackedStorage, InMemoryStorage, KvError, Storage};

#[test]
fn test_basic_put_get() {
    let mut storage = InMemoryStorage::new();

    storage.put("validatio:projects", "[]").unwrap();

    assert_eq!(storage.get("validatio:projects").unwrap(), Some("[]".to_string()));
    assert_eq!(storage.get("missing").unwrap(), None);
}

#[test]
fn test_delete() {
    let mut storage = InMemoryStorage::new();
    storage.put("k", "v").unwrap();
    storage.delete("k").unwrap();

    assert_eq!(storage.get("k").unwrap(), None);
    assert!(storage.is_empty());
}

#[test]
fn test_clones_share_data() {
    let mut a = InMemoryStorage::new();
    let b = a.clone();

    a.put("k", "v").unwrap();

    assert_eq!(b.get("k").unwrap(), Some("v".to_string()));
}

#[test]
fn test_quota_rejects_oversized_write() {
    let mut storage = InMemoryStorage::with_quota(16);
    storage.put("a", "12345").unwrap();

    let err = storage.put("b", "this value is far too long").unwrap_err();
    assert!(matches!(err, KvError::QuotaExceeded { quota: 16, .. }));

    // failed write leaves the previous state untouched
    assert_eq!(storage.get("b").unwrap(), None);
    assert_eq!(storage.get("a").unwrap(), Some("12345".to_string()));
}

#[test]
fn test_quota_counts_replaced_value_once() {
    let mut storage = InMemoryStorage::with_quota(10);
    storage.put("k", "123456").unwrap();
    storage.put("k", "abcdefgh").unwrap();

    assert_eq!(storage.get("k").unwrap(), Some("abcdefgh".to_string()));
}

#[test]
fn test_boxed_storage_delegates() {
    let mut boxed: Box<dyn Storage> = Box::new(InMemoryStorage::new());
    boxed.put("k", "v").unwrap();

    assert_eq!(boxed.get("k").unwrap(), Some("v".to_string()));
}

#[test]
fn test_file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let mut storage = FileBackedStorage::new(&path).unwrap();
        storage.put("validatio:tasks", "[{\"id\":1}]").unwrap();
        storage.put("gone", "x").unwrap();
        storage.delete("gone").unwrap();
    }

    let storage = FileBackedStorage::new(&path).unwrap();
    assert_eq!(
        storage.get("validatio:tasks").unwrap(),
        Some("[{\"id\":1}]".to_string())
    );
    assert_eq!(storage.get("gone").unwrap(), None);
}

#[test]
fn test_file_storage_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileBackedStorage::new(dir.path().join("nested/none.json")).unwrap();

    assert_eq!(storage.get("anything").unwrap(), None);
}

#[test]
fn test_file_storage_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/store.json");

    let mut storage = FileBackedStorage::new(&path).unwrap();
    storage.put("k", "v").unwrap();

    assert!(path.exists());
}

#[test]
fn test_file_storage_sets_corrupt_file_aside() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, b"{truncated").unwrap();

    let mut storage = FileBackedStorage::new(&path).unwrap();
    assert_eq!(storage.get("validatio:projects").unwrap(), None);

    let aside = dir.path().join("store.json.corrupt");
    assert_eq!(std::fs::read(&aside).unwrap(), b"{truncated");

    storage.put("k", "v").unwrap();
    let reopened = FileBackedStorage::new(&path).unwrap();
    assert_eq!(reopened.get("k").unwrap(), Some("v".to_string()));
}
