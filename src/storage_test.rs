use super::*;

// =============================================================================
// MemoryStore
// =============================================================================

#[tokio::test]
async fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);

    store.set(TOKEN_KEY, "abc").await.unwrap();
    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));

    store.remove(TOKEN_KEY).await.unwrap();
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_remove_missing_is_ok() {
    let store = MemoryStore::new();
    store.remove(USER_KEY).await.unwrap();
    store.remove(USER_KEY).await.unwrap();
}

#[tokio::test]
async fn memory_store_with_entries_prepopulates() {
    let store = MemoryStore::with_entries([(TOKEN_KEY, "t"), (USER_KEY, r#"{"id":1}"#)]);
    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("t"));
    assert_eq!(store.get(USER_KEY).await.unwrap().as_deref(), Some(r#"{"id":1}"#));
}

// =============================================================================
// FileStore
// =============================================================================

#[tokio::test]
async fn file_store_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let first = FileStore::new(&path);
    first.set(TOKEN_KEY, "abc").await.unwrap();
    first.set(USER_KEY, r#"{"name":"Ann"}"#).await.unwrap();

    let second = FileStore::new(&path);
    assert_eq!(second.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));
    assert_eq!(second.get(USER_KEY).await.unwrap().as_deref(), Some(r#"{"name":"Ann"}"#));
}

#[tokio::test]
async fn file_store_remove_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    store.set(TOKEN_KEY, "abc").await.unwrap();
    store.set(USER_KEY, "{}").await.unwrap();

    store.remove(TOKEN_KEY).await.unwrap();
    store.remove(TOKEN_KEY).await.unwrap();

    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_KEY).await.unwrap().as_deref(), Some("{}"));
}

#[tokio::test]
async fn file_store_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    store.set(TOKEN_KEY, "abc").await.unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["session.json".to_string()]);
}

#[tokio::test]
async fn file_store_corrupt_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(store.get(TOKEN_KEY).await, Err(StorageError::Codec(_))));
}
