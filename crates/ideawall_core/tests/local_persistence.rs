use ideawall_core::config::StorageConfig;
use ideawall_core::db::open_db_in_memory;
use ideawall_core::{
    ManualClock, Note, NoteDefaults, NoteDraft, NoteFactory, NotePersistence, PersistError,
    SqliteNoteStorage,
};
use std::sync::Arc;

fn factory() -> NoteFactory {
    NoteFactory::seeded(
        Arc::new(ManualClock::new(1_700_000_000_000)),
        11,
        NoteDefaults::default(),
    )
}

fn notes(titles: &[&str]) -> Vec<Note> {
    let mut factory = factory();
    titles
        .iter()
        .map(|title| factory.build(NoteDraft::new(*title, "body")).unwrap())
        .collect()
}

fn storage() -> SqliteNoteStorage {
    SqliteNoteStorage::new(open_db_in_memory().unwrap(), "idea-wall-notes")
}

#[test]
fn saved_collection_loads_back_in_order() {
    let storage = storage();
    let saved = notes(&["first", "second", "third"]);

    storage.save(&saved);

    assert_eq!(storage.load(), saved);
}

#[test]
fn absent_key_loads_empty() {
    let storage = storage();
    assert!(storage.read_raw().unwrap().is_none());
    assert!(storage.try_load().unwrap().is_empty());
}

#[test]
fn corrupt_or_non_array_values_degrade_to_empty() {
    let storage = storage();

    storage.write_raw("{not json").unwrap();
    assert!(matches!(storage.try_load(), Err(PersistError::Corrupt(_))));
    assert!(storage.load().is_empty());

    storage.write_raw(r#"{"id": "x"}"#).unwrap();
    assert!(matches!(storage.try_load(), Err(PersistError::Corrupt(_))));
    assert!(storage.load().is_empty());
}

#[test]
fn quota_overflow_keeps_previous_value() {
    let storage = storage().with_quota(Some(600));
    let small = notes(&["one"]);
    storage.try_save(&small).unwrap();
    let before = storage.read_raw().unwrap();

    let large = notes(&["one", "two", "three", "four", "five"]);
    let err = storage.try_save(&large).unwrap_err();
    assert!(matches!(err, PersistError::QuotaExceeded { quota: 600, .. }));

    storage.save(&large);
    assert_eq!(storage.read_raw().unwrap(), before);
    assert_eq!(storage.load(), small);
}

#[test]
fn legacy_description_records_hydrate_into_content() {
    let storage = storage();
    storage
        .write_raw(
            r##"[{
                "id": "0b6f1c8e-8a57-4d4f-9d7e-2b7f0c9a1e11",
                "title": "Legacy",
                "description": "old body",
                "position": {"x": 12, "y": 34},
                "rotation": 2.5,
                "color": "#FFB6C1",
                "createdAt": 1000
            }]"##,
        )
        .unwrap();

    let loaded = storage.load();
    assert_eq!(loaded.len(), 1);
    let note = &loaded[0];
    assert_eq!(note.content, "old body");
    assert_eq!(note.color.as_str(), "#ffb6c1");
    assert_eq!(note.updated_at, 1000);
    assert_eq!(note.size.width, 250.0);

    storage.save(&loaded);
    let raw = storage.read_raw().unwrap().unwrap();
    assert!(raw.contains("\"content\":\"old body\""));
    assert!(!raw.contains("description"));
}

#[test]
fn invalid_and_duplicate_records_are_skipped() {
    let storage = storage();
    storage
        .write_raw(
            r##"[
                {"id": "5a0d4a8e-2f7e-4c1b-8f0e-6f6c2f3a9b01", "title": "keep", "content": "a", "position": {"x": 0, "y": 0}, "color": "#fffacd", "createdAt": 1, "updatedAt": 2},
                {"id": "5a0d4a8e-2f7e-4c1b-8f0e-6f6c2f3a9b01", "title": "dupe", "content": "b", "position": {"x": 0, "y": 0}, "color": "#fffacd", "createdAt": 1, "updatedAt": 2},
                {"id": "not-a-uuid", "title": "bad id", "position": {"x": 0, "y": 0}, "createdAt": 1},
                {"id": "6b1e5b9f-3a8f-4d2c-9a1f-7a7d3a4b0c12", "title": "   ", "position": {"x": 0, "y": 0}, "createdAt": 1},
                42
            ]"##,
        )
        .unwrap();

    let loaded = storage.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "keep");
}

#[test]
fn file_backed_storage_survives_reopen_and_isolates_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        db_path: Some(dir.path().join("wall.db")),
        ..StorageConfig::default()
    };
    let saved = notes(&["durable"]);

    {
        let storage = SqliteNoteStorage::open(&config).unwrap();
        storage.save(&saved);
    }

    let reopened = SqliteNoteStorage::open(&config).unwrap();
    assert_eq!(reopened.key(), "idea-wall-notes");
    assert_eq!(reopened.load(), saved);

    let other = SqliteNoteStorage::open(&StorageConfig {
        storage_key: "another-wall".to_string(),
        ..config.clone()
    })
    .unwrap();
    assert!(other.load().is_empty());

    reopened.clear().unwrap();
    assert!(reopened.load().is_empty());
}
