//! Unit tests for override files and event classification.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::EventKind;
use tempfile::TempDir;

use crate::item::Item;
use crate::local::{ChangeKind, FsEvent, ItemEvent, LocalError, LocalOverrideStore, fs_watch::classify};

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

#[test]
fn override_path_is_key_with_json_extension() {
    let store = LocalOverrideStore::new("/etc/confsync/config");

    assert_eq!(
        store.path_for("feature_flags"),
        Path::new("/etc/confsync/config/feature_flags.json")
    );
}

#[test]
fn item_validity_requires_key_value_and_version() {
    assert!(Item::new("k", "{}", 1).is_valid());
    assert!(!Item::new("", "{}", 1).is_valid());
    assert!(!Item::new("k", "", 1).is_valid());
    assert!(!Item::new("k", "{}", 0).is_valid());
}

#[test]
fn classify_maps_notify_events() {
    assert_eq!(classify(&EventKind::Create(CreateKind::File)), Some(FsEvent::Created));
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
        Some(FsEvent::Modified)
    );
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
        Some(FsEvent::AttribChanged)
    );
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
        Some(FsEvent::Deleted)
    );
    assert_eq!(classify(&EventKind::Remove(RemoveKind::File)), Some(FsEvent::Deleted));
    assert_eq!(classify(&EventKind::Access(AccessKind::Any)), None);
}

#[test]
fn item_event_kind_and_payload() {
    let item = Item::new("k", "1", 1);

    assert_eq!(ItemEvent::Created(item.clone()).kind(), ChangeKind::Created);
    assert_eq!(ItemEvent::Updated(item.clone()).item(), Some(&item));
    assert_eq!(ItemEvent::Deleted.kind(), ChangeKind::Deleted);
    assert_eq!(ItemEvent::Deleted.item(), None);
}

#[tokio::test]
async fn read_returns_valid_override() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.json", r#"{"Key":"app","Val":"{\"port\":80}","Ver":3}"#);
    let store = LocalOverrideStore::new(dir.path());

    let item = store.read("app").await.unwrap();

    assert_eq!(item, Some(Item::new("app", r#"{"port":80}"#, 3)));
    assert!(store.exists("app").await);
}

#[tokio::test]
async fn missing_and_empty_files_are_absent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "empty.json", "");
    let store = LocalOverrideStore::new(dir.path());

    assert_eq!(store.read("missing").await.unwrap(), None);
    assert_eq!(store.read("empty").await.unwrap(), None);
    assert!(!store.exists("missing").await);
}

#[tokio::test]
async fn invalid_items_are_absent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "zero.json", r#"{"Key":"zero","Val":"1","Ver":0}"#);
    write(dir.path(), "blank.json", r#"{"Key":"blank","Val":"","Ver":2}"#);
    write(dir.path(), "nokey.json", r#"{"Val":"1","Ver":2}"#);
    let store = LocalOverrideStore::new(dir.path());

    assert_eq!(store.read("zero").await.unwrap(), None);
    assert_eq!(store.read("blank").await.unwrap(), None);
    assert_eq!(store.read("nokey").await.unwrap(), None);
}

#[tokio::test]
async fn malformed_json_is_a_format_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.json", "{not json");
    let store = LocalOverrideStore::new(dir.path());

    let result = store.read("broken").await;

    assert!(matches!(result, Err(LocalError::Format { .. })));
}
