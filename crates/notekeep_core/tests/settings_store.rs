use notekeep_core::settings::{FontSize, SettingKey, SortBy, SortOrder};
use notekeep_core::storage::{KvStore, MemoryKvStore, SqliteKvStore, SETTINGS_KEY};
use notekeep_core::{SettingsError, SettingsStore};
use serde_json::{json, Value};

#[test]
fn updates_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.db");

    {
        let mut store = SettingsStore::open(SqliteKvStore::open(&path).unwrap()).unwrap();
        assert!(store.toggle_dark_mode().unwrap());
        store.set_language("en-US").unwrap();
        store.set_font_size(FontSize::Large).unwrap();
        store.update_by_name("sortBy", json!("title")).unwrap();
        store.update(SettingKey::SortOrder, json!("asc")).unwrap();
    }

    let store = SettingsStore::open(SqliteKvStore::open(&path).unwrap()).unwrap();
    let settings = store.settings();
    assert!(settings.is_dark_mode);
    assert_eq!(settings.language, "en-US");
    assert_eq!(store.settings().theme_config().font_size.css_px(), 18);
    let sort = settings.sort_config();
    assert_eq!(sort.sort_by, SortBy::Title);
    assert_eq!(sort.sort_order, SortOrder::Asc);
}

#[test]
fn rejected_updates_write_nothing() {
    let mut store = SettingsStore::open(MemoryKvStore::new()).unwrap();

    assert!(matches!(
        store.update_by_name("themeColor", json!("red")),
        Err(SettingsError::UnknownKey(_))
    ));
    assert!(matches!(
        store.update(SettingKey::BackupInterval, json!(-3)),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert!(matches!(
        store.set_language("   "),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert_eq!(store.settings().backup_interval, 24);
}

#[test]
fn partially_broken_record_loads_field_by_field() {
    let mut kv = MemoryKvStore::new();
    kv.set(
        SETTINGS_KEY,
        &json!({ "enableNotifications": false, "noteListWidth": "wide" }).to_string(),
    )
    .unwrap();

    let mut store = SettingsStore::open(kv).unwrap();
    assert!(!store.settings().enable_notifications);
    assert_eq!(store.settings().note_list_width, 384);
    assert!(store.settings().editor_config().enable_word_wrap);

    store.reset().unwrap();
    assert!(store.settings().enable_notifications);
}

#[test]
fn corrupt_record_falls_back_to_defaults() {
    let mut kv = MemoryKvStore::new();
    kv.set(SETTINGS_KEY, "{oops").unwrap();
    let store = SettingsStore::open(kv).unwrap();
    let defaults: Value = serde_json::to_value(store.settings()).unwrap();
    assert_eq!(defaults["language"], "zh-CN");
    assert_eq!(defaults["fontSize"], "medium");
}
