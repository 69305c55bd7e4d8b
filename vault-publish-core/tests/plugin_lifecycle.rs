use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use vault_publish_core::contract::{
    HostComponent, MockConnector, MockDocumentHost, MockObjectStore, MockSettingsStore,
    ObjectStore,
};
use vault_publish_core::dispatcher::PublishOutcome;
use vault_publish_core::document::{metadata, Document, MetaValue};
use vault_publish_core::plugin::PublishPlugin;
use vault_publish_core::settings::SettingField;
use vault_publish_core::{PublishConfig, PublishError};

fn stored_config() -> PublishConfig {
    PublishConfig {
        access_key: "AK".into(),
        secret: "SK".into(),
        bucket: "vault".into(),
        ..PublishConfig::default()
    }
}

fn settings_returning(config: PublishConfig) -> MockSettingsStore {
    let mut settings = MockSettingsStore::new();
    settings
        .expect_load()
        .returning(move || Ok(Some(config.clone())));
    settings
}

fn connector_with(store: MockObjectStore) -> Box<MockConnector> {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .times(1)
        .return_once(move |_| Ok(Arc::new(store) as Arc<dyn ObjectStore>));
    Box::new(connector)
}

fn flagged(path: &str) -> Document {
    Document::new(path, Some(metadata([("published", true)])))
}

#[tokio::test]
async fn commands_require_start() {
    let plugin = PublishPlugin::new(
        MockDocumentHost::new(),
        MockSettingsStore::new(),
        Box::new(MockConnector::new()),
    );
    assert!(matches!(
        plugin.publish_all().await,
        Err(PublishError::NotStarted)
    ));
    assert!(matches!(
        plugin.publish_active().await,
        Err(PublishError::NotStarted)
    ));
}

#[tokio::test]
async fn start_loads_settings_and_connects() {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .withf(|config: &PublishConfig| config.bucket == "vault" && config.access_key == "AK")
        .times(1)
        .return_once(|_| Ok(Arc::new(MockObjectStore::new()) as Arc<dyn ObjectStore>));

    let mut plugin = PublishPlugin::new(
        MockDocumentHost::new(),
        settings_returning(stored_config()),
        Box::new(connector),
    );
    plugin.start().await.expect("start");
    assert!(plugin.is_started());
    assert_eq!(plugin.config(), &stored_config());

    plugin.stop().await.expect("stop");
    assert!(!plugin.is_started());
}

#[tokio::test]
async fn start_with_nothing_stored_uses_defaults() {
    let mut settings = MockSettingsStore::new();
    settings.expect_load().returning(|| Ok(None));
    let mut plugin = PublishPlugin::new(
        MockDocumentHost::new(),
        settings,
        connector_with(MockObjectStore::new()),
    );
    plugin.start().await.unwrap();
    assert_eq!(plugin.config(), &PublishConfig::default());
}

#[tokio::test]
async fn failed_connect_leaves_plugin_stopped() {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .returning(|_| Err(PublishError::Connect("no credentials".into())));
    let mut plugin = PublishPlugin::new(
        MockDocumentHost::new(),
        settings_returning(PublishConfig::default()),
        Box::new(connector),
    );
    assert!(matches!(
        plugin.start().await,
        Err(PublishError::Connect(_))
    ));
    assert!(!plugin.is_started());
}

#[tokio::test]
async fn publish_active_without_focus_is_a_silent_no_op() {
    let mut host = MockDocumentHost::new();
    host.expect_active_document().returning(|| Ok(None));
    let mut plugin = PublishPlugin::new(
        host,
        settings_returning(stored_config()),
        connector_with(MockObjectStore::new()),
    );
    plugin.start().await.unwrap();

    assert_eq!(plugin.publish_active().await.unwrap(), None);
}

#[tokio::test]
async fn publish_active_uploads_the_focused_document() {
    let mut host = MockDocumentHost::new();
    host.expect_active_document()
        .returning(|| Ok(Some(flagged("Project Notes.md"))));
    host.expect_read_content()
        .returning(|_| Ok("# Project".to_string()));

    let mut store = MockObjectStore::new();
    store
        .expect_put()
        .withf(|bucket: &str, key: &str, content: &[u8]| {
            bucket == "vault" && key == "Project-Notes.md" && content == b"# Project"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut plugin = PublishPlugin::new(
        host,
        settings_returning(stored_config()),
        connector_with(store),
    );
    plugin.start().await.unwrap();

    assert_eq!(
        plugin.publish_active().await.unwrap(),
        Some(PublishOutcome::Uploaded {
            remote_key: "Project-Notes.md".into()
        })
    );
}

#[tokio::test]
async fn publish_all_goes_through_every_listed_document() {
    let mut host = MockDocumentHost::new();
    host.expect_list_documents().returning(|| {
        Ok(vec![
            flagged("a.md"),
            Document::new("b.md", None),
            flagged("c.md"),
        ])
    });
    host.expect_read_content().returning(|_| Ok(String::new()));

    let keys = Arc::new(Mutex::new(Vec::new()));
    let recorded = keys.clone();
    let mut store = MockObjectStore::new();
    store
        .expect_put()
        .times(2)
        .returning(move |_bucket: &str, key: &str, _content: &[u8]| {
            recorded.lock().unwrap().push(key.to_string());
            Ok(())
        });

    let mut plugin = PublishPlugin::new(
        host,
        settings_returning(stored_config()),
        connector_with(store),
    );
    plugin.start().await.unwrap();

    let report = plugin.publish_all().await.unwrap();
    assert_eq!(report.uploaded(), 2);
    assert_eq!(report.skipped(), 1);
    let mut keys = keys.lock().unwrap().clone();
    keys.sort();
    assert_eq!(keys, vec!["a.md", "c.md"]);
}

#[tokio::test]
async fn host_listing_failure_surfaces_as_error() {
    let mut host = MockDocumentHost::new();
    host.expect_list_documents()
        .returning(|| Err("permission denied".into()));
    let mut plugin = PublishPlugin::new(
        host,
        settings_returning(stored_config()),
        connector_with(MockObjectStore::new()),
    );
    plugin.start().await.unwrap();

    assert!(matches!(
        plugin.publish_all().await,
        Err(PublishError::Host(msg)) if msg.contains("permission denied")
    ));
}

#[tokio::test]
async fn plan_runs_the_selector_without_a_store() {
    let mut host = MockDocumentHost::new();
    host.expect_list_documents().returning(|| {
        Ok(vec![
            Document::new(
                "post.md",
                Some(metadata([
                    ("published", MetaValue::Bool(true)),
                    ("type", MetaValue::from("blog")),
                ])),
            ),
            Document::new("Draft.md", Some(metadata([("published", false)]))),
        ])
    });
    let mut plugin = PublishPlugin::new(
        host,
        settings_returning(stored_config()),
        Box::new(MockConnector::new()),
    );
    plugin.reload_config().await.unwrap();

    let plan = plugin
        .plan_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        .await
        .unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].decision.remote_key.as_deref(), Some("blog/2024-03-5.md"));
    assert!(!plan[1].decision.should_publish);
}

#[tokio::test]
async fn update_setting_loads_first_then_persists() {
    let saved = Arc::new(Mutex::new(Vec::<PublishConfig>::new()));
    let recorded = saved.clone();
    let mut settings = settings_returning(stored_config());
    settings.expect_save().returning(move |config: &PublishConfig| {
        recorded.lock().unwrap().push(config.clone());
        Ok(())
    });
    let mut plugin = PublishPlugin::new(
        MockDocumentHost::new(),
        settings,
        Box::new(MockConnector::new()),
    );

    plugin
        .update_setting(SettingField::Tag, "share")
        .await
        .unwrap();

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].tag, "share");
    // Stored values were loaded before the change, not clobbered by defaults.
    assert_eq!(saved[0].access_key, "AK");
    assert_eq!(saved[0].bucket, "vault");
}

#[tokio::test]
async fn connection_setting_change_reconnects_a_running_plugin() {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .times(2)
        .returning(|_| Ok(Arc::new(MockObjectStore::new()) as Arc<dyn ObjectStore>));
    let mut settings = settings_returning(stored_config());
    settings.expect_save().returning(|_| Ok(()));

    let mut plugin = PublishPlugin::new(MockDocumentHost::new(), settings, Box::new(connector));
    plugin.start().await.unwrap();
    plugin
        .update_setting(SettingField::Endpoint, "minio.local:9000")
        .await
        .unwrap();
    // Not a connection setting: no third connect.
    plugin
        .update_setting(SettingField::DefaultFolder, "site")
        .await
        .unwrap();
    assert_eq!(plugin.config().endpoint, "minio.local:9000");
}
