use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;
use tempfile::TempDir;

/// Creates a small vault with one unflagged and two flagged documents.
fn create_vault() -> TempDir {
    let vault = TempDir::new().expect("Creating temp vault failed");
    let root = vault.path();
    write(
        root.join("Weekly Update.md"),
        "---\npublished: true\n---\n# Weekly\n",
    )
    .expect("Writing note failed");
    write(
        root.join("Draft Plan.md"),
        "---\npublished: false\n---\n# Draft\n",
    )
    .expect("Writing note failed");
    create_dir_all(root.join("reading")).unwrap();
    write(
        root.join("reading/Reading List.md"),
        "---\npublished: true\ntype: notes\n---\n- a book\n",
    )
    .expect("Writing note failed");
    vault
}

/// The binary, pointed at `vault`, with no S3 settings leaking in from the environment.
fn vault_publish(vault: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vault-publish").expect("Binary exists");
    cmd.arg("--vault")
        .arg(vault)
        .env_remove("VAULT_PUBLISH_SETTINGS")
        .env_remove("S3_ACCESS_KEY")
        .env_remove("S3_SECRET")
        .env_remove("S3_BUCKET")
        .env_remove("S3_ENDPOINT");
    cmd
}

#[test]
fn plan_lists_remote_keys_without_credentials() {
    let vault = create_vault();

    vault_publish(vault.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Weekly Update.md -> Weekly-Update.md")
                .and(predicate::str::contains(
                    "reading/Reading List.md -> notes/Reading-List.md",
                ))
                .and(predicate::str::contains("Draft Plan.md (not published)"))
                .and(predicate::str::contains(
                    "2 of 3 document(s) would be published to bucket obsidian",
                )),
        );
}

#[test]
fn plan_honours_default_folder_and_tag_from_settings() {
    let vault = create_vault();
    let settings = vault.path().join("custom-settings.json");
    write(
        &settings,
        r#"{"defaultFolder": "/site/", "tag": "share", "bucket": "public-notes"}"#,
    )
    .unwrap();
    write(
        vault.path().join("Shared.md"),
        "---\nshare: true\n---\nhello\n",
    )
    .unwrap();

    vault_publish(vault.path())
        .arg("--settings")
        .arg(&settings)
        .arg("plan")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Shared.md -> site/Shared.md")
                .and(predicate::str::contains("Weekly Update.md (not published)"))
                .and(predicate::str::contains("bucket public-notes")),
        );
}

#[test]
fn settings_set_persists_and_show_redacts_the_secret() {
    let vault = create_vault();

    vault_publish(vault.path())
        .args(["settings", "set", "bucket", "site-bucket"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved bucket."));
    vault_publish(vault.path())
        .args(["settings", "set", "secret", "hunter2"])
        .assert()
        .success();
    vault_publish(vault.path())
        .args(["settings", "set", "useSsl", "off"])
        .assert()
        .success();

    let stored = read_to_string(vault.path().join(".vault-publish/settings.json"))
        .expect("settings file written next to the vault");
    assert!(stored.contains(r#""bucket": "site-bucket""#));
    assert!(stored.contains(r#""useSsl": false"#));

    vault_publish(vault.path())
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""bucket": "site-bucket""#)
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn settings_set_rejects_unknown_fields_and_bad_values() {
    let vault = create_vault();

    vault_publish(vault.path())
        .args(["settings", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown setting"));
    vault_publish(vault.path())
        .args(["settings", "set", "path-style", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
    assert!(!vault.path().join(".vault-publish/settings.json").exists());
}

#[test]
fn publish_active_without_a_file_is_a_no_op() {
    let vault = create_vault();

    vault_publish(vault.path())
        .arg("publish-active")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to publish"));
}

#[test]
fn publish_all_without_credentials_fails_to_start() {
    let vault = create_vault();

    vault_publish(vault.path())
        .arg("publish-all")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to start publisher"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use vault_publish::cli::{run, Cli, Commands};

    let vault = TempDir::new().unwrap();
    let cli = Cli {
        vault: vault.path().to_path_buf(),
        settings: None,
        command: Commands::PublishActive { file: None },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
