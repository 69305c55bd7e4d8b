///
/// This module implements the full CLI interface for vault-publish: command parsing,
/// argument validation, main entrypoints and user-visible output.
///
/// All core logic (selection, dispatch, settings persistence, the vault adapter) lives
/// in the [`vault-publish-core`] crate. This module is strictly CLI glue: it builds a
/// [`PublishPlugin`] from the vault, the settings file and the S3 connector, and maps
/// each subcommand onto one plugin command.
///
/// ## Commands
/// - `publish-active --file <path>`: publish the focused document.
/// - `publish-all`: publish every flagged document in the vault.
/// - `plan`: show what would be published, and where, without uploading.
/// - `settings show` / `settings set <field> <value>`: inspect or change one setting.
///
/// [`vault-publish-core`]: ../../vault-publish-core/
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vault_publish_core::contract::HostComponent;
use vault_publish_core::dispatcher::{PublishOutcome, PublishReport};
use vault_publish_core::plugin::PublishPlugin;
use vault_publish_core::settings::{FileSettingsStore, SettingField};
use vault_publish_core::vault::VaultHost;
use vault_publish_core::PublishConfig;

use crate::load_config::{default_settings_path, load_config, settings_store, EnvSettingsStore};
use crate::upload::S3Connector;

/// CLI for vault-publish: publish flagged markdown documents to an S3 bucket.
#[derive(Parser)]
#[clap(
    name = "vault-publish",
    version,
    about = "Publish frontmatter-flagged markdown documents from a vault to an S3-compatible bucket"
)]
pub struct Cli {
    /// Root directory of the markdown vault
    #[clap(long, global = true, env = "VAULT_PUBLISH_VAULT", default_value = ".")]
    pub vault: PathBuf,

    /// Settings file (defaults to <vault>/.vault-publish/settings.json)
    #[clap(long, global = true, env = "VAULT_PUBLISH_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the active document, if it is flagged for publication
    PublishActive {
        /// The focused document, absolute or relative to the vault
        #[clap(long)]
        file: Option<PathBuf>,
    },
    /// Publish every flagged document in the vault
    PublishAll,
    /// Show each document's publish decision without uploading anything
    Plan,
    /// Show or change settings
    Settings {
        #[clap(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings (secret redacted)
    Show,
    /// Change one setting and save it immediately
    Set {
        /// access-key, secret, bucket, endpoint, tag, default-folder, region, use-ssl or path-style
        field: String,
        value: String,
    },
}

type CliPlugin = PublishPlugin<VaultHost, EnvSettingsStore<FileSettingsStore>>;

fn build_plugin(host: VaultHost, settings_path: PathBuf) -> CliPlugin {
    PublishPlugin::new(host, settings_store(settings_path), Box::new(S3Connector))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| default_settings_path(&cli.vault));
    tracing::debug!(vault = %cli.vault.display(), settings = %settings_path.display(), "Resolved paths");
    let host = VaultHost::new(&cli.vault);

    match cli.command {
        Commands::PublishActive { file } => {
            let Some(file) = file else {
                tracing::debug!(command = "publish-active", "No active document given");
                println!("No active document, nothing to publish.");
                return Ok(());
            };
            let mut plugin = build_plugin(host.with_active(file), settings_path);
            plugin
                .start()
                .await
                .context("Failed to start publisher")?;
            let outcome = plugin.publish_active().await?;
            plugin.stop().await?;
            match outcome {
                Some(outcome) => print_outcome(&outcome),
                None => println!("No active document, nothing to publish."),
            }
            Ok(())
        }
        Commands::PublishAll => {
            let mut plugin = build_plugin(host, settings_path);
            plugin
                .start()
                .await
                .context("Failed to start publisher")?;
            tracing::info!(command = "publish-all", "Starting publish run");
            let report = plugin.publish_all().await?;
            plugin.stop().await?;
            print_report(&report);
            Ok(())
        }
        Commands::Plan => {
            let mut plugin = build_plugin(host, settings_path);
            plugin.reload_config().await?;
            let plan = plugin.plan().await?;
            let mut selected = 0;
            for planned in &plan {
                match &planned.decision.remote_key {
                    Some(key) => {
                        selected += 1;
                        println!("{} -> {}", planned.document.path, key);
                    }
                    None => println!("{} (not published)", planned.document.path),
                }
            }
            println!(
                "{selected} of {} document(s) would be published to bucket {}",
                plan.len(),
                plugin.config().bucket
            );
            Ok(())
        }
        Commands::Settings { command } => {
            match command {
                SettingsCommand::Show => {
                    let config = load_config(&settings_path).await?;
                    println!("{}", redacted_json(&config)?);
                }
                SettingsCommand::Set { field, value } => {
                    let field: SettingField = field.parse()?;
                    let mut plugin = build_plugin(host, settings_path);
                    plugin.update_setting(field, &value).await?;
                    println!("Saved {field}.");
                }
            }
            Ok(())
        }
    }
}

fn print_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Skipped => println!("Document is not flagged for publication, skipped."),
        PublishOutcome::Uploaded { remote_key } => println!("Published {remote_key}"),
        PublishOutcome::Failed {
            remote_key,
            stage,
            error,
        } => println!("Failed to publish {remote_key} ({stage:?}): {error}"),
    }
}

fn print_report(report: &PublishReport) {
    for document in &report.documents {
        match &document.outcome {
            PublishOutcome::Skipped => {}
            PublishOutcome::Uploaded { remote_key } => {
                println!("uploaded {} -> {}", document.path, remote_key)
            }
            PublishOutcome::Failed {
                remote_key, error, ..
            } => println!("failed   {} -> {}: {}", document.path, remote_key, error),
        }
    }
    println!(
        "Published {} document(s), {} failed, {} skipped",
        report.uploaded(),
        report.failed(),
        report.skipped()
    );
}

fn redacted_json(config: &PublishConfig) -> Result<String> {
    let mut value = serde_json::to_value(config)?;
    if !config.secret.is_empty() {
        value["secret"] = serde_json::Value::String("********".into());
    }
    Ok(serde_json::to_string_pretty(&value)?)
}
