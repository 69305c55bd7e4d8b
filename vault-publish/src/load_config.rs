/// `load_config` module: loads the persisted settings record and injects secrets from the environment.
///
/// The settings file holds everything a publish run needs. Credentials and
/// connection details may instead come from the environment (or a `.env`
/// file), so they never have to be written to disk:
///
/// | variable        | overrides    |
/// |-----------------|--------------|
/// | `S3_ACCESS_KEY` | `accessKey`  |
/// | `S3_SECRET`     | `secret`     |
/// | `S3_BUCKET`     | `bucket`     |
/// | `S3_ENDPOINT`   | `endpoint`   |
///
/// Overrides apply on load only. [`EnvSettingsStore::save`] writes back the
/// on-disk value for every field that still holds its injected value, so an
/// injected secret is never persisted. A field the user changed explicitly is
/// saved as given, though the environment keeps taking precedence on load.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use vault_publish_core::contract::SettingsStore;
use vault_publish_core::settings::FileSettingsStore;
use vault_publish_core::{PublishConfig, PublishError};

pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const ENV_SECRET: &str = "S3_SECRET";
pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";

/// Settings file used when `--settings` is not given.
pub fn default_settings_path(vault: &Path) -> PathBuf {
    vault.join(".vault-publish").join("settings.json")
}

type FieldAccess = fn(&mut PublishConfig) -> &mut String;

fn access_key(c: &mut PublishConfig) -> &mut String {
    &mut c.access_key
}

fn secret(c: &mut PublishConfig) -> &mut String {
    &mut c.secret
}

fn bucket(c: &mut PublishConfig) -> &mut String {
    &mut c.bucket
}

fn endpoint(c: &mut PublishConfig) -> &mut String {
    &mut c.endpoint
}

const ENV_FIELDS: [(&str, FieldAccess); 4] = [
    (ENV_ACCESS_KEY, access_key),
    (ENV_SECRET, secret),
    (ENV_BUCKET, bucket),
    (ENV_ENDPOINT, endpoint),
];

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// [`SettingsStore`] that layers environment overrides over another store.
pub struct EnvSettingsStore<S> {
    inner: S,
}

impl<S: SettingsStore> EnvSettingsStore<S> {
    pub fn new(inner: S) -> Self {
        EnvSettingsStore { inner }
    }
}

#[async_trait]
impl<S: SettingsStore> SettingsStore for EnvSettingsStore<S> {
    async fn load(&self) -> Result<Option<PublishConfig>, PublishError> {
        let stored = self.inner.load().await?;
        let mut config = stored.clone().unwrap_or_default();
        let mut overridden = false;
        for (name, field) in ENV_FIELDS {
            if let Some(value) = env_value(name) {
                debug!(variable = name, "Setting overridden from environment");
                *field(&mut config) = value;
                overridden = true;
            }
        }
        if stored.is_none() && !overridden {
            return Ok(None);
        }
        Ok(Some(config))
    }

    async fn save(&self, config: &PublishConfig) -> Result<(), PublishError> {
        let stored = self.inner.load().await?.unwrap_or_default();
        let mut to_write = config.clone();
        for (name, field) in ENV_FIELDS {
            let Some(injected) = env_value(name) else {
                continue;
            };
            if *field(&mut to_write) == injected {
                let mut on_disk = stored.clone();
                *field(&mut to_write) = std::mem::take(field(&mut on_disk));
            } else {
                warn!(
                    variable = name,
                    "Saved a setting that the environment overrides; the environment value still applies"
                );
            }
        }
        self.inner.save(&to_write).await
    }
}

/// The settings store the CLI uses: a JSON file with environment overrides.
pub fn settings_store(path: impl Into<PathBuf>) -> EnvSettingsStore<FileSettingsStore> {
    EnvSettingsStore::new(FileSettingsStore::new(path))
}

/// Loads the effective settings from `path` (defaults if the file does not
/// exist yet), with environment overrides applied.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings");

    let config = settings_store(path_ref)
        .load()
        .await
        .with_context(|| format!("Failed to load settings from {}", path_ref.display()))?
        .unwrap_or_default();
    config.trace_loaded();
    Ok(config)
}
