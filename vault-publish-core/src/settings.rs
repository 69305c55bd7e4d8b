//! Settings commands and file-backed persistence.
//!
//! Each settings field is updated through an explicit command
//! ([`apply_setting`]) and persisted right after ([`update_setting`]); nothing
//! in the core reaches into a form or a global.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::contract::SettingsStore;
use crate::error::PublishError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    AccessKey,
    Secret,
    Bucket,
    Endpoint,
    Tag,
    DefaultFolder,
    Region,
    UseSsl,
    PathStyle,
}

impl SettingField {
    pub const ALL: [SettingField; 9] = [
        SettingField::AccessKey,
        SettingField::Secret,
        SettingField::Bucket,
        SettingField::Endpoint,
        SettingField::Tag,
        SettingField::DefaultFolder,
        SettingField::Region,
        SettingField::UseSsl,
        SettingField::PathStyle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingField::AccessKey => "access-key",
            SettingField::Secret => "secret",
            SettingField::Bucket => "bucket",
            SettingField::Endpoint => "endpoint",
            SettingField::Tag => "tag",
            SettingField::DefaultFolder => "default-folder",
            SettingField::Region => "region",
            SettingField::UseSsl => "use-ssl",
            SettingField::PathStyle => "path-style",
        }
    }

    /// Whether changing this field requires a new object store client.
    pub fn affects_connection(self) -> bool {
        !matches!(self, SettingField::Tag | SettingField::DefaultFolder)
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingField {
    type Err = PublishError;

    /// Accepts the kebab-case name as well as the persisted camelCase key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        SettingField::ALL
            .into_iter()
            .find(|field| field.name().replace('-', "") == normalized)
            .ok_or_else(|| PublishError::UnknownSetting(s.to_string()))
    }
}

/// Sets one field of `config` from its textual form.
pub fn apply_setting(
    config: &mut PublishConfig,
    field: SettingField,
    value: &str,
) -> Result<(), PublishError> {
    match field {
        SettingField::AccessKey => config.access_key = value.to_string(),
        SettingField::Secret => config.secret = value.to_string(),
        SettingField::Bucket => config.bucket = value.to_string(),
        SettingField::Endpoint => config.endpoint = value.to_string(),
        SettingField::Tag => config.tag = value.to_string(),
        SettingField::DefaultFolder => config.default_folder = value.to_string(),
        SettingField::Region => config.region = value.to_string(),
        SettingField::UseSsl => config.use_ssl = parse_bool(field, value)?,
        SettingField::PathStyle => config.path_style = parse_bool(field, value)?,
    }
    Ok(())
}

/// Applies one field change and persists the whole record immediately.
pub async fn update_setting<S>(
    config: &mut PublishConfig,
    field: SettingField,
    value: &str,
    store: &S,
) -> Result<(), PublishError>
where
    S: SettingsStore + ?Sized,
{
    apply_setting(config, field, value)?;
    store.save(config).await?;
    info!(field = %field, "Setting updated and saved");
    Ok(())
}

fn parse_bool(field: SettingField, value: &str) -> Result<bool, PublishError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(PublishError::InvalidSettingValue {
            field: field.name(),
            value: value.to_string(),
        }),
    }
}

/// Settings persisted as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSettingsStore { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<PublishConfig>, PublishError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file yet, using defaults");
                return Ok(None);
            }
            Err(e) => {
                return Err(PublishError::Settings(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        let config = serde_json::from_str(&raw).map_err(|e| {
            PublishError::Settings(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "Settings loaded");
        Ok(Some(config))
    }

    async fn save(&self, config: &PublishConfig) -> Result<(), PublishError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
