//! The publishing component a host drives through [`HostComponent`].
//!
//! [`PublishPlugin`] holds its collaborators explicitly: the document host,
//! the settings store and a [`Connector`] that builds the object store client
//! from the loaded settings. Commands receive the current [`PublishConfig`]
//! by reference; there is no global settings object.
//!
//! Commands exposed to the host:
//! - [`PublishPlugin::publish_active`]: publish the focused document.
//! - [`PublishPlugin::publish_all`]: publish every document in the vault.
//! - [`PublishPlugin::plan`]: run the selector only, without uploading.
//! - [`PublishPlugin::update_setting`]: change one setting and persist it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use crate::config::PublishConfig;
use crate::contract::{Connector, DocumentHost, HostComponent, ObjectStore, SettingsStore};
use crate::dispatcher::{self, PublishOutcome, PublishReport};
use crate::document::Document;
use crate::error::PublishError;
use crate::selector::{decide_on, PublishDecision};
use crate::settings::{self, SettingField};

/// A document together with what the selector decided for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDocument {
    pub document: Document,
    pub decision: PublishDecision,
}

pub struct PublishPlugin<H, S> {
    host: H,
    settings: S,
    connector: Box<dyn Connector>,
    config: PublishConfig,
    config_loaded: bool,
    store: Option<Arc<dyn ObjectStore>>,
}

impl<H, S> PublishPlugin<H, S>
where
    H: DocumentHost,
    S: SettingsStore,
{
    pub fn new(host: H, settings: S, connector: Box<dyn Connector>) -> Self {
        PublishPlugin {
            host,
            settings,
            connector,
            config: PublishConfig::default(),
            config_loaded: false,
            store: None,
        }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.store.is_some()
    }

    /// Replaces the in-memory settings with the persisted ones.
    pub async fn reload_config(&mut self) -> Result<&PublishConfig, PublishError> {
        self.config = self.read_config().await?;
        self.config_loaded = true;
        Ok(&self.config)
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStore>, PublishError> {
        self.store.as_ref().ok_or(PublishError::NotStarted)
    }

    /// Publishes the focused document. Returns `Ok(None)` when nothing is
    /// focused.
    pub async fn publish_active(&self) -> Result<Option<PublishOutcome>, PublishError> {
        let store = self.store()?;
        let document = match self.host.active_document().await {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!("No active document, nothing to publish");
                return Ok(None);
            }
            Err(e) => {
                error!(error = %e, "Failed to resolve the active document");
                return Err(PublishError::Host(e.to_string()));
            }
        };
        let outcome =
            dispatcher::publish_one(&document, &self.config, &self.host, &**store).await;
        Ok(Some(outcome))
    }

    /// Publishes every document the host lists.
    pub async fn publish_all(&self) -> Result<PublishReport, PublishError> {
        let store = self.store()?;
        let documents = self.list_documents().await?;
        Ok(dispatcher::publish_all(&documents, &self.config, &self.host, &**store).await)
    }

    /// Runs the selector over every document without touching the store.
    pub async fn plan(&self) -> Result<Vec<PlannedDocument>, PublishError> {
        self.plan_on(Local::now().date_naive()).await
    }

    pub async fn plan_on(&self, date: NaiveDate) -> Result<Vec<PlannedDocument>, PublishError> {
        let documents = self.list_documents().await?;
        Ok(documents
            .into_iter()
            .map(|document| {
                let decision = decide_on(&document, &self.config, date);
                PlannedDocument { document, decision }
            })
            .collect())
    }

    /// Updates one setting and persists the whole record. A running plugin
    /// reconnects when a connection setting changes.
    pub async fn update_setting(
        &mut self,
        field: SettingField,
        value: &str,
    ) -> Result<(), PublishError> {
        if !self.config_loaded {
            self.reload_config().await?;
        }
        settings::update_setting(&mut self.config, field, value, &self.settings).await?;

        if self.is_started() && field.affects_connection() {
            self.store = Some(self.connector.connect(&self.config)?);
            debug!(field = %field, "Reconnected object store after settings change");
        }
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, PublishError> {
        self.host.list_documents().await.map_err(|e| {
            error!(error = %e, "Failed to list documents");
            PublishError::Host(e.to_string())
        })
    }
}

#[async_trait]
impl<H, S> HostComponent for PublishPlugin<H, S>
where
    H: DocumentHost,
    S: SettingsStore,
{
    async fn start(&mut self) -> Result<(), PublishError> {
        self.reload_config().await?;
        let store = self.connector.connect(&self.config).map_err(|e| {
            error!(error = %e, "Failed to connect object store");
            e
        })?;
        self.store = Some(store);
        info!(endpoint = %self.config.endpoint, bucket = %self.config.bucket, "Publisher started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PublishError> {
        self.store = None;
        info!("Publisher stopped");
        Ok(())
    }

    async fn read_config(&self) -> Result<PublishConfig, PublishError> {
        let config = self.settings.load().await?.unwrap_or_default();
        config.trace_loaded();
        Ok(config)
    }

    async fn write_config(&self) -> Result<(), PublishError> {
        self.settings.save(&self.config).await
    }
}
