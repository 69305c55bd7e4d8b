//! # contract: interfaces the publisher needs from the outside world
//!
//! The publisher owns no I/O of its own. Everything it touches is reached
//! through the traits in this module:
//!
//! - [`ObjectStore`]: stores bytes under a key in a bucket (the S3 client).
//! - [`DocumentHost`]: the document environment (enumerating documents,
//!   frontmatter lookup, content reads, the focused document).
//! - [`SettingsStore`]: loads and saves the persisted [`PublishConfig`].
//! - [`Connector`]: builds an [`ObjectStore`] from connection settings.
//! - [`HostComponent`]: the lifecycle a host drives the publisher through.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so consumers can generate
//!   deterministic mocks for unit/integration tests (exported under the
//!   `test-export-mocks` feature).

use std::sync::Arc;

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::PublishConfig;
use crate::document::{Document, Metadata};
use crate::error::{HostError, PublishError, StoreError};

/// Remote object storage. One operation: put `content` at `key` in `bucket`.
///
/// Implementations resolve once the object is stored and return the
/// transport or auth error otherwise. They must not retry on their own.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<(), StoreError>;
}

/// The document environment the publisher runs inside.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// All markdown documents of interest, each with freshly parsed metadata,
    /// in the host's natural order.
    async fn list_documents(&self) -> Result<Vec<Document>, HostError>;

    /// The most recently parsed frontmatter of `document`.
    async fn metadata(&self, document: &Document) -> Result<Option<Metadata>, HostError>;

    /// Full text of `document`.
    async fn read_content(&self, document: &Document) -> Result<String, HostError>;

    /// The document currently in focus, if any.
    async fn active_document(&self) -> Result<Option<Document>, HostError>;
}

/// Persistence for the settings record.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<PublishConfig>, PublishError>;

    async fn save(&self, config: &PublishConfig) -> Result<(), PublishError>;
}

/// Builds the object store client for a given configuration.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Connector: Send + Sync {
    fn connect(&self, config: &PublishConfig) -> Result<Arc<dyn ObjectStore>, PublishError>;
}

/// Lifecycle a host drives a publishing component through.
#[async_trait]
pub trait HostComponent: Send + Sync {
    /// Load settings and get ready to serve commands.
    async fn start(&mut self) -> Result<(), PublishError>;

    /// Release anything acquired in `start`.
    async fn stop(&mut self) -> Result<(), PublishError>;

    /// Read the persisted settings, with defaults for anything missing.
    async fn read_config(&self) -> Result<PublishConfig, PublishError>;

    /// Persist the current settings.
    async fn write_config(&self) -> Result<(), PublishError>;
}
