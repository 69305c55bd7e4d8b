#![doc = "S3 integration for the CLI: bridges the core ObjectStore trait to an S3-compatible endpoint."]
//
//! # S3 client (CLI <-> Core)
//!
//! This module wires the [`ObjectStore`] trait from `vault-publish-core` to a
//! real S3-compatible service through `rust-s3`.
//!
//! - [`S3Client`] is built from a [`PublishConfig`]: endpoint, credentials,
//!   region, TLS and path-style addressing.
//! - [`S3Connector`] is the [`Connector`] handed to the publish plugin, so the
//!   client is rebuilt whenever connection settings change.
//! - Objects are written with content type `text/markdown`. rust-s3 is built
//!   with `fail-on-err`, so any non-2xx response comes back as an error.

use std::sync::Arc;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;

use vault_publish_core::contract::{Connector, ObjectStore};
use vault_publish_core::error::StoreError;
use vault_publish_core::{PublishConfig, PublishError};

pub const CONTENT_TYPE: &str = "text/markdown";

pub struct S3Client {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl S3Client {
    pub fn from_config(config: &PublishConfig) -> Result<Self, PublishError> {
        if config.access_key.is_empty() || config.secret.is_empty() {
            tracing::error!("S3 access key or secret missing from settings");
            return Err(PublishError::Connect(
                "access key and secret must both be set".into(),
            ));
        }
        if config.endpoint.trim().is_empty() {
            tracing::error!("S3 endpoint missing from settings");
            return Err(PublishError::Connect("endpoint must be set".into()));
        }

        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to build S3 credentials");
            PublishError::Connect(format!("invalid credentials: {e}"))
        })?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint_url(&config.endpoint, config.use_ssl),
        };

        tracing::info!(
            endpoint = %config.endpoint,
            region = %config.region,
            use_ssl = config.use_ssl,
            path_style = config.path_style,
            "Initialised S3 client from settings"
        );
        Ok(S3Client {
            region,
            credentials,
            path_style: config.path_style,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StoreError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

/// Prefixes the scheme unless the endpoint already carries one.
pub fn endpoint_url(endpoint: &str, use_ssl: bool) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{endpoint}")
    } else {
        format!("http://{endpoint}")
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        tracing::info!(bucket, key, size = content.len(), "Uploading object");
        let response = self
            .bucket(bucket)?
            .put_object_with_content_type(key, content, CONTENT_TYPE)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, bucket, key, "S3 error uploading object");
                e
            })?;
        tracing::debug!(status = response.status_code(), bucket, key, "Object stored");
        Ok(())
    }
}

/// Builds an [`S3Client`] for the publish plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

impl Connector for S3Connector {
    fn connect(&self, config: &PublishConfig) -> Result<Arc<dyn ObjectStore>, PublishError> {
        Ok(Arc::new(S3Client::from_config(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_a_scheme() {
        assert_eq!(
            endpoint_url("s3.eu-central-1.wasabisys.com", true),
            "https://s3.eu-central-1.wasabisys.com"
        );
        assert_eq!(endpoint_url("localhost:9000/", false), "http://localhost:9000");
        assert_eq!(
            endpoint_url("http://minio.local:9000", true),
            "http://minio.local:9000"
        );
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let config = PublishConfig::default();
        assert!(matches!(
            S3Client::from_config(&config),
            Err(PublishError::Connect(_))
        ));
    }

    #[test]
    fn client_builds_from_complete_settings() {
        let config = PublishConfig {
            access_key: "AK".into(),
            secret: "SK".into(),
            ..PublishConfig::default()
        };
        let client = S3Client::from_config(&config).expect("client");
        assert!(client.path_style);
        assert!(client.bucket("obsidian").is_ok());
    }
}
