use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_BUCKET: &str = "obsidian";
pub const DEFAULT_ENDPOINT: &str = "s3.eu-central-1.wasabisys.com";
pub const DEFAULT_TAG: &str = "published";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection and selection settings for a publish run.
///
/// This is the persisted settings record. It is serialised with camelCase
/// keys (`accessKey`, `defaultFolder`, ...) and every field falls back to its
/// default when missing from a stored blob, so older settings files keep
/// loading after new fields are added.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishConfig {
    pub access_key: String,
    pub secret: String,
    pub bucket: String,
    pub endpoint: String,
    /// Prefix applied to every remote key when non-empty.
    pub default_folder: String,
    /// Frontmatter key whose boolean `true` marks a document as publishable.
    pub tag: String,
    pub region: String,
    pub use_ssl: bool,
    pub path_style: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            access_key: String::new(),
            secret: String::new(),
            bucket: DEFAULT_BUCKET.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_folder: String::new(),
            tag: DEFAULT_TAG.to_string(),
            region: DEFAULT_REGION.to_string(),
            use_ssl: true,
            path_style: true,
        }
    }
}

impl std::fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishConfig")
            .field("access_key", &self.access_key)
            .field("secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("default_folder", &self.default_folder)
            .field("tag", &self.tag)
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            endpoint = %self.endpoint,
            bucket = %self.bucket,
            tag = %self.tag,
            default_folder = %self.default_folder,
            credentials_set = !self.access_key.is_empty() && !self.secret.is_empty(),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}
