#![doc = "vault-publish-core: core logic library for vault-publish."]

//! This crate contains the data model, selection logic and publish pipeline
//! for vault-publish, plus the filesystem and JSON adapters a command-line
//! host needs. The S3 client lives in the `vault-publish` binary crate.
//!
//! # Usage
//! - [`selector`] decides per document whether it is published and under which key.
//! - [`dispatcher`] issues one upload per selected document.
//! - [`plugin::PublishPlugin`] wires both to a host through the traits in [`contract`].

pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod plugin;
pub mod selector;
pub mod settings;
pub mod vault;

pub use config::PublishConfig;
pub use document::{Document, MetaValue, Metadata};
pub use error::PublishError;
pub use selector::{decide, decide_on, PublishDecision};
