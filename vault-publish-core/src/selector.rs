//! Publish selection and remote key derivation.
//!
//! [`decide_on`] is a pure function of a document's metadata, the active
//! [`PublishConfig`] and a calendar date. It performs no I/O and cannot fail.
//!
//! # Key layout
//!
//! ```text
//! [default_folder/][type/]<file name>
//! ```
//!
//! - A document is publishable only when `metadata[config.tag]` is the
//!   boolean `true`. Strings such as `"true"` and numbers do not count.
//! - `type`, when it is a string, becomes a directory prefix.
//! - The file name is the document's display name with each run of
//!   whitespace replaced by a single `-`. Nothing else is sanitised, so a
//!   name containing `/` adds directory levels to the key.
//!
//! # Dated posts
//!
//! Documents whose `type` is exactly `"blog"` ignore their own name and are
//! stored as `blog/YYYY-MM-D.md` for the date of the run (month zero-padded,
//! day not). Two blog documents published on the same day therefore map to
//! the same key and the later upload overwrites the earlier one.
//! [`crate::dispatcher::publish_all`] logs a warning when that happens within
//! a single run.

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, warn};

use crate::config::PublishConfig;
use crate::document::Document;

pub const CATEGORY_KEY: &str = "type";
pub const DATED_CATEGORY: &str = "blog";

/// Outcome of running the selector over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDecision {
    pub should_publish: bool,
    /// Destination key in the bucket; `Some` and non-empty exactly when
    /// `should_publish` is true.
    pub remote_key: Option<String>,
}

impl PublishDecision {
    pub fn skip() -> Self {
        PublishDecision {
            should_publish: false,
            remote_key: None,
        }
    }

    fn publish(remote_key: String) -> Self {
        PublishDecision {
            should_publish: true,
            remote_key: Some(remote_key),
        }
    }
}

/// Decides using today's local date for dated categories.
pub fn decide(document: &Document, config: &PublishConfig) -> PublishDecision {
    decide_on(document, config, Local::now().date_naive())
}

/// Decides whether `document` is published and where, as of `date`.
pub fn decide_on(document: &Document, config: &PublishConfig, date: NaiveDate) -> PublishDecision {
    if !is_publishable(document, &config.tag) {
        return PublishDecision::skip();
    }

    let category = document
        .meta(CATEGORY_KEY)
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let file_name = if category == DATED_CATEGORY {
        dated_file_name(date)
    } else {
        sanitize_name(&document.name)
    };
    if file_name.is_empty() {
        warn!(path = %document.path, "Document has an empty name, cannot derive a remote key");
        return PublishDecision::skip();
    }

    let mut remote_key = folder_prefix(&config.default_folder);
    if !category.is_empty() {
        remote_key.push_str(category);
        remote_key.push('/');
    }
    remote_key.push_str(&file_name);

    debug!(path = %document.path, remote_key = %remote_key, "Document selected for publishing");
    PublishDecision::publish(remote_key)
}

/// True when the document's metadata holds the boolean `true` under `tag`.
pub fn is_publishable(document: &Document, tag: &str) -> bool {
    matches!(document.meta(tag).and_then(|v| v.as_bool()), Some(true))
}

/// Replaces each run of whitespace with a single hyphen.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// `YYYY-MM-D.md`: month padded to two digits, day unpadded.
pub fn dated_file_name(date: NaiveDate) -> String {
    format!("{}-{:02}-{}.md", date.year(), date.month(), date.day())
}

fn folder_prefix(default_folder: &str) -> String {
    let folder = default_folder.trim_matches('/');
    if folder.is_empty() {
        String::new()
    } else {
        format!("{folder}/")
    }
}
