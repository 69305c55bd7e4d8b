//! Publish dispatcher: selector in, one `put` per selected document out.
//!
//! [`publish_one`] runs the selector over a single document and, if it is
//! selected, reads its content from the [`DocumentHost`] and issues exactly
//! one [`ObjectStore::put`] into the configured bucket.
//!
//! [`publish_all`] does the same for every document of a collection. All
//! read-then-store chains are started together and driven concurrently, so
//! their completions interleave in any order. There is no concurrency limit,
//! no retry and no cancellation.
//!
//! # Error Handling
//! Failures are local to one document. A failed content read or a rejected
//! upload is logged with its cause and recorded in the returned outcome; the
//! other documents are unaffected. Nothing is propagated to the caller as an
//! `Err`.
//!
//! The returned [`PublishOutcome`]s and [`PublishReport`] are observational
//! only.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::PublishConfig;
use crate::contract::{DocumentHost, ObjectStore};
use crate::document::Document;
use crate::selector::{decide_on, PublishDecision};

/// Where a publish attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    ReadContent,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Not selected; nothing was read or stored.
    Skipped,
    Uploaded {
        remote_key: String,
    },
    Failed {
        remote_key: String,
        stage: FailureStage,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: String,
    pub outcome: PublishOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub documents: Vec<DocumentReport>,
}

impl PublishReport {
    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Uploaded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&PublishOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

pub async fn publish_one<H, S>(
    document: &Document,
    config: &PublishConfig,
    host: &H,
    store: &S,
) -> PublishOutcome
where
    H: DocumentHost + ?Sized,
    S: ObjectStore + ?Sized,
{
    publish_one_on(document, config, host, store, Local::now().date_naive()).await
}

/// [`publish_one`] with the date used for dated categories made explicit.
pub async fn publish_one_on<H, S>(
    document: &Document,
    config: &PublishConfig,
    host: &H,
    store: &S,
    date: NaiveDate,
) -> PublishOutcome
where
    H: DocumentHost + ?Sized,
    S: ObjectStore + ?Sized,
{
    match decide_on(document, config, date).remote_key {
        Some(remote_key) => upload(document, remote_key, config, host, store).await,
        None => PublishOutcome::Skipped,
    }
}

pub async fn publish_all<H, S>(
    documents: &[Document],
    config: &PublishConfig,
    host: &H,
    store: &S,
) -> PublishReport
where
    H: DocumentHost + ?Sized,
    S: ObjectStore + ?Sized,
{
    publish_all_on(documents, config, host, store, Local::now().date_naive()).await
}

/// [`publish_all`] with the date used for dated categories made explicit.
pub async fn publish_all_on<H, S>(
    documents: &[Document],
    config: &PublishConfig,
    host: &H,
    store: &S,
    date: NaiveDate,
) -> PublishReport
where
    H: DocumentHost + ?Sized,
    S: ObjectStore + ?Sized,
{
    let decisions: Vec<(&Document, PublishDecision)> = documents
        .iter()
        .map(|doc| (doc, decide_on(doc, config, date)))
        .collect();
    warn_on_collisions(&decisions);

    info!(
        documents = documents.len(),
        selected = decisions.iter().filter(|(_, d)| d.should_publish).count(),
        bucket = %config.bucket,
        "Publishing documents"
    );

    let chains = decisions.into_iter().map(|(doc, decision)| async move {
        let outcome = match decision.remote_key {
            Some(remote_key) => upload(doc, remote_key, config, host, store).await,
            None => PublishOutcome::Skipped,
        };
        DocumentReport {
            path: doc.path.clone(),
            outcome,
        }
    });

    let report = PublishReport {
        documents: join_all(chains).await,
    };
    info!(
        uploaded = report.uploaded(),
        failed = report.failed(),
        skipped = report.skipped(),
        "Publish run finished"
    );
    report
}

async fn upload<H, S>(
    document: &Document,
    remote_key: String,
    config: &PublishConfig,
    host: &H,
    store: &S,
) -> PublishOutcome
where
    H: DocumentHost + ?Sized,
    S: ObjectStore + ?Sized,
{
    let content = match host.read_content(document).await {
        Ok(content) => content,
        Err(e) => {
            error!(path = %document.path, remote_key = %remote_key, error = %e, "Failed to read document content");
            return PublishOutcome::Failed {
                remote_key,
                stage: FailureStage::ReadContent,
                error: e.to_string(),
            };
        }
    };

    match store.put(&config.bucket, &remote_key, content.as_bytes()).await {
        Ok(()) => {
            info!(path = %document.path, remote_key = %remote_key, bucket = %config.bucket, "Published document");
            PublishOutcome::Uploaded { remote_key }
        }
        Err(e) => {
            error!(path = %document.path, remote_key = %remote_key, bucket = %config.bucket, error = %e, "Failed to publish document");
            PublishOutcome::Failed {
                remote_key,
                stage: FailureStage::Store,
                error: e.to_string(),
            }
        }
    }
}

fn warn_on_collisions(decisions: &[(&Document, PublishDecision)]) {
    let mut by_key: HashMap<&str, Vec<&str>> = HashMap::new();
    for (doc, decision) in decisions {
        if let Some(key) = decision.remote_key.as_deref() {
            by_key.entry(key).or_default().push(&doc.path);
        }
    }
    for (key, paths) in by_key {
        if paths.len() > 1 {
            warn!(remote_key = key, ?paths, "Several documents map to the same remote key, the last upload wins");
        }
    }
}
