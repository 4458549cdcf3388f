//! Document commands

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{format_absolute, format_relative_now, format_size_str, truncate};
use crate::listing::{sort_documents, DocumentFilter, DocumentSort};
use crate::models::{Document, UpdateDocumentInput};
use crate::progress::watch_spinner;
use crate::refresh::schedule_refresh;
use crate::status::{timeline, PipelineProgress, TimelineEntry};
use crate::upload::{UploadReport, Uploader};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: DocumentFilter,
    pub sort: DocumentSort,
    pub descending: bool,
    pub limit: Option<usize>,
}

/// List a workspace's documents, filtered and sorted locally
pub async fn cmd_list_documents(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
    options: &ListOptions,
) -> Result<Vec<Document>> {
    info!("Listing documents in workspace {}", workspace_id);

    let all = client
        .list_all_documents(workspace_id, config.display.page_size)
        .await?;
    let mut selected = options.filter.apply(&all, Utc::now());
    sort_documents(&mut selected, options.sort, options.descending);
    if let Some(limit) = options.limit {
        selected.truncate(limit);
    }
    Ok(selected.into_iter().cloned().collect())
}

/// A document with its derived processing timeline
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    pub document: Document,
    pub progress: PipelineProgress,
    pub timeline: Vec<TimelineEntry>,
}

impl From<Document> for DocumentDetail {
    fn from(document: Document) -> Self {
        let progress = PipelineProgress::from_document(&document);
        Self {
            timeline: timeline(&progress),
            progress,
            document,
        }
    }
}

pub async fn cmd_show_document(client: &ApiClient, id: &str) -> Result<DocumentDetail> {
    Ok(client.get_document(id).await?.into())
}

/// Poll a document until ingestion completes or fails
pub async fn cmd_watch_document(
    client: &ApiClient,
    id: &str,
    interval: Duration,
    show_progress: bool,
) -> Result<DocumentDetail> {
    let spinner = watch_spinner(&format!("Waiting for {}", id), show_progress);
    let mut detail: DocumentDetail = client.refetch_document(id).await?.into();

    while detail.progress.is_running() {
        spinner.set_message(format!(
            "{}: {}",
            detail.document.name,
            detail.document.ingestion_status.label()
        ));
        tokio::time::sleep(interval).await;
        detail = client.refetch_document(id).await?.into();
    }

    spinner.finish_and_clear();
    Ok(detail)
}

pub async fn cmd_upload_documents(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
    paths: &[PathBuf],
    show_progress: bool,
) -> Result<UploadReport> {
    if paths.is_empty() {
        return Err(Error::Upload("No files given".to_string()));
    }
    let report = Uploader::new(client, workspace_id, &config.upload)
        .show_progress(show_progress)
        .upload_all(paths)
        .await;
    Ok(report)
}

pub async fn cmd_rename_document(client: &ApiClient, id: &str, name: &str) -> Result<Document> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("  name: Name is required".to_string()));
    }
    client
        .update_document(
            id,
            &UpdateDocumentInput {
                name: Some(name.to_string()),
                metadata: None,
            },
        )
        .await
}

pub async fn cmd_delete_document(client: &ApiClient, id: &str) -> Result<()> {
    client.delete_document(id).await
}

/// Request a reindex and read the document back once after `delay`. The
/// status returned may still predate the reindex.
pub async fn cmd_reindex_document(
    client: Arc<ApiClient>,
    id: &str,
    delay: Duration,
) -> Result<DocumentDetail> {
    client.reindex_document(id).await?;
    let document = schedule_refresh(client, id, delay).await??;
    Ok(document.into())
}

pub fn print_documents(documents: &[Document]) {
    println!("\n📄 Documents\n");

    if documents.is_empty() {
        println!("No documents found. Use 'lectern documents upload' to add some.");
        return;
    }

    for doc in documents {
        println!("• {} [{}]", truncate(&doc.name, 60), doc.doc_type);
        println!("  ID: {}", doc.id);
        println!(
            "  Status: {} · Ingestion: {}",
            doc.status.label(),
            doc.ingestion_status.label()
        );
        println!(
            "  Size: {} · Uploaded {}",
            format_size_str(&doc.size),
            format_relative_now(doc.uploaded_at.as_deref())
        );
    }
    println!("\n{} document(s)", documents.len());
}

pub fn print_document_detail(detail: &DocumentDetail) {
    let doc = &detail.document;
    println!("\n📄 {}\n", doc.name);
    println!("ID: {}", doc.id);
    println!("Original name: {}", doc.original_name);
    println!("Type: {} ({})", doc.doc_type, doc.mime_type);
    println!("Size: {}", format_size_str(&doc.size));
    println!("Status: {}", doc.status.label());
    if let Some(pages) = doc.page_count {
        println!("Pages: {}", pages);
    }
    if let Some(language) = &doc.language {
        println!("Language: {}", language);
    }
    println!("Created: {}", format_absolute(Some(&doc.created_at)));
    println!("Uploaded: {}", format_relative_now(doc.uploaded_at.as_deref()));
    println!("Processed: {}", format_relative_now(doc.processed_at.as_deref()));

    println!("\nProcessing: {}", doc.ingestion_status.label());
    for entry in &detail.timeline {
        println!(
            "  {} {:<22} {}",
            entry.state.symbol(),
            entry.label,
            entry.state.label()
        );
    }
    println!(
        "\nChunks: {} · Embeddings: {}",
        doc.chunk_count, doc.embedding_count
    );
    println!(
        "Ingestion started: {}",
        format_relative_now(doc.ingestion_started_at.as_deref())
    );
    if let Some(error) = &doc.ingestion_error {
        println!("\n✗ Error: {}", error);
    }
}

pub fn print_upload_report(report: &UploadReport) {
    for outcome in &report.outcomes {
        match (&outcome.document, &outcome.error) {
            (Some(doc), _) => println!("✓ {} uploaded ({})", outcome.file, doc.id),
            (None, Some(error)) => println!("✗ {} failed: {}", outcome.file, error),
            (None, None) => {}
        }
    }
    println!(
        "\n{} uploaded, {} failed",
        report.succeeded(),
        report.failed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_document;
    use crate::status::{IngestionStatus, PipelineStep, StepState};

    #[test]
    fn test_detail_for_failed_document() {
        let mut doc = test_document("doc-1");
        doc.ingestion_status = IngestionStatus::Failed;
        doc.ingestion_error = Some("embedding model unavailable".to_string());
        doc.chunk_count = 12;

        let detail = DocumentDetail::from(doc);
        assert!(detail.progress.failed);
        assert_eq!(detail.progress.last_active_step, PipelineStep::Embedding);
        assert_eq!(detail.timeline.len(), 6);
        assert_eq!(detail.timeline[3].state, StepState::Failed);
        assert_eq!(detail.timeline[2].state, StepState::Completed);
        assert_eq!(detail.timeline[4].state, StepState::Pending);
    }
}
