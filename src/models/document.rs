//! Document records and their request shapes

use crate::error::{Error, Result};
use crate::status::{DocumentStatus, IngestionStatus, PipelineStep};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// File format of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Pdf,
    Docx,
    Doc,
    Xlsx,
    Xls,
    Pptx,
    Ppt,
    Txt,
    Md,
    Csv,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 11] = [
        DocumentType::Pdf,
        DocumentType::Docx,
        DocumentType::Doc,
        DocumentType::Xlsx,
        DocumentType::Xls,
        DocumentType::Pptx,
        DocumentType::Ppt,
        DocumentType::Txt,
        DocumentType::Md,
        DocumentType::Csv,
        DocumentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "PDF",
            DocumentType::Docx => "DOCX",
            DocumentType::Doc => "DOC",
            DocumentType::Xlsx => "XLSX",
            DocumentType::Xls => "XLS",
            DocumentType::Pptx => "PPTX",
            DocumentType::Ppt => "PPT",
            DocumentType::Txt => "TXT",
            DocumentType::Md => "MD",
            DocumentType::Csv => "CSV",
            DocumentType::Other => "OTHER",
        }
    }

    /// Type implied by a file name's extension, `Other` when unrecognised
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => DocumentType::Pdf,
            "docx" => DocumentType::Docx,
            "doc" => DocumentType::Doc,
            "xlsx" => DocumentType::Xlsx,
            "xls" => DocumentType::Xls,
            "pptx" => DocumentType::Pptx,
            "ppt" => DocumentType::Ppt,
            "txt" => DocumentType::Txt,
            "md" => DocumentType::Md,
            "csv" => DocumentType::Csv,
            _ => DocumentType::Other,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DocumentType::ALL
            .into_iter()
            .find(|doc_type| doc_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Other(format!("Unknown document type: {}", s)))
    }
}

/// A document as reported by the API.
///
/// Timestamps stay as the raw strings the backend sent so a malformed value
/// degrades at display time instead of rejecting the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub original_name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub mime_type: String,
    /// Byte count, serialized as a decimal string
    pub size: String,
    pub status: DocumentStatus,
    pub s3_key: String,
    pub s3_bucket: String,
    pub s3_region: String,
    #[serde(default)]
    pub s3_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub page_count: Option<u64>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub ingestion_status: IngestionStatus,
    #[serde(default)]
    pub ingestion_started_at: Option<String>,
    #[serde(default)]
    pub ingestion_completed_at: Option<String>,
    #[serde(default)]
    pub ingestion_error: Option<String>,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub embedding_count: u64,
    #[serde(default)]
    pub qdrant_collection_id: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Parsed byte size, `None` when the backend sent something non-numeric
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.trim().parse().ok()
    }

    /// Breaches of the record invariants the backend is expected to uphold.
    /// These are reported, never enforced: the record still renders.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.ingestion_error.is_some() && self.ingestion_status != IngestionStatus::Failed {
            violations.push(format!(
                "ingestionError is set while ingestionStatus is {}",
                self.ingestion_status
            ));
        }

        if self.ingestion_completed_at.is_some()
            && self.ingestion_status != IngestionStatus::Completed
        {
            violations.push(format!(
                "ingestionCompletedAt is set while ingestionStatus is {}",
                self.ingestion_status
            ));
        }

        if let Some(step) = self.ingestion_status.step() {
            if self.chunk_count > 0 && step < PipelineStep::Chunking {
                violations.push(format!(
                    "chunkCount is {} before chunking started",
                    self.chunk_count
                ));
            }
            if self.embedding_count > 0 && step < PipelineStep::Embedding {
                violations.push(format!(
                    "embeddingCount is {} before embedding started",
                    self.embedding_count
                ));
            }
        }

        violations
    }
}

/// Body for registering an uploaded file as a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentInput {
    pub name: String,
    pub original_name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub mime_type: String,
    pub size: u64,
    pub s3_key: String,
    pub s3_bucket: String,
    pub s3_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Query string for document listings; unset fields are omitted
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    #[serde(skip_serializing_if = "super::is_unset")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "super::is_unset")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "super::is_blank")]
    pub search: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_status: Option<IngestionStatus>,
}

impl DocumentQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }
}

/// Presigned destination for a direct-to-storage upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub upload_url: String,
    pub s3_key: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadUrlQuery<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_document;

    #[test]
    fn test_document_type_from_file_name() {
        assert_eq!(DocumentType::from_file_name("report.PDF"), DocumentType::Pdf);
        assert_eq!(DocumentType::from_file_name("notes.md"), DocumentType::Md);
        assert_eq!(DocumentType::from_file_name("a.b.xlsx"), DocumentType::Xlsx);
        assert_eq!(DocumentType::from_file_name("archive.zip"), DocumentType::Other);
        assert_eq!(DocumentType::from_file_name("README"), DocumentType::Other);
    }

    #[test]
    fn test_deserialize_wire_document() {
        let json = r#"{
            "id": "doc-1",
            "workspaceId": "ws-1",
            "name": "Handbook",
            "originalName": "handbook.pdf",
            "type": "PDF",
            "mimeType": "application/pdf",
            "size": "2048",
            "status": "PROCESSING",
            "s3Key": "ws-1/handbook.pdf",
            "s3Bucket": "docs",
            "s3Region": "us-east-1",
            "s3Url": null,
            "thumbnailUrl": null,
            "pageCount": 12,
            "wordCount": null,
            "language": "en",
            "metadata": {"source": "upload"},
            "ingestionStatus": "EMBEDDING",
            "ingestionStartedAt": "2024-05-01T10:00:00.000Z",
            "ingestionCompletedAt": null,
            "ingestionError": null,
            "chunkCount": 40,
            "embeddingCount": 10,
            "qdrantCollectionId": null,
            "uploadedAt": "2024-05-01T09:59:00.000Z",
            "processedAt": null,
            "createdAt": "2024-05-01T09:58:00.000Z",
            "updatedAt": "2024-05-01T10:01:00.000Z"
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.doc_type, DocumentType::Pdf);
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert_eq!(doc.ingestion_status, IngestionStatus::Embedding);
        assert_eq!(doc.size_bytes(), Some(2048));
        assert_eq!(doc.page_count, Some(12));
        assert!(doc.invariant_violations().is_empty());
    }

    #[test]
    fn test_invalid_timestamp_still_loads() {
        let mut doc = test_document("doc-1");
        doc.uploaded_at = Some("yesterday-ish".to_string());
        let json = serde_json::to_string(&doc).unwrap();
        let loaded: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.uploaded_at.as_deref(), Some("yesterday-ish"));
    }

    #[test]
    fn test_invariant_violations() {
        let mut doc = test_document("doc-1");
        doc.ingestion_status = IngestionStatus::Parsing;
        doc.ingestion_error = Some("boom".to_string());
        doc.ingestion_completed_at = Some("2024-01-01T00:00:00Z".to_string());
        doc.chunk_count = 4;

        let violations = doc.invariant_violations();
        assert_eq!(violations.len(), 3);
        assert!(violations[0].contains("ingestionError"));
    }

    #[test]
    fn test_document_query_omits_unset_fields() {
        let query = DocumentQuery {
            page: Some(0),
            limit: Some(50),
            search: Some("  ".to_string()),
            status: Some(DocumentStatus::Processed),
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"limit": 50, "status": "PROCESSED"})
        );
    }
}
