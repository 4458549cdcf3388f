//! Data shapes exchanged with the document API

pub mod document;
pub mod search;
pub mod user;
pub mod workspace;

pub use document::*;
pub use search::*;
pub use user::*;
pub use workspace::*;

use serde::{Deserialize, Serialize};

/// Envelope wrapping every API response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    pub data: T,
    #[serde(default)]
    pub meta: Option<PaginationMeta>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Option<PaginationMeta>,
}

impl<T> Page<T> {
    pub fn total(&self) -> u64 {
        self.meta
            .as_ref()
            .map(|meta| meta.total)
            .unwrap_or(self.items.len() as u64)
    }
}

/// Page numbers and limits of zero are treated as absent
pub(crate) fn is_unset(value: &Option<u32>) -> bool {
    matches!(value, None | Some(0))
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

pub(crate) fn is_empty_ids(value: &Option<Vec<String>>) -> bool {
    value.as_ref().map_or(true, |ids| ids.is_empty())
}

pub(crate) fn display_name(first: Option<&str>, last: Option<&str>, email: &str) -> String {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        email.to_string()
    } else {
        name
    }
}

#[cfg(test)]
pub(crate) fn test_document(id: &str) -> Document {
    use crate::status::{DocumentStatus, IngestionStatus};

    Document {
        id: id.to_string(),
        workspace_id: "ws-1".to_string(),
        name: format!("{}.pdf", id),
        original_name: format!("{}.pdf", id),
        doc_type: DocumentType::Pdf,
        mime_type: "application/pdf".to_string(),
        size: "1024".to_string(),
        status: DocumentStatus::Uploaded,
        s3_key: format!("ws-1/{}.pdf", id),
        s3_bucket: "default-bucket".to_string(),
        s3_region: "us-east-1".to_string(),
        s3_url: None,
        thumbnail_url: None,
        page_count: None,
        word_count: None,
        language: None,
        metadata: None,
        ingestion_status: IngestionStatus::Pending,
        ingestion_started_at: None,
        ingestion_completed_at: None,
        ingestion_error: None,
        chunk_count: 0,
        embedding_count: 0,
        qdrant_collection_id: None,
        uploaded_at: Some("2024-01-01T00:00:00Z".to_string()),
        processed_at: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_meta() {
        let json = r#"{
            "success": true,
            "statusCode": 200,
            "message": "ok",
            "data": [],
            "meta": {"page": 1, "limit": 10, "total": 42, "totalPages": 5, "hasNextPage": true, "hasPrevPage": false}
        }"#;
        let response: ApiResponse<Vec<Workspace>> = serde_json::from_str(json).unwrap();
        let page = Page {
            items: response.data,
            meta: response.meta,
        };
        assert_eq!(page.total(), 42);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Some("Ada"), Some("Lovelace"), "a@x.io"), "Ada Lovelace");
        assert_eq!(display_name(Some(" "), None, "a@x.io"), "a@x.io");
        assert_eq!(display_name(None, Some("Hopper"), "g@x.io"), "Hopper");
    }
}
