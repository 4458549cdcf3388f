//! Direct-to-storage document upload.
//!
//! Each file goes through three calls: a presigned URL from the API, a PUT of
//! the raw bytes to object storage, and registration of the document record.
//! A failing file is reported and the batch moves on.

use crate::api::ApiClient;
use crate::cache::{Tag, TagKind};
use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::models::{CreateDocumentInput, Document, DocumentType};
use crate::progress::{advance, upload_bar, UploadStage};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest file accepted for upload
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

const ACCEPTED_MIME_TYPES: [&str; 10] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.ms-powerpoint",
    "text/plain",
    "text/markdown",
    "text/csv",
];

/// Content type sent with the upload, guessed from the file name
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Reason a file cannot be uploaded, if any
pub fn check_file(file_name: &str, size: u64, content_type: &str) -> Option<String> {
    if size > MAX_FILE_SIZE {
        return Some(format!(
            "File size exceeds {}MB limit",
            MAX_FILE_SIZE / 1024 / 1024
        ));
    }
    let known_type = DocumentType::from_file_name(file_name) != DocumentType::Other;
    if !known_type && !ACCEPTED_MIME_TYPES.contains(&content_type) {
        return Some("File type not supported".to_string());
    }
    None
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.document.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

pub struct Uploader<'a> {
    client: &'a ApiClient,
    workspace_id: String,
    bucket: String,
    region: String,
    storage_timeout: Duration,
    show_progress: bool,
}

impl<'a> Uploader<'a> {
    pub fn new(client: &'a ApiClient, workspace_id: impl Into<String>, config: &UploadConfig) -> Self {
        Self {
            client,
            workspace_id: workspace_id.into(),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            storage_timeout: config.timeout(),
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Upload every path in order. Failures are collected, never propagated.
    pub async fn upload_all(&self, paths: &[PathBuf]) -> UploadReport {
        let mut report = UploadReport::default();

        for path in paths {
            let file = display_name(path);
            match self.upload_file(path).await {
                Ok(document) => {
                    info!("Uploaded {} as document {}", file, document.id);
                    report.outcomes.push(UploadOutcome {
                        file,
                        document: Some(document),
                        error: None,
                    });
                }
                Err(e) => {
                    warn!("Failed to upload {}: {}", file, e);
                    report.outcomes.push(UploadOutcome {
                        file,
                        document: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        self.client
            .cache()
            .invalidate(&[Tag::id(TagKind::Documents, self.workspace_id.as_str())]);
        report
    }

    pub async fn upload_file(&self, path: &Path) -> Result<Document> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Upload(format!("Invalid file name: {:?}", path)))?
            .to_string();
        let content_type = content_type_for(&file_name);

        let size = tokio::fs::metadata(path).await?.len();
        if let Some(reason) = check_file(&file_name, size, &content_type) {
            return Err(Error::Upload(format!("{}: {}", file_name, reason)));
        }
        let bytes = tokio::fs::read(path).await?;
        if let Some(reason) = check_file(&file_name, bytes.len() as u64, &content_type) {
            return Err(Error::Upload(format!("{}: {}", file_name, reason)));
        }

        let bar = upload_bar(&file_name, self.show_progress);
        let result = self.transfer(&file_name, &content_type, bytes, &bar).await;
        match &result {
            Ok(_) => bar.finish(),
            Err(_) => bar.abandon_with_message("failed"),
        }
        result
    }

    async fn transfer(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        bar: &indicatif::ProgressBar,
    ) -> Result<Document> {
        let size = bytes.len() as u64;
        let target = self
            .client
            .upload_url(&self.workspace_id, file_name, content_type)
            .await?;
        advance(bar, UploadStage::UrlIssued);

        // storage PUTs run under their own timeout, not the API client's
        debug!("PUT {} bytes to storage (timeout {:?})", size, self.storage_timeout);
        let response = self
            .client
            .http()
            .put(&target.upload_url)
            .timeout(self.storage_timeout)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Storage request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::Upload(format!(
                "Storage rejected the upload with status {}",
                response.status()
            )));
        }
        advance(bar, UploadStage::Stored);

        let input = CreateDocumentInput {
            name: file_name.to_string(),
            original_name: file_name.to_string(),
            doc_type: DocumentType::from_file_name(file_name),
            mime_type: content_type.to_string(),
            size,
            s3_key: target.s3_key,
            s3_bucket: self.bucket.clone(),
            s3_region: self.region.clone(),
            s3_url: None,
            thumbnail_url: None,
            metadata: None,
        };
        let document = self.client.create_document(&self.workspace_id, &input).await?;
        advance(bar, UploadStage::Registered);
        Ok(document)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::document_json;
    use crate::models::test_document;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upload_config() -> UploadConfig {
        UploadConfig {
            bucket: "docs-bucket".to_string(),
            region: "eu-west-1".to_string(),
            timeout_secs: 30,
        }
    }

    fn upload_url_json(server: &MockServer, name: &str) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "statusCode": 200,
            "message": "ok",
            "data": {
                "uploadUrl": format!("{}/storage/{}", server.uri(), name),
                "s3Key": name,
                "expiresIn": 60
            }
        })
    }

    #[test]
    fn test_check_file() {
        assert_eq!(check_file("a.pdf", 10, "application/pdf"), None);
        assert_eq!(check_file("notes.md", 10, "text/markdown"), None);
        assert_eq!(
            check_file("a.pdf", MAX_FILE_SIZE + 1, "application/pdf").as_deref(),
            Some("File size exceeds 100MB limit")
        );
        assert_eq!(
            check_file("a.zip", 10, "application/zip").as_deref(),
            Some("File type not supported")
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_batch_continues_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents/upload-url"))
            .and(query_param("fileName", "report.pdf"))
            .and(query_param("contentType", "application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "statusCode": 200,
                "message": "ok",
                "data": {
                    "uploadUrl": format!("{}/storage/ws-1/report.pdf", server.uri()),
                    "s3Key": "ws-1/report.pdf",
                    "expiresIn": 3600
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/storage/ws-1/report.pdf"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/workspaces/ws-1/documents"))
            .and(body_partial_json(serde_json::json!({
                "name": "report.pdf",
                "type": "PDF",
                "size": 11,
                "s3Key": "ws-1/report.pdf",
                "s3Bucket": "docs-bucket",
                "s3Region": "eu-west-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(document_json(&test_document("doc-9"))))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("report.pdf");
        std::fs::write(&good, b"hello world").unwrap();
        let missing = tmp.path().join("missing.pdf");

        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
        let uploader = Uploader::new(&client, "ws-1", &upload_config());
        let report = uploader.upload_all(&[missing, good]).await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].file, "missing.pdf");
        assert_eq!(report.outcomes[1].document.as_ref().unwrap().id, "doc-9");
    }

    #[tokio::test]
    async fn test_storage_rejection_skips_registration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents/upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "statusCode": 200,
                "message": "ok",
                "data": {
                    "uploadUrl": format!("{}/storage/x", server.uri()),
                    "s3Key": "x",
                    "expiresIn": 60
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, b"notes").unwrap();

        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
        let err = Uploader::new(&client, "ws-1", &upload_config())
            .upload_file(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        // sparse file: reported size is over the limit, no data on disk
        let tmp = TempDir::new().unwrap();
        let big = tmp.path().join("huge.pdf");
        std::fs::File::create(&big)
            .unwrap()
            .set_len(MAX_FILE_SIZE + 1)
            .unwrap();

        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
        let err = Uploader::new(&client, "ws-1", &upload_config())
            .upload_file(&big)
            .await
            .unwrap_err();
        match err {
            Error::Upload(message) => assert!(message.contains("exceeds 100MB limit")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_storage_put_outlives_api_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents/upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upload_url_json(&server, "slow.txt")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/storage/slow.txt"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/workspaces/ws-1/documents"))
            .respond_with(ResponseTemplate::new(201).set_body_json(document_json(&test_document("doc-slow"))))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("slow.txt");
        std::fs::write(&file, b"slow link").unwrap();

        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(1)).unwrap();
        let document = Uploader::new(&client, "ws-1", &upload_config())
            .upload_file(&file)
            .await
            .unwrap();
        assert_eq!(document.id, "doc-slow");
    }

    #[tokio::test]
    async fn test_storage_put_respects_upload_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents/upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upload_url_json(&server, "stuck.txt")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("stuck.txt");
        std::fs::write(&file, b"stuck").unwrap();

        let config = UploadConfig {
            timeout_secs: 1,
            ..upload_config()
        };
        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(30)).unwrap();
        let err = Uploader::new(&client, "ws-1", &config)
            .upload_file(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
    }
}
