use super::{cache_key, into_page, ApiClient, Empty};
use crate::cache::{Tag, TagKind};
use crate::error::Result;
use crate::models::{
    CreateDocumentInput, Document, DocumentQuery, Page, UpdateDocumentInput, UploadUrl,
    UploadUrlQuery,
};
use reqwest::Method;
use tracing::{info, warn};

fn report_violations(doc: &Document) {
    for violation in doc.invariant_violations() {
        warn!("Document {} is inconsistent: {}", doc.id, violation);
    }
}

fn document_key(id: &str) -> String {
    format!("documents/{}", id)
}

impl ApiClient {
    /// Presigned URL for uploading `file_name` straight to object storage
    pub async fn upload_url(
        &self,
        workspace_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadUrl> {
        let request = self
            .request(
                Method::GET,
                &["workspaces", workspace_id, "documents", "upload-url"],
            )?
            .query(&UploadUrlQuery {
                file_name,
                content_type,
            });
        Ok(self.send::<UploadUrl>(request).await?.data)
    }

    pub async fn create_document(
        &self,
        workspace_id: &str,
        input: &CreateDocumentInput,
    ) -> Result<Document> {
        let response = self
            .mutate::<Document, _>(
                Method::POST,
                &["workspaces", workspace_id, "documents"],
                Some(input),
                &[
                    Tag::id(TagKind::Documents, workspace_id),
                    Tag::all(TagKind::Documents),
                ],
            )
            .await?;
        info!("Created document {} ({})", response.data.id, response.data.name);
        Ok(response.data)
    }

    pub async fn list_documents(
        &self,
        workspace_id: &str,
        query: &DocumentQuery,
    ) -> Result<Page<Document>> {
        let key = cache_key(&format!("workspaces/{}/documents", workspace_id), query);
        let response = self
            .query::<Vec<Document>, _>(
                key,
                vec![Tag::id(TagKind::Documents, workspace_id)],
                &["workspaces", workspace_id, "documents"],
                Some(query),
            )
            .await?;
        Ok(into_page(response))
    }

    /// Every document in the workspace, following pagination
    pub async fn list_all_documents(
        &self,
        workspace_id: &str,
        page_size: u32,
    ) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page = 1;
        loop {
            let result = self
                .list_documents(workspace_id, &DocumentQuery::page(page, page_size))
                .await?;
            let has_next = result
                .meta
                .as_ref()
                .map(|meta| meta.has_next_page)
                .unwrap_or(false);
            let received = result.items.len();
            documents.extend(result.items);
            if !has_next || received == 0 {
                break;
            }
            page += 1;
        }
        Ok(documents)
    }

    pub async fn get_document(&self, id: &str) -> Result<Document> {
        let response = self
            .query::<Document, ()>(
                document_key(id),
                vec![Tag::id(TagKind::Documents, id)],
                &["documents", id],
                None,
            )
            .await?;
        report_violations(&response.data);
        Ok(response.data)
    }

    /// Fetch a document bypassing the cache; the fresh copy replaces any
    /// cached one
    pub async fn refetch_document(&self, id: &str) -> Result<Document> {
        let response = self
            .fetch::<Document, ()>(
                document_key(id),
                vec![Tag::id(TagKind::Documents, id)],
                &["documents", id],
                None,
            )
            .await?;
        report_violations(&response.data);
        Ok(response.data)
    }

    pub async fn update_document(&self, id: &str, input: &UpdateDocumentInput) -> Result<Document> {
        let response = self
            .mutate::<Document, _>(
                Method::PATCH,
                &["documents", id],
                Some(input),
                &document_tags(id),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_document(&self, id: &str) -> Result<()> {
        self.mutate::<Empty, ()>(Method::DELETE, &["documents", id], None, &document_tags(id))
            .await?;
        info!("Deleted document {}", id);
        Ok(())
    }

    /// Ask the backend to run the ingestion pipeline again
    pub async fn reindex_document(&self, id: &str) -> Result<()> {
        self.mutate::<Empty, ()>(
            Method::POST,
            &["documents", id, "reindex"],
            None,
            &document_tags(id),
        )
        .await?;
        info!("Reindex requested for document {}", id);
        Ok(())
    }
}

fn document_tags(id: &str) -> [Tag; 2] {
    [Tag::id(TagKind::Documents, id), Tag::all(TagKind::Documents)]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::Error;
    use crate::models::test_document;
    use crate::status::DocumentStatus;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_document_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document_json(&test_document("doc-1"))))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get_document("doc-1").await.unwrap();
        let again = client.get_document("doc-1").await.unwrap();
        assert_eq!(again.id, "doc-1");
    }

    #[tokio::test]
    async fn test_reindex_invalidates_cached_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document_json(&test_document("doc-1"))))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/documents/doc-1/reindex"))
            .respond_with(ResponseTemplate::new(200).set_body_json(null_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get_document("doc-1").await.unwrap();
        client.reindex_document("doc-1").await.unwrap();
        client.get_document("doc-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_mutation_still_invalidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document_json(&test_document("doc-1"))))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/documents/doc-1"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "Forbidden"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get_document("doc-1").await.unwrap();
        let err = client.delete_document("doc-1").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 403, ref message } if message == "Forbidden"));
        client.get_document("doc-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_refetch_bypasses_and_refreshes_cache() {
        let server = MockServer::start().await;
        let mut processed = test_document("doc-1");
        processed.status = DocumentStatus::Processed;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document_json(&processed)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .cache()
            .insert("documents/doc-1", &document_json(&test_document("doc-1")), vec![]);

        let fresh = client.refetch_document("doc-1").await.unwrap();
        assert_eq!(fresh.status, DocumentStatus::Processed);
        let cached = client.get_document("doc-1").await.unwrap();
        assert_eq!(cached.status, DocumentStatus::Processed);
    }

    #[tokio::test]
    async fn test_list_documents_sends_query_and_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(list_json(&[test_document("a"), test_document("b")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let docs = client.list_all_documents("ws-1", 100).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "b");
    }

    #[tokio::test]
    async fn test_create_invalidates_workspace_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_json(&[test_document("a")])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/workspaces/ws-1/documents"))
            .respond_with(ResponseTemplate::new(201).set_body_json(document_json(&test_document("b"))))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = DocumentQuery::page(1, 10);
        client.list_documents("ws-1", &query).await.unwrap();
        client.list_documents("ws-1", &query).await.unwrap();

        let input = CreateDocumentInput {
            name: "b.pdf".to_string(),
            original_name: "b.pdf".to_string(),
            doc_type: crate::models::DocumentType::Pdf,
            mime_type: "application/pdf".to_string(),
            size: 10,
            s3_key: "ws-1/b.pdf".to_string(),
            s3_bucket: "default-bucket".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_url: None,
            thumbnail_url: None,
            metadata: None,
        };
        let created = client.create_document("ws-1", &input).await.unwrap();
        assert_eq!(created.id, "b");

        client.list_documents("ws-1", &query).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_document("doc-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_reindex_accepts_empty_accepted_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents/doc-1/reindex"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).reindex_document("doc-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_body_where_document_expected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_document("doc-1").await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(client.cache().is_empty());
    }
}
