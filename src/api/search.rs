use super::{cache_key, into_page, ApiClient};
use crate::cache::{Tag, TagKind};
use crate::error::Result;
use crate::models::{
    Page, QueryHistoryItem, QueryHistoryQuery, QuestionInput, QuestionResponse, SearchInput,
    SearchResponse,
};
use reqwest::Method;
use tracing::debug;

fn search_tags(workspace_id: &str) -> [Tag; 2] {
    [Tag::id(TagKind::Search, workspace_id), Tag::all(TagKind::Search)]
}

impl ApiClient {
    /// Semantic search over the workspace's indexed chunks
    pub async fn search(&self, workspace_id: &str, input: &SearchInput) -> Result<SearchResponse> {
        let response = self
            .mutate::<SearchResponse, _>(
                Method::POST,
                &["workspaces", workspace_id, "search"],
                Some(input),
                &search_tags(workspace_id),
            )
            .await?;
        debug!("Search returned {} results", response.data.results.len());
        Ok(response.data)
    }

    /// Answer a question from the workspace's documents
    pub async fn ask(&self, workspace_id: &str, input: &QuestionInput) -> Result<QuestionResponse> {
        let response = self
            .mutate::<QuestionResponse, _>(
                Method::POST,
                &["workspaces", workspace_id, "question"],
                Some(input),
                &search_tags(workspace_id),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn query_history(
        &self,
        workspace_id: &str,
        query: &QueryHistoryQuery,
    ) -> Result<Page<QueryHistoryItem>> {
        let response = self
            .query::<Vec<QueryHistoryItem>, _>(
                cache_key(&format!("workspaces/{}/queries", workspace_id), query),
                vec![Tag::id(TagKind::Search, workspace_id)],
                &["workspaces", workspace_id, "queries"],
                Some(query),
            )
            .await?;
        Ok(into_page(response))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::list_json;
    use super::*;
    use crate::models::QueryType;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn history_item() -> QueryHistoryItem {
        QueryHistoryItem {
            id: "q-1".to_string(),
            query_type: QueryType::Search,
            query: "vacation policy".to_string(),
            result_count: 3,
            ai_response: None,
            ai_model: None,
            tokens_used: None,
            response_time: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_refreshes_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/workspaces/ws-1/queries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_json(&[history_item()])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/workspaces/ws-1/search"))
            .and(body_json(serde_json::json!({"query": "vacation policy", "limit": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "statusCode": 200,
                "message": "ok",
                "data": {
                    "results": [{
                        "chunkId": "c-1",
                        "documentId": "doc-1",
                        "documentName": "Handbook",
                        "content": "Employees get 25 days.",
                        "score": 0.91
                    }],
                    "total": 1,
                    "query": "vacation policy"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
        let history_query = QueryHistoryQuery::default();
        client.query_history("ws-1", &history_query).await.unwrap();
        client.query_history("ws-1", &history_query).await.unwrap();

        let response = client
            .search(
                "ws-1",
                &SearchInput {
                    query: "vacation policy".to_string(),
                    limit: Some(5),
                    document_ids: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.results[0].document_name, "Handbook");

        let history = client.query_history("ws-1", &history_query).await.unwrap();
        assert_eq!(history.items.len(), 1);
    }
}
