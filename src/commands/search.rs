//! Search, question answering and query history commands

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{format_relative_now, format_score, truncate, ScoreTier};
use crate::listing::{scope_document_ids, DocumentFilter};
use crate::models::{
    Page, QueryHistoryItem, QueryHistoryQuery, QueryType, QuestionInput, QuestionResponse,
    SearchInput, SearchResponse,
};
use chrono::Utc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub filter: DocumentFilter,
    pub model: Option<String>,
}

/// Document ids the request should be limited to, resolved from the filter
async fn scope(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
    filter: &DocumentFilter,
) -> Result<Option<Vec<String>>> {
    if !filter.is_active() {
        return Ok(None);
    }
    let docs = client
        .list_all_documents(workspace_id, config.display.page_size)
        .await?;
    let ids = scope_document_ids(&docs, filter, Utc::now());
    match &ids {
        Some(ids) => debug!("Scoping request to {} documents", ids.len()),
        None => debug!("No documents match the filter, searching everything"),
    }
    Ok(ids)
}

fn require_text(text: &str, field: &'static str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Validation(format!("  {}: must not be empty", field)));
    }
    Ok(text.to_string())
}

pub async fn cmd_search(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<SearchResponse> {
    let query = require_text(query, "query")?;
    info!("Searching workspace {} for {:?}", workspace_id, query);

    let input = SearchInput {
        query,
        limit: Some(options.limit.unwrap_or(config.display.search_limit)),
        document_ids: scope(client, config, workspace_id, &options.filter).await?,
    };
    client.search(workspace_id, &input).await
}

pub async fn cmd_ask(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
    question: &str,
    options: &SearchOptions,
) -> Result<QuestionResponse> {
    let question = require_text(question, "question")?;
    let input = QuestionInput {
        question,
        limit: options.limit,
        document_ids: scope(client, config, workspace_id, &options.filter).await?,
        model: options.model.clone(),
    };
    client.ask(workspace_id, &input).await
}

pub async fn cmd_query_history(
    client: &ApiClient,
    workspace_id: &str,
    query_type: Option<QueryType>,
    page: u32,
    limit: u32,
) -> Result<Page<QueryHistoryItem>> {
    client
        .query_history(
            workspace_id,
            &QueryHistoryQuery {
                page: Some(page),
                limit: Some(limit),
                query_type,
            },
        )
        .await
}

fn tier_label(score: f64) -> &'static str {
    match ScoreTier::from_score(score) {
        ScoreTier::High => "high",
        ScoreTier::Good => "good",
        ScoreTier::Fair => "fair",
        ScoreTier::Low => "low",
    }
}

pub fn print_search_results(response: &SearchResponse) {
    println!("\n🔍 Results for \"{}\"\n", response.query);

    if response.results.is_empty() {
        println!("No documents found matching your search criteria.");
        return;
    }

    for (i, result) in response.results.iter().enumerate() {
        println!(
            "{}. {} ({} match, {})",
            i + 1,
            result.document_name,
            tier_label(result.score),
            format_score(result.score)
        );
        let mut location = Vec::new();
        if let Some(page) = result.page_number {
            location.push(format!("page {}", page));
        }
        if let Some(section) = &result.section_title {
            location.push(section.clone());
        }
        if !location.is_empty() {
            println!("   {}", location.join(" · "));
        }
        println!("   {}", truncate(&result.content, 200));
        println!();
    }

    let plural = if response.total == 1 { "" } else { "s" };
    println!("Found {} result{}.", response.total, plural);
    if let Some(time) = response.metadata.as_ref().and_then(|m| m.search_time) {
        println!("Search took {:.0}ms", time);
    }
}

pub fn print_answer(response: &QuestionResponse) {
    println!("\n💬 {}\n", response.query);
    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!("\nSources:");
        for (i, source) in response.sources.iter().enumerate() {
            match source.page_number {
                Some(page) => println!("  [{}] {} (page {})", i + 1, source.document_name, page),
                None => println!("  [{}] {}", i + 1, source.document_name),
            }
        }
    }

    if let Some(meta) = &response.metadata {
        let mut parts = Vec::new();
        if let Some(model) = &meta.model {
            parts.push(model.clone());
        }
        if let Some(tokens) = meta.tokens_used {
            parts.push(format!("{} tokens", tokens));
        }
        if let Some(time) = meta.response_time {
            parts.push(format!("{:.0}ms", time));
        }
        if !parts.is_empty() {
            println!("\n{}", parts.join(" · "));
        }
    }
}

pub fn print_query_history(page: &Page<QueryHistoryItem>) {
    println!("\n🕘 Query history\n");

    if page.items.is_empty() {
        println!("No queries yet.");
        return;
    }

    for item in &page.items {
        println!(
            "• [{}] {} ({})",
            item.query_type.label(),
            truncate(&item.query, 80),
            format_relative_now(Some(&item.created_at))
        );
        println!("  {} result(s)", item.result_count);
        if let Some(answer) = &item.ai_response {
            println!("  {}", truncate(answer, 120));
        }
    }

    if let Some(meta) = &page.meta {
        println!("\nPage {} of {} ({} total)", meta.page, meta.total_pages, meta.total);
    }
}
