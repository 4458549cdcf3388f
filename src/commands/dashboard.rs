//! Workspace overview and usage reporting

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::format::{format_file_size, format_relative_now, truncate};
use crate::listing::{DashboardStats, ProcessingSummary, UsageMetrics};
use crate::models::{QueryHistoryItem, QueryHistoryQuery, UserQuery};
use crate::usage::Usage;
use futures::future::try_join;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub workspace_id: String,
    pub stats: DashboardStats,
    pub processing: ProcessingSummary,
    pub recent_queries: Vec<QueryHistoryItem>,
}

pub async fn cmd_dashboard(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
) -> Result<DashboardReport> {
    info!("Building dashboard for workspace {}", workspace_id);

    let history_query = QueryHistoryQuery {
        page: Some(1),
        limit: Some(config.display.recent_queries),
        query_type: None,
    };
    let (documents, history) = try_join(
        client.list_all_documents(workspace_id, config.display.page_size),
        client.query_history(workspace_id, &history_query),
    )
    .await?;

    Ok(DashboardReport {
        workspace_id: workspace_id.to_string(),
        stats: DashboardStats::compute(&documents, &history.items),
        processing: ProcessingSummary::compute(&documents),
        recent_queries: history.items,
    })
}

/// Consumption against the configured limits
#[derive(Debug, Clone, Serialize)]
pub struct LimitsReport {
    pub workspace_id: String,
    pub documents: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Usage>,
    pub storage_bytes: u64,
}

pub async fn cmd_limits(client: &ApiClient, config: &Config, workspace_id: &str) -> Result<LimitsReport> {
    let documents = client
        .list_all_documents(workspace_id, config.display.page_size)
        .await?;
    let storage_bytes: u64 = documents
        .iter()
        .map(|doc| doc.size_bytes().unwrap_or(0))
        .sum();
    let near = config.limits.near_limit_percent;

    Ok(LimitsReport {
        workspace_id: workspace_id.to_string(),
        documents: Usage::with_threshold(
            documents.len() as u64,
            config.limits.document_limit,
            near,
        ),
        storage: config
            .limits
            .storage_limit_bytes
            .map(|limit| Usage::with_threshold(storage_bytes, limit, near)),
        storage_bytes,
    })
}

/// Administrative usage figures; needs permission to list users
pub async fn cmd_usage_metrics(
    client: &ApiClient,
    config: &Config,
    workspace_id: &str,
) -> Result<UsageMetrics> {
    let history_query = QueryHistoryQuery {
        page: Some(1),
        limit: Some(1000),
        query_type: None,
    };
    let users_query = UserQuery {
        page: Some(1),
        limit: Some(1000),
        ..Default::default()
    };
    let documents = client
        .list_all_documents(workspace_id, config.display.page_size)
        .await?;
    let (history, users) = try_join(
        client.query_history(workspace_id, &history_query),
        client.list_users(&users_query),
    )
    .await?;

    Ok(UsageMetrics::compute(&documents, &history.items, &users.items))
}

fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn print_dashboard(report: &DashboardReport) {
    let stats = &report.stats;
    println!("\n📊 Workspace {}\n", report.workspace_id);
    println!(
        "Documents: {} ({} processed)",
        stats.total_documents, stats.processed_documents
    );
    let storage = if stats.total_storage > 0 {
        format_file_size(stats.total_storage)
    } else {
        "0 MB".to_string()
    };
    println!("Storage: {}", storage);
    println!(
        "Queries: {} ({} AI questions)",
        stats.total_queries, stats.ai_questions
    );

    let processing = &report.processing;
    println!("\nProcessing:");
    println!(
        "  {} {:.1}%",
        bar(processing.progress_percentage, 30),
        processing.progress_percentage
    );
    for (status, count) in &processing.by_status {
        if *count > 0 {
            println!("  {:<12} {}", status.label(), count);
        }
    }

    println!("\nRecent queries:");
    if report.recent_queries.is_empty() {
        println!("  none");
    }
    for item in &report.recent_queries {
        println!(
            "  • [{}] {} ({})",
            item.query_type.label(),
            truncate(&item.query, 60),
            format_relative_now(Some(&item.created_at))
        );
    }
}

fn print_usage_line(name: &str, usage: &Usage, render: impl Fn(u64) -> String) {
    if usage.is_unlimited() {
        println!("{}: {} (no limit)", name, render(usage.count));
        return;
    }
    println!(
        "{}: {} of {} {} {:.1}% · {}",
        name,
        render(usage.count),
        render(usage.limit),
        bar(usage.bar_percentage(), 20),
        usage.percentage,
        usage.level.label()
    );
}

pub fn print_limits(report: &LimitsReport) {
    println!("\n📏 Usage for workspace {}\n", report.workspace_id);
    print_usage_line("Documents", &report.documents, |n| n.to_string());
    match &report.storage {
        Some(storage) => print_usage_line("Storage", storage, format_file_size),
        None => println!("Storage: {} (no limit)", format_file_size(report.storage_bytes)),
    }
}

pub fn print_usage_metrics(metrics: &UsageMetrics) {
    println!("\n📈 Usage metrics\n");
    println!(
        "Users: {} ({} active)",
        metrics.total_users, metrics.active_users
    );
    println!(
        "Documents: {} ({} processed, {:.1}%)",
        metrics.total_documents, metrics.processed_documents, metrics.processing_rate
    );
    println!(
        "Queries: {} ({} searches, {} questions)",
        metrics.total_queries, metrics.search_queries, metrics.question_queries
    );
    println!("Tokens used: {}", metrics.total_tokens);
    println!("Avg response time: {:.0}ms", metrics.avg_response_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_is_bounded() {
        assert_eq!(bar(0.0, 4), "[----]");
        assert_eq!(bar(50.0, 4), "[##--]");
        assert_eq!(bar(250.0, 4), "[####]");
    }
}
