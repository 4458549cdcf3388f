//! Client-side filtering, sorting and aggregation of fetched records

use crate::format::parse_timestamp;
use crate::models::{Document, DocumentType, QueryHistoryItem, QueryType, User, UserRole};
use crate::status::{DocumentStatus, IngestionStatus};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Window on a document's creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
    Year,
}

impl DateRange {
    /// Earliest creation time inside the range, `None` for no lower bound
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::All => None,
            DateRange::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            DateRange::Week => Some(now - Duration::days(7)),
            DateRange::Month => now.checked_sub_months(Months::new(1)),
            DateRange::Year => now.checked_sub_months(Months::new(12)),
        }
    }

    /// Unparsable timestamps fall outside every range except `All`
    pub fn contains(&self, timestamp: &str, now: DateTime<Utc>) -> bool {
        let Some(since) = self.since(now) else {
            return true;
        };
        parse_timestamp(timestamp).is_some_and(|ts| ts >= since)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub search: Option<String>,
    pub doc_type: Option<DocumentType>,
    pub status: Option<DocumentStatus>,
    pub ingestion_status: Option<IngestionStatus>,
    pub date_range: DateRange,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document, now: DateTime<Utc>) -> bool {
        if let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let needle = needle.to_lowercase();
            if !doc.name.to_lowercase().contains(&needle)
                && !doc.original_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.doc_type.is_some_and(|t| t != doc.doc_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != doc.status) {
            return false;
        }
        if self.ingestion_status.is_some_and(|s| s != doc.ingestion_status) {
            return false;
        }
        self.date_range.contains(&doc.created_at, now)
    }

    pub fn apply<'a>(&self, docs: &'a [Document], now: DateTime<Utc>) -> Vec<&'a Document> {
        docs.iter().filter(|doc| self.matches(doc, now)).collect()
    }

    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.doc_type.is_some()
            || self.status.is_some()
            || self.ingestion_status.is_some()
            || self.date_range != DateRange::All
    }
}

/// Ids to restrict a search to; `None` when nothing matched so the search
/// runs across the whole workspace
pub fn scope_document_ids(
    docs: &[Document],
    filter: &DocumentFilter,
    now: DateTime<Utc>,
) -> Option<Vec<String>> {
    if !filter.is_active() {
        return None;
    }
    let ids: Vec<String> = filter
        .apply(docs, now)
        .into_iter()
        .map(|doc| doc.id.clone())
        .collect();
    (!ids.is_empty()).then_some(ids)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentSort {
    Name,
    #[default]
    Created,
    Size,
    Status,
}

impl DocumentSort {
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match self {
            DocumentSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            DocumentSort::Created => created_at(a).cmp(&created_at(b)),
            DocumentSort::Size => a.size_bytes().unwrap_or(0).cmp(&b.size_bytes().unwrap_or(0)),
            DocumentSort::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}

fn created_at(doc: &Document) -> Option<DateTime<Utc>> {
    parse_timestamp(&doc.created_at)
}

/// Stable sort; ties keep their fetched order
pub fn sort_documents(docs: &mut [&Document], sort: DocumentSort, descending: bool) {
    docs.sort_by(|a, b| {
        let ordering = sort.compare(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let needle = needle.to_lowercase();
            let hit = [
                Some(user.email.as_str()),
                user.first_name.as_deref(),
                user.last_name.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        self.active.map_or(true, |active| active == user.is_active)
    }

    pub fn apply<'a>(&self, users: &'a [User]) -> Vec<&'a User> {
        users.iter().filter(|user| self.matches(user)).collect()
    }
}

fn total_bytes(docs: &[Document]) -> u64 {
    docs.iter().map(|doc| doc.size_bytes().unwrap_or(0)).sum()
}

fn processed_count(docs: &[Document]) -> usize {
    docs.iter()
        .filter(|doc| doc.status == DocumentStatus::Processed)
        .count()
}

/// Headline numbers for a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_documents: usize,
    pub processed_documents: usize,
    pub total_storage: u64,
    pub total_queries: usize,
    pub ai_questions: usize,
}

impl DashboardStats {
    pub fn compute(docs: &[Document], queries: &[QueryHistoryItem]) -> Self {
        Self {
            total_documents: docs.len(),
            processed_documents: processed_count(docs),
            total_storage: total_bytes(docs),
            total_queries: queries.len(),
            ai_questions: queries
                .iter()
                .filter(|q| q.query_type == QueryType::Question)
                .count(),
        }
    }
}

/// Where documents stand in processing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    pub total: usize,
    pub by_status: Vec<(DocumentStatus, usize)>,
    pub by_ingestion_status: Vec<(IngestionStatus, usize)>,
    pub processed: usize,
    pub processing: usize,
    pub failed: usize,
    pub pending: usize,
    pub progress_percentage: f64,
}

impl ProcessingSummary {
    pub fn compute(docs: &[Document]) -> Self {
        let by_status: Vec<(DocumentStatus, usize)> = DocumentStatus::ALL
            .into_iter()
            .map(|status| (status, docs.iter().filter(|d| d.status == status).count()))
            .collect();
        let by_ingestion_status = IngestionStatus::ALL
            .into_iter()
            .map(|status| {
                (
                    status,
                    docs.iter().filter(|d| d.ingestion_status == status).count(),
                )
            })
            .collect();
        let count = |wanted: DocumentStatus| {
            by_status
                .iter()
                .find(|(status, _)| *status == wanted)
                .map_or(0, |(_, n)| *n)
        };

        let processed = count(DocumentStatus::Processed);
        let total = docs.len();
        Self {
            total,
            processed,
            processing: count(DocumentStatus::Processing),
            failed: count(DocumentStatus::Failed),
            pending: count(DocumentStatus::Pending),
            progress_percentage: if total == 0 {
                0.0
            } else {
                processed as f64 / total as f64 * 100.0
            },
            by_status,
            by_ingestion_status,
        }
    }
}

/// Administrative usage figures across documents, queries and users
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    pub total_users: usize,
    pub active_users: usize,
    pub total_documents: usize,
    pub processed_documents: usize,
    pub total_queries: usize,
    pub search_queries: usize,
    pub question_queries: usize,
    pub total_tokens: u64,
    pub avg_response_ms: f64,
    pub processing_rate: f64,
}

impl UsageMetrics {
    pub fn compute(docs: &[Document], queries: &[QueryHistoryItem], users: &[User]) -> Self {
        let processed = processed_count(docs);
        let count_type =
            |kind: QueryType| queries.iter().filter(|q| q.query_type == kind).count();
        let avg_response_ms = if queries.is_empty() {
            0.0
        } else {
            queries.iter().map(|q| q.response_time.unwrap_or(0.0)).sum::<f64>()
                / queries.len() as f64
        };

        Self {
            total_users: users.len(),
            active_users: users.iter().filter(|u| u.is_active).count(),
            total_documents: docs.len(),
            processed_documents: processed,
            total_queries: queries.len(),
            search_queries: count_type(QueryType::Search),
            question_queries: count_type(QueryType::Question),
            total_tokens: queries.iter().map(|q| q.tokens_used.unwrap_or(0)).sum(),
            avg_response_ms,
            processing_rate: if docs.is_empty() {
                0.0
            } else {
                processed as f64 / docs.len() as f64 * 100.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_document;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn doc(id: &str, name: &str, created: &str, size: &str, status: DocumentStatus) -> Document {
        let mut doc = test_document(id);
        doc.name = name.to_string();
        doc.original_name = format!("{}.pdf", name.to_lowercase());
        doc.created_at = created.to_string();
        doc.size = size.to_string();
        doc.status = status;
        doc
    }

    fn docs() -> Vec<Document> {
        vec![
            doc("1", "Handbook", "2024-06-15T08:00:00Z", "300", DocumentStatus::Processed),
            doc("2", "budget", "2024-06-10T08:00:00Z", "100", DocumentStatus::Processing),
            doc("3", "Archive", "2023-01-01T00:00:00Z", "200", DocumentStatus::Failed),
            doc("4", "Broken", "whenever", "oops", DocumentStatus::Processed),
        ]
    }

    fn query(kind: QueryType, tokens: Option<u64>, time: Option<f64>) -> QueryHistoryItem {
        QueryHistoryItem {
            id: "q".to_string(),
            query_type: kind,
            query: "q".to_string(),
            result_count: 0,
            ai_response: None,
            ai_model: None,
            tokens_used: tokens,
            response_time: time,
            created_at: "2024-06-15T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_date_ranges() {
        let all = docs();
        let ids = |range: DateRange| -> Vec<String> {
            DocumentFilter {
                date_range: range,
                ..Default::default()
            }
            .apply(&all, now())
            .into_iter()
            .map(|d| d.id.clone())
            .collect()
        };
        assert_eq!(ids(DateRange::All), vec!["1", "2", "3", "4"]);
        assert_eq!(ids(DateRange::Today), vec!["1"]);
        assert_eq!(ids(DateRange::Week), vec!["1", "2"]);
        assert_eq!(ids(DateRange::Year), vec!["1", "2"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_both_names() {
        let all = docs();
        let filter = DocumentFilter {
            search: Some("BUDG".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&all, now()).len(), 1);

        let by_original = DocumentFilter {
            search: Some("handbook.pdf".to_string()),
            ..Default::default()
        };
        assert_eq!(by_original.apply(&all, now())[0].id, "1");
    }

    #[test]
    fn test_scope_ids_only_when_non_empty() {
        let all = docs();
        assert_eq!(scope_document_ids(&all, &DocumentFilter::default(), now()), None);

        let week = DocumentFilter {
            date_range: DateRange::Week,
            ..Default::default()
        };
        assert_eq!(
            scope_document_ids(&all, &week, now()),
            Some(vec!["1".to_string(), "2".to_string()])
        );

        let nothing = DocumentFilter {
            doc_type: Some(DocumentType::Csv),
            ..Default::default()
        };
        assert_eq!(scope_document_ids(&all, &nothing, now()), None);
    }

    #[test]
    fn test_sorting() {
        let all = docs();
        let mut refs: Vec<&Document> = all.iter().collect();
        sort_documents(&mut refs, DocumentSort::Name, false);
        let names: Vec<&str> = refs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Archive", "Broken", "budget", "Handbook"]);

        sort_documents(&mut refs, DocumentSort::Size, true);
        assert_eq!(refs[0].id, "1");
        assert_eq!(refs[3].id, "4");

        sort_documents(&mut refs, DocumentSort::Created, true);
        assert_eq!(refs[0].id, "1");
        assert_eq!(refs[3].id, "4");
    }

    #[test]
    fn test_dashboard_stats() {
        let queries = vec![
            query(QueryType::Search, None, Some(100.0)),
            query(QueryType::Question, Some(40), Some(300.0)),
        ];
        let stats = DashboardStats::compute(&docs(), &queries);
        assert_eq!(stats.total_documents, 4);
        assert_eq!(stats.processed_documents, 2);
        assert_eq!(stats.total_storage, 600);
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.ai_questions, 1);

        let metrics = UsageMetrics::compute(&docs(), &queries, &[]);
        assert_eq!(metrics.total_tokens, 40);
        assert_eq!(metrics.avg_response_ms, 200.0);
        assert_eq!(metrics.processing_rate, 50.0);
        assert_eq!(metrics.total_users, 0);
    }

    #[test]
    fn test_processing_summary() {
        let summary = ProcessingSummary::compute(&docs());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.processing, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 0);
        assert_eq!(summary.progress_percentage, 50.0);
        assert_eq!(summary.by_status.len(), DocumentStatus::ALL.len());

        let empty = ProcessingSummary::compute(&[]);
        assert_eq!(empty.progress_percentage, 0.0);
    }
}
