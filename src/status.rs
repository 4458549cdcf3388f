//! Document lifecycle statuses and the ingestion pipeline timeline.
//!
//! The backend owns every status transition. This module only interprets the
//! values it reports: it orders the ingestion pipeline, derives a per-step
//! display state for the timeline, and maps each status onto a badge variant.
//! All lookups are exhaustive matches so a new wire value cannot be rendered
//! until every table has been updated.

use crate::error::{Error, Result};
use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level lifecycle of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Uploading,
    Uploaded,
    Processing,
    Processed,
    Failed,
    Deleted,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 7] = [
        DocumentStatus::Pending,
        DocumentStatus::Uploading,
        DocumentStatus::Uploaded,
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Failed,
        DocumentStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Uploading => "UPLOADING",
            DocumentStatus::Uploaded => "UPLOADED",
            DocumentStatus::Processing => "PROCESSING",
            DocumentStatus::Processed => "PROCESSED",
            DocumentStatus::Failed => "FAILED",
            DocumentStatus::Deleted => "DELETED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Uploading => "Uploading",
            DocumentStatus::Uploaded => "Uploaded",
            DocumentStatus::Processing => "Processing",
            DocumentStatus::Processed => "Processed",
            DocumentStatus::Failed => "Failed",
            DocumentStatus::Deleted => "Deleted",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            DocumentStatus::Pending => BadgeVariant::Outline,
            DocumentStatus::Uploading => BadgeVariant::Outline,
            DocumentStatus::Uploaded => BadgeVariant::Secondary,
            DocumentStatus::Processing => BadgeVariant::Secondary,
            DocumentStatus::Processed => BadgeVariant::Default,
            DocumentStatus::Failed => BadgeVariant::Destructive,
            DocumentStatus::Deleted => BadgeVariant::Outline,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DocumentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Other(format!("Unknown document status: {}", s)))
    }
}

/// Progress through the content-processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStatus {
    Pending,
    Parsing,
    Chunking,
    Embedding,
    Indexing,
    Completed,
    Failed,
}

impl IngestionStatus {
    pub const ALL: [IngestionStatus; 7] = [
        IngestionStatus::Pending,
        IngestionStatus::Parsing,
        IngestionStatus::Chunking,
        IngestionStatus::Embedding,
        IngestionStatus::Indexing,
        IngestionStatus::Completed,
        IngestionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "PENDING",
            IngestionStatus::Parsing => "PARSING",
            IngestionStatus::Chunking => "CHUNKING",
            IngestionStatus::Embedding => "EMBEDDING",
            IngestionStatus::Indexing => "INDEXING",
            IngestionStatus::Completed => "COMPLETED",
            IngestionStatus::Failed => "FAILED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "Pending",
            IngestionStatus::Parsing => "Parsing",
            IngestionStatus::Chunking => "Chunking",
            IngestionStatus::Embedding => "Embedding",
            IngestionStatus::Indexing => "Indexing",
            IngestionStatus::Completed => "Completed",
            IngestionStatus::Failed => "Failed",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            IngestionStatus::Pending => BadgeVariant::Outline,
            IngestionStatus::Parsing => BadgeVariant::Secondary,
            IngestionStatus::Chunking => BadgeVariant::Secondary,
            IngestionStatus::Embedding => BadgeVariant::Secondary,
            IngestionStatus::Indexing => BadgeVariant::Secondary,
            IngestionStatus::Completed => BadgeVariant::Default,
            IngestionStatus::Failed => BadgeVariant::Destructive,
        }
    }

    /// Position in the pipeline; `None` for `Failed`, which is a flag rather
    /// than a position.
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            IngestionStatus::Pending => Some(PipelineStep::Pending),
            IngestionStatus::Parsing => Some(PipelineStep::Parsing),
            IngestionStatus::Chunking => Some(PipelineStep::Chunking),
            IngestionStatus::Embedding => Some(PipelineStep::Embedding),
            IngestionStatus::Indexing => Some(PipelineStep::Indexing),
            IngestionStatus::Completed => Some(PipelineStep::Completed),
            IngestionStatus::Failed => None,
        }
    }

    /// No further transitions happen without a client-triggered reindex
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestionStatus::Completed | IngestionStatus::Failed)
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IngestionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Other(format!("Unknown ingestion status: {}", s)))
    }
}

/// One position on the ingestion timeline, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    Pending,
    Parsing,
    Chunking,
    Embedding,
    Indexing,
    Completed,
}

impl PipelineStep {
    /// Fixed rendering order of the timeline
    pub const ORDER: [PipelineStep; 6] = [
        PipelineStep::Pending,
        PipelineStep::Parsing,
        PipelineStep::Chunking,
        PipelineStep::Embedding,
        PipelineStep::Indexing,
        PipelineStep::Completed,
    ];

    pub fn index(&self) -> usize {
        match self {
            PipelineStep::Pending => 0,
            PipelineStep::Parsing => 1,
            PipelineStep::Chunking => 2,
            PipelineStep::Embedding => 3,
            PipelineStep::Indexing => 4,
            PipelineStep::Completed => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStep::Pending => "Pending",
            PipelineStep::Parsing => "Parsing Document",
            PipelineStep::Chunking => "Chunking Text",
            PipelineStep::Embedding => "Generating Embeddings",
            PipelineStep::Indexing => "Indexing Vectors",
            PipelineStep::Completed => "Completed",
        }
    }

    pub fn status(&self) -> IngestionStatus {
        match self {
            PipelineStep::Pending => IngestionStatus::Pending,
            PipelineStep::Parsing => IngestionStatus::Parsing,
            PipelineStep::Chunking => IngestionStatus::Chunking,
            PipelineStep::Embedding => IngestionStatus::Embedding,
            PipelineStep::Indexing => IngestionStatus::Indexing,
            PipelineStep::Completed => IngestionStatus::Completed,
        }
    }
}

/// Display state of a single timeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Failed,
    Pending,
}

impl StepState {
    pub fn label(&self) -> &'static str {
        match self {
            StepState::Completed => "Completed",
            StepState::Active => "Active",
            StepState::Failed => "Failed",
            StepState::Pending => "Pending",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            StepState::Completed => BadgeVariant::Default,
            StepState::Active => BadgeVariant::Secondary,
            StepState::Failed => BadgeVariant::Destructive,
            StepState::Pending => BadgeVariant::Outline,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            StepState::Completed => "✓",
            StepState::Active => "⟳",
            StepState::Failed => "✗",
            StepState::Pending => "·",
        }
    }
}

/// Visual treatment category shared by every status table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
    Outline,
}

impl BadgeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeVariant::Default => "default",
            BadgeVariant::Secondary => "secondary",
            BadgeVariant::Destructive => "destructive",
            BadgeVariant::Outline => "outline",
        }
    }
}

/// Where a document stands in the pipeline: the last step that was reached
/// plus whether ingestion terminated in failure at that step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub last_active_step: PipelineStep,
    pub failed: bool,
}

impl PipelineProgress {
    pub fn active(step: PipelineStep) -> Self {
        Self {
            last_active_step: step,
            failed: false,
        }
    }

    pub fn failed_at(step: PipelineStep) -> Self {
        Self {
            last_active_step: step,
            failed: true,
        }
    }

    /// Progress from a bare status. A failure with no other evidence is
    /// attributed to the first step.
    pub fn from_status(status: IngestionStatus) -> Self {
        match status.step() {
            Some(step) => Self::active(step),
            None => Self::failed_at(PipelineStep::Pending),
        }
    }

    /// Progress from a full record. For a failed document the step that was
    /// in progress is inferred from the work the backend recorded before the
    /// failure.
    pub fn from_document(doc: &Document) -> Self {
        match doc.ingestion_status.step() {
            Some(step) => Self::active(step),
            None => Self::failed_at(infer_failed_step(doc)),
        }
    }

    /// Ingestion has not stopped yet
    pub fn is_running(&self) -> bool {
        !self.failed && self.last_active_step != PipelineStep::Completed
    }
}

fn infer_failed_step(doc: &Document) -> PipelineStep {
    if doc.embedding_count > 0 {
        PipelineStep::Indexing
    } else if doc.chunk_count > 0 {
        PipelineStep::Embedding
    } else if doc
        .ingestion_started_at
        .as_deref()
        .is_some_and(|ts| !ts.trim().is_empty())
    {
        PipelineStep::Parsing
    } else {
        PipelineStep::Pending
    }
}

/// Display state of `step` given the document's progress
pub fn step_state(step: PipelineStep, progress: &PipelineProgress) -> StepState {
    let current = progress.last_active_step.index();
    let index = step.index();

    if index < current {
        StepState::Completed
    } else if index == current {
        if progress.failed {
            StepState::Failed
        } else {
            StepState::Active
        }
    } else {
        StepState::Pending
    }
}

/// Single-value form of [`step_state`] for callers holding only a status
pub fn step_state_for_status(step: PipelineStep, status: IngestionStatus) -> StepState {
    step_state(step, &PipelineProgress::from_status(status))
}

/// One row of the processing timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub step: PipelineStep,
    pub label: String,
    pub state: StepState,
}

/// Every pipeline step with its display state, in order
pub fn timeline(progress: &PipelineProgress) -> Vec<TimelineEntry> {
    PipelineStep::ORDER
        .iter()
        .map(|step| TimelineEntry {
            step: *step,
            label: step.label().to_string(),
            state: step_state(*step, progress),
        })
        .collect()
}
