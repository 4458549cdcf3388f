//! Usage against configured document and storage limits

use crate::status::BadgeVariant;
use serde::{Deserialize, Serialize};

/// Percentage at which usage counts as near the limit
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Percentage at which usage counts as at the limit
pub const AT_LIMIT_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    WithinLimit,
    NearLimit,
    AtLimit,
}

impl UsageLevel {
    pub fn label(&self) -> &'static str {
        match self {
            UsageLevel::WithinLimit => "Within Limit",
            UsageLevel::NearLimit => "Near Limit",
            UsageLevel::AtLimit => "At Limit",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            UsageLevel::WithinLimit => BadgeVariant::Default,
            UsageLevel::NearLimit => BadgeVariant::Secondary,
            UsageLevel::AtLimit => BadgeVariant::Destructive,
        }
    }
}

/// `count / limit * 100`, unclamped. A limit of zero means no limit.
pub fn usage_percentage(count: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    count as f64 / limit as f64 * 100.0
}

/// Classify an unclamped percentage against a near-limit threshold
pub fn classify(percentage: f64, near_threshold: f64) -> UsageLevel {
    if percentage >= AT_LIMIT_PERCENT {
        UsageLevel::AtLimit
    } else if percentage >= near_threshold {
        UsageLevel::NearLimit
    } else {
        UsageLevel::WithinLimit
    }
}

/// Consumption of a countable resource against its limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub count: u64,
    pub limit: u64,
    pub percentage: f64,
    pub level: UsageLevel,
}

impl Usage {
    pub fn new(count: u64, limit: u64) -> Self {
        Self::with_threshold(count, limit, NEAR_LIMIT_PERCENT)
    }

    pub fn with_threshold(count: u64, limit: u64, near_threshold: f64) -> Self {
        let percentage = usage_percentage(count, limit);
        Self {
            count,
            limit,
            percentage,
            level: classify(percentage, near_threshold),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == 0
    }

    /// Percentage clamped to [0, 100] for progress bars
    pub fn bar_percentage(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }
}
