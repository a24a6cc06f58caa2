use serde::Serialize;

/// Canonical risk thresholds. Every call site (live event recording, attempt
/// reports, course aggregates) derives risk from this table; the counts are
/// exclusive lower bounds (`>` comparisons).
pub(crate) const HIGH_SEVERITY_COUNT_HIGH: i64 = 2;
pub(crate) const TOTAL_EVENTS_HIGH: i64 = 5;
pub(crate) const TOTAL_EVENTS_MEDIUM: i64 = 2;

/// Default review threshold when an exam has no explicit configuration.
pub(crate) const DEFAULT_ALERT_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RiskLevel {
    Low,
    Medium,
    High,
}

pub(crate) fn classify(high_severity_count: i64, total_events: i64) -> RiskLevel {
    if high_severity_count > HIGH_SEVERITY_COUNT_HIGH || total_events > TOTAL_EVENTS_HIGH {
        return RiskLevel::High;
    }
    if high_severity_count > 0 || total_events > TOTAL_EVENTS_MEDIUM {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}

pub(crate) fn requires_review(total_events: i64, alert_threshold: i64) -> bool {
    total_events > alert_threshold
}
