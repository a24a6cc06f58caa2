use std::collections::HashMap;

use serde::Serialize;

use crate::services::risk;

/// One completed attempt, flattened for aggregation.
#[derive(Debug, Clone)]
pub(crate) struct CompletedAttempt {
    pub(crate) user_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) security_event_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BestAttempt {
    pub(crate) user_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) score: f64,
    pub(crate) passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AssessmentSummary {
    pub(crate) completed_attempts: i64,
    pub(crate) pass_rate: f64,
    pub(crate) average_score: f64,
    pub(crate) suspicious_attempts: i64,
    pub(crate) best_attempts: Vec<BestAttempt>,
}

/// Rolls completed attempts up into per-assessment statistics. Ties on the
/// best score are broken by the lowest attempt number (earliest attempt wins).
pub(crate) fn summarize(attempts: &[CompletedAttempt], alert_threshold: i64) -> AssessmentSummary {
    let completed = attempts.len() as i64;

    if completed == 0 {
        return AssessmentSummary {
            completed_attempts: 0,
            pass_rate: 0.0,
            average_score: 0.0,
            suspicious_attempts: 0,
            best_attempts: Vec::new(),
        };
    }

    let passed = attempts.iter().filter(|attempt| attempt.passed).count() as f64;
    let score_sum: f64 = attempts.iter().map(|attempt| attempt.score).sum();
    let suspicious = attempts
        .iter()
        .filter(|attempt| risk::requires_review(attempt.security_event_count, alert_threshold))
        .count() as i64;

    let mut best: HashMap<&str, &CompletedAttempt> = HashMap::new();
    for attempt in attempts {
        best.entry(attempt.user_id.as_str())
            .and_modify(|current| {
                let better = attempt.score > current.score
                    || (attempt.score == current.score
                        && attempt.attempt_number < current.attempt_number);
                if better {
                    *current = attempt;
                }
            })
            .or_insert(attempt);
    }

    let mut best_attempts: Vec<BestAttempt> = best
        .into_values()
        .map(|attempt| BestAttempt {
            user_id: attempt.user_id.clone(),
            attempt_number: attempt.attempt_number,
            score: attempt.score,
            passed: attempt.passed,
        })
        .collect();
    best_attempts.sort_by(|a, b| a.user_id.cmp(&b.user_id));

    AssessmentSummary {
        completed_attempts: completed,
        pass_rate: round2(passed / completed as f64 * 100.0),
        average_score: round2(score_sum / completed as f64),
        suspicious_attempts: suspicious,
        best_attempts,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(
        user_id: &str,
        attempt_number: i32,
        score: f64,
        passed: bool,
        events: i64,
    ) -> CompletedAttempt {
        CompletedAttempt {
            user_id: user_id.to_string(),
            attempt_number,
            score,
            passed,
            security_event_count: events,
        }
    }

    #[test]
    fn empty_input_produces_zeroed_summary() {
        let summary = summarize(&[], 3);
        assert_eq!(summary.completed_attempts, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.suspicious_attempts, 0);
        assert!(summary.best_attempts.is_empty());
    }

    #[test]
    fn aggregates_pass_rate_and_average() {
        let attempts = vec![
            attempt("alice", 1, 80.0, true, 0),
            attempt("bob", 1, 40.0, false, 0),
            attempt("carol", 1, 65.5, true, 0),
        ];

        let summary = summarize(&attempts, 3);

        assert_eq!(summary.completed_attempts, 3);
        assert_eq!(summary.pass_rate, 66.67);
        assert_eq!(summary.average_score, 61.83);
    }

    #[test]
    fn counts_attempts_over_the_alert_threshold_as_suspicious() {
        let attempts = vec![
            attempt("alice", 1, 80.0, true, 4),
            attempt("bob", 1, 70.0, true, 3),
        ];

        let summary = summarize(&attempts, 3);

        // Strictly greater than the threshold, so bob's 3 events are clean.
        assert_eq!(summary.suspicious_attempts, 1);
    }

    #[test]
    fn best_attempt_takes_highest_score() {
        let attempts = vec![
            attempt("alice", 1, 50.0, false, 0),
            attempt("alice", 2, 90.0, true, 0),
            attempt("alice", 3, 70.0, true, 0),
        ];

        let summary = summarize(&attempts, 3);

        assert_eq!(summary.best_attempts.len(), 1);
        assert_eq!(summary.best_attempts[0].attempt_number, 2);
        assert_eq!(summary.best_attempts[0].score, 90.0);
    }

    #[test]
    fn best_attempt_tie_goes_to_the_earliest_attempt() {
        let attempts = vec![
            attempt("alice", 2, 75.0, true, 0),
            attempt("alice", 1, 75.0, true, 0),
        ];

        let summary = summarize(&attempts, 3);

        assert_eq!(summary.best_attempts[0].attempt_number, 1);
    }
}
