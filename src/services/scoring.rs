use std::collections::{HashMap, HashSet};

use crate::db::models::{Answer, Question};
use crate::db::types::QuestionKind;

#[derive(Debug, Clone)]
pub(crate) struct SubmittedResponse {
    pub(crate) question_id: String,
    pub(crate) answer_id: Option<String>,
    pub(crate) response_text: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ScoredResponse {
    pub(crate) question_id: String,
    pub(crate) answer_id: Option<String>,
    pub(crate) response_text: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct ScoreOutcome {
    pub(crate) responses: Vec<ScoredResponse>,
    pub(crate) total_points: f64,
    pub(crate) earned_points: f64,
    pub(crate) final_score: f64,
    pub(crate) passed: bool,
    pub(crate) skipped_question_ids: Vec<String>,
}

/// Scores a submission against an assessment's question bank.
///
/// Only submitted responses that reference a known question count toward the
/// denominator; a response earns the question's full points when its selected
/// answer belongs to the question and is flagged correct. Open-text responses
/// are recorded but earn 0 (manual grading is not implemented). Responses for
/// unknown questions are skipped and reported back for logging; duplicates
/// after the first response per question are skipped as well.
pub(crate) fn score_submission(
    questions: &[Question],
    answers: &[Answer],
    passing_score: f64,
    submitted: &[SubmittedResponse],
) -> ScoreOutcome {
    let question_map: HashMap<&str, &Question> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();
    let answer_map: HashMap<&str, &Answer> =
        answers.iter().map(|answer| (answer.id.as_str(), answer)).collect();

    let mut seen_questions: HashSet<&str> = HashSet::new();
    let mut responses = Vec::new();
    let mut skipped_question_ids = Vec::new();
    let mut total_points = 0.0;
    let mut earned_points = 0.0;

    for response in submitted {
        let Some(question) = question_map.get(response.question_id.as_str()) else {
            skipped_question_ids.push(response.question_id.clone());
            continue;
        };

        if !seen_questions.insert(question.id.as_str()) {
            skipped_question_ids.push(response.question_id.clone());
            continue;
        }

        total_points += question.points as f64;

        let is_correct = match question.kind {
            QuestionKind::OpenText => false,
            _ => response
                .answer_id
                .as_deref()
                .and_then(|answer_id| answer_map.get(answer_id))
                .map(|answer| answer.question_id == question.id && answer.is_correct)
                .unwrap_or(false),
        };

        let points_earned = if is_correct { question.points as f64 } else { 0.0 };
        earned_points += points_earned;

        responses.push(ScoredResponse {
            question_id: response.question_id.clone(),
            answer_id: response.answer_id.clone(),
            response_text: response.response_text.clone(),
            is_correct,
            points_earned,
        });
    }

    let final_score =
        if total_points > 0.0 { earned_points / total_points * 100.0 } else { 0.0 };
    let passed = final_score >= passing_score;

    ScoreOutcome {
        responses,
        total_points,
        earned_points,
        final_score,
        passed,
        skipped_question_ids,
    }
}

/// Maximum achievable score for an assessment, recorded on the attempt.
pub(crate) fn max_score(questions: &[Question]) -> f64 {
    questions.iter().map(|question| question.points as f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionKind;

    fn question(id: &str, kind: QuestionKind, points: i32) -> Question {
        Question {
            id: id.to_string(),
            assessment_id: "assessment-1".to_string(),
            text: format!("Question {id}"),
            kind,
            points,
            order_index: 0,
            explanation: None,
            media_url: None,
        }
    }

    fn answer(id: &str, question_id: &str, is_correct: bool) -> Answer {
        Answer {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: format!("Answer {id}"),
            is_correct,
            order_index: 0,
        }
    }

    fn submit(question_id: &str, answer_id: Option<&str>) -> SubmittedResponse {
        SubmittedResponse {
            question_id: question_id.to_string(),
            answer_id: answer_id.map(|id| id.to_string()),
            response_text: None,
        }
    }

    fn bank() -> (Vec<Question>, Vec<Answer>) {
        let questions = vec![
            question("q1", QuestionKind::SingleChoice, 3),
            question("q2", QuestionKind::SingleChoice, 2),
        ];
        let answers = vec![
            answer("a1", "q1", true),
            answer("a2", "q1", false),
            answer("a3", "q2", true),
            answer("a4", "q2", false),
        ];
        (questions, answers)
    }

    #[test]
    fn all_correct_scores_one_hundred() {
        let (questions, answers) = bank();
        let submitted = vec![submit("q1", Some("a1")), submit("q2", Some("a3"))];

        let outcome = score_submission(&questions, &answers, 100.0, &submitted);

        assert_eq!(outcome.final_score, 100.0);
        assert!(outcome.passed);
        assert_eq!(outcome.earned_points, 5.0);
        assert_eq!(outcome.total_points, 5.0);
    }

    #[test]
    fn boundary_score_counts_as_passed() {
        // 3 of 5 points with passing_score 60 lands exactly on the boundary.
        let (questions, answers) = bank();
        let submitted = vec![submit("q1", Some("a1")), submit("q2", Some("a4"))];

        let outcome = score_submission(&questions, &answers, 60.0, &submitted);

        assert_eq!(outcome.earned_points, 3.0);
        assert_eq!(outcome.total_points, 5.0);
        assert_eq!(outcome.final_score, 60.0);
        assert!(outcome.passed);
    }

    #[test]
    fn zero_recognized_responses_scores_zero() {
        let (questions, answers) = bank();
        let submitted = vec![submit("ghost", Some("a1"))];

        let outcome = score_submission(&questions, &answers, 50.0, &submitted);

        assert_eq!(outcome.final_score, 0.0);
        assert!(!outcome.passed);
        assert_eq!(outcome.responses.len(), 0);
        assert_eq!(outcome.skipped_question_ids, vec!["ghost".to_string()]);
    }

    #[test]
    fn answer_from_another_question_is_wrong() {
        let (questions, answers) = bank();
        // a3 is correct for q2, submitted against q1.
        let submitted = vec![submit("q1", Some("a3"))];

        let outcome = score_submission(&questions, &answers, 50.0, &submitted);

        assert!(!outcome.responses[0].is_correct);
        assert_eq!(outcome.responses[0].points_earned, 0.0);
    }

    #[test]
    fn open_text_is_recorded_but_never_scored() {
        let questions = vec![question("q1", QuestionKind::OpenText, 4)];
        let submitted = vec![SubmittedResponse {
            question_id: "q1".to_string(),
            answer_id: None,
            response_text: Some("free-form essay".to_string()),
        }];

        let outcome = score_submission(&questions, &[], 50.0, &submitted);

        assert_eq!(outcome.responses.len(), 1);
        assert!(!outcome.responses[0].is_correct);
        assert_eq!(outcome.responses[0].points_earned, 0.0);
        assert_eq!(outcome.total_points, 4.0);
        assert_eq!(outcome.final_score, 0.0);
    }

    #[test]
    fn duplicate_question_responses_keep_the_first() {
        let (questions, answers) = bank();
        let submitted =
            vec![submit("q1", Some("a1")), submit("q1", Some("a2")), submit("q2", Some("a3"))];

        let outcome = score_submission(&questions, &answers, 50.0, &submitted);

        assert_eq!(outcome.responses.len(), 2);
        assert!(outcome.responses[0].is_correct);
        assert_eq!(outcome.skipped_question_ids, vec!["q1".to_string()]);
        assert_eq!(outcome.final_score, 100.0);
    }

    #[test]
    fn missing_answer_id_on_choice_question_earns_zero() {
        let (questions, answers) = bank();
        let submitted = vec![submit("q1", None), submit("q2", Some("a3"))];

        let outcome = score_submission(&questions, &answers, 30.0, &submitted);

        assert!(!outcome.responses[0].is_correct);
        assert_eq!(outcome.earned_points, 2.0);
        assert_eq!(outcome.final_score, 40.0);
        assert!(outcome.passed);
    }

    #[test]
    fn max_score_sums_question_points() {
        let (questions, _) = bank();
        assert_eq!(max_score(&questions), 5.0);
    }
}
