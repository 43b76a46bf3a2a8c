// src/services/grading.rs
//
// Pure scoring of a submitted answer set against authoritative question
// records. No I/O; callers load the questions and persist the outcome.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::question::Question;
use crate::models::quiz_attempt::{AnswerRecord, SubmittedAnswer};

/// Aggregated result of grading one submission.
#[derive(Debug, Clone)]
pub struct GradeOutcome {
    /// Per-answer verdicts, in submission order.
    pub answers: Vec<AnswerRecord>,
    pub earned_point: f64,
    /// Sum of points over the submitted answers only. Questions the
    /// submission omits do not count toward the total.
    pub total_point: f64,
    pub is_passed: bool,
}

/// Grades a submission.
///
/// An answer is correct iff its selected-option-id set equals the question's
/// correct-option-id set exactly. No partial credit: any mismatch scores zero
/// for that answer. A submitted answer referencing an unknown question fails
/// the whole grading with `NotFound`.
///
/// `is_passed` is `earned / total * 100 >= passing_grade`; an empty
/// submission never passes and never divides by zero.
pub fn grade(
    submitted: &[SubmittedAnswer],
    questions: &HashMap<i64, Question>,
    passing_grade: f64,
) -> Result<GradeOutcome, AppError> {
    let mut earned_point = 0.0;
    let mut total_point = 0.0;
    let mut answers = Vec::with_capacity(submitted.len());

    for item in submitted {
        let question = questions.get(&item.question_id).ok_or_else(|| {
            AppError::NotFound(format!("Question {} not found", item.question_id))
        })?;

        let correct = question.correct_option_ids();
        let selected: HashSet<Uuid> = item.selected_answers.iter().copied().collect();
        let is_correct = selected == correct;

        if is_correct {
            earned_point += question.point;
        }
        total_point += question.point;

        answers.push(AnswerRecord {
            question: question.id,
            selected_answers: item.selected_answers.clone(),
            is_correct,
        });
    }

    let is_passed = total_point > 0.0 && (earned_point / total_point) * 100.0 >= passing_grade;

    Ok(GradeOutcome {
        answers,
        earned_point,
        total_point,
        is_passed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionOption, TYPE_TRUE_FALSE};
    use sqlx::types::Json;

    fn option(is_correct: bool) -> QuestionOption {
        QuestionOption {
            id: Uuid::new_v4(),
            text: if is_correct { "right" } else { "wrong" }.to_string(),
            is_correct,
        }
    }

    fn question(id: i64, point: f64, options: Vec<QuestionOption>) -> Question {
        Question {
            id,
            quiz_id: Some(1),
            question: format!("Question {}", id),
            question_type: TYPE_TRUE_FALSE.to_string(),
            options: Json(options),
            point,
            explanation: None,
            required: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn answer(question_id: i64, selected: Vec<Uuid>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_answers: selected,
        }
    }

    fn two_question_bank() -> (HashMap<i64, Question>, Uuid, Uuid) {
        // Two questions worth 5 points each, one correct option each.
        let q1 = question(1, 5.0, vec![option(true), option(false)]);
        let q2 = question(2, 5.0, vec![option(true), option(false)]);
        let correct1 = q1.options[0].id;
        let correct2 = q2.options[0].id;
        let map = HashMap::from([(1, q1), (2, q2)]);
        (map, correct1, correct2)
    }

    #[test]
    fn test_perfect_submission_passes() {
        let (questions, c1, c2) = two_question_bank();
        let submitted = vec![answer(1, vec![c1]), answer(2, vec![c2])];

        let outcome = grade(&submitted, &questions, 50.0).unwrap();
        assert_eq!(outcome.earned_point, 10.0);
        assert_eq!(outcome.total_point, 10.0);
        assert!(outcome.is_passed);
        assert!(outcome.answers.iter().all(|a| a.is_correct));
    }

    #[test]
    fn test_omitted_question_not_counted_in_total() {
        // Only one of the two questions is submitted; the omitted one does
        // not contribute to total_point, so one correct answer is 100%.
        let (questions, c1, _) = two_question_bank();
        let submitted = vec![answer(1, vec![c1])];

        let outcome = grade(&submitted, &questions, 50.0).unwrap();
        assert_eq!(outcome.earned_point, 5.0);
        assert_eq!(outcome.total_point, 5.0);
        assert!(outcome.is_passed);
    }

    #[test]
    fn test_wrong_option_scores_zero() {
        let (questions, _, c2) = two_question_bank();
        let wrong = questions[&1].options[1].id;
        let submitted = vec![answer(1, vec![wrong]), answer(2, vec![c2])];

        let outcome = grade(&submitted, &questions, 60.0).unwrap();
        assert_eq!(outcome.earned_point, 5.0);
        assert_eq!(outcome.total_point, 10.0);
        assert!(!outcome.is_passed);
        assert!(!outcome.answers[0].is_correct);
        assert!(outcome.answers[1].is_correct);
    }

    #[test]
    fn test_superset_selection_is_incorrect() {
        // Selecting the correct option plus an incorrect one is a mismatch.
        let (questions, c1, _) = two_question_bank();
        let wrong = questions[&1].options[1].id;
        let submitted = vec![answer(1, vec![c1, wrong])];

        let outcome = grade(&submitted, &questions, 0.0).unwrap();
        assert_eq!(outcome.earned_point, 0.0);
        assert!(!outcome.answers[0].is_correct);
    }

    #[test]
    fn test_subset_selection_is_incorrect() {
        // Multi-select question with two correct options; picking only one
        // of them is a mismatch.
        let q = question(7, 4.0, vec![option(true), option(true), option(false)]);
        let first_correct = q.options[0].id;
        let questions = HashMap::from([(7, q)]);

        let outcome = grade(&[answer(7, vec![first_correct])], &questions, 0.0).unwrap();
        assert!(!outcome.answers[0].is_correct);
        assert_eq!(outcome.earned_point, 0.0);
        assert_eq!(outcome.total_point, 4.0);
    }

    #[test]
    fn test_selection_order_is_irrelevant() {
        let q = question(7, 4.0, vec![option(true), option(true)]);
        let (a, b) = (q.options[0].id, q.options[1].id);
        let questions = HashMap::from([(7, q)]);

        let outcome = grade(&[answer(7, vec![b, a])], &questions, 100.0).unwrap();
        assert!(outcome.answers[0].is_correct);
        assert!(outcome.is_passed);
    }

    #[test]
    fn test_empty_submission_never_passes() {
        let (questions, _, _) = two_question_bank();

        let outcome = grade(&[], &questions, 0.0).unwrap();
        assert_eq!(outcome.earned_point, 0.0);
        assert_eq!(outcome.total_point, 0.0);
        assert!(!outcome.is_passed);
        assert!(outcome.answers.is_empty());
    }

    #[test]
    fn test_unknown_question_fails_grading() {
        let (questions, c1, _) = two_question_bank();
        let submitted = vec![answer(1, vec![c1]), answer(99, vec![])];

        let err = grade(&submitted, &questions, 50.0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_passing_grade_boundary_is_inclusive() {
        let (questions, c1, _) = two_question_bank();
        let wrong2 = questions[&2].options[1].id;
        let submitted = vec![answer(1, vec![c1]), answer(2, vec![wrong2])];

        // Exactly 50% earned.
        let outcome = grade(&submitted, &questions, 50.0).unwrap();
        assert!(outcome.is_passed);

        let outcome = grade(&submitted, &questions, 50.1).unwrap();
        assert!(!outcome.is_passed);
    }
}
