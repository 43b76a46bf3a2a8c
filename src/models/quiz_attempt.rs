// src/models/quiz_attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;

/// One graded answer, embedded in the attempt's `answers` JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Referenced question id (non-owning).
    pub question: i64,
    pub selected_answers: Vec<Uuid>,
    pub is_correct: bool,
}

/// Represents the 'quiz_attempts' table in the database.
///
/// An attempt is ACTIVE while `is_submitted` is false and `end_time` lies in
/// the future. Finalization flips `is_submitted` exactly once; after that the
/// record is immutable. An attempt that outlives its `end_time` without being
/// submitted stays persisted unchanged, it merely stops blocking new starts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,

    pub answers: Json<Vec<AnswerRecord>>,

    pub earned_point: f64,
    pub total_point: f64,

    /// Whole seconds between start and finalization.
    pub time_taken: i64,

    pub is_passed: bool,

    /// Snapshot of the quiz's passing grade taken at start time. Later quiz
    /// edits must not affect in-flight or completed attempts.
    pub passing_grade: f64,

    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,

    pub is_submitted: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize)]
pub struct StartAttemptRequest {
    pub quiz_id: i64,
}

/// One submitted answer in a finalize payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub selected_answers: Vec<Uuid>,
}

/// DTO for finalizing an attempt. An empty list is allowed and grades to an
/// automatic fail.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Query parameters for listing attempts.
#[derive(Debug, Deserialize)]
pub struct ListAttemptsQuery {
    pub quiz_id: Option<i64>,
}

/// Query parameters for the active end-time lookup.
#[derive(Debug, Deserialize)]
pub struct EndTimeQuery {
    pub quiz_id: i64,
}
