// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::QuestionInput;

/// Represents the 'quizzes' table in the database.
///
/// `questions` holds the ordered ids of this quiz's questions and always
/// matches exactly the set of question rows pointing at this quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    /// Maximum number of attempts a user may make.
    #[serde(rename = "limit")]
    pub attempt_limit: i64,

    /// Attempt duration in seconds.
    pub duration: i64,

    /// Percentage threshold (0-100) required to pass.
    pub passing_grade: f64,

    pub description: String,

    pub created_by: Option<i64>,

    /// Ordered question ids.
    pub questions: Json<Vec<i64>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a quiz together with its initial question set.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,

    #[serde(rename = "limit", default = "default_attempt_limit")]
    #[validate(range(min = 1))]
    pub attempt_limit: i64,

    /// Seconds. Zero means the attempt expires immediately, so the schema
    /// default is only useful for untimed drafts.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub duration: i64,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_grade: f64,

    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

fn default_attempt_limit() -> i64 {
    1
}

/// DTO for editing a quiz. Scalar fields are optional (unset means "keep");
/// `questions` is the full desired list and is reconciled against the
/// persisted set in one transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(rename = "limit")]
    #[validate(range(min = 1))]
    pub attempt_limit: Option<i64>,

    #[validate(range(min = 0))]
    pub duration: Option<i64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_grade: Option<f64>,

    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}
