// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

/// Question type: 'true_false' (default) or 'multi_select'. Both grade with
/// the same exact-set-match rule, so the type only matters to clients.
pub const TYPE_TRUE_FALSE: &str = "true_false";
pub const TYPE_MULTI_SELECT: &str = "multi_select";

/// One selectable option, embedded in a question's `options` JSONB array.
/// The uuid identifies the option across edits and in answer records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning quiz. Nullable in the schema, but every question written by
    /// this service carries the quiz id from the moment it is inserted.
    pub quiz_id: Option<i64>,

    /// The question text.
    pub question: String,

    pub question_type: String,

    /// Ordered list of options. Stored as a JSONB array.
    pub options: Json<Vec<QuestionOption>>,

    /// Points awarded when answered correctly. Always positive.
    pub point: f64,

    /// Explanation shown after grading.
    pub explanation: Option<String>,

    /// Whether the question must be answered.
    pub required: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// Ids of all options flagged correct, as a set.
    pub fn correct_option_ids(&self) -> HashSet<Uuid> {
        self.options
            .iter()
            .filter(|opt| opt.is_correct)
            .map(|opt| opt.id)
            .collect()
    }
}

/// DTO for sending options to quiz-taking clients (excludes `is_correct`).
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: Uuid,
    pub text: String,
}

/// DTO for sending questions to quiz-taking clients.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub quiz_id: Option<i64>,
    pub question: String,
    pub question_type: String,
    pub options: Vec<PublicOption>,
    pub point: f64,
    pub explanation: Option<String>,
    pub required: bool,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            quiz_id: q.quiz_id,
            question: q.question,
            question_type: q.question_type,
            options: q
                .options
                .0
                .into_iter()
                .map(|opt| PublicOption {
                    id: opt.id,
                    text: opt.text,
                })
                .collect(),
            point: q.point,
            explanation: q.explanation,
            required: q.required,
        }
    }
}

/// DTO for one option inside a quiz create/edit payload.
/// Entries without an id get a fresh uuid on write; entries carrying an id
/// keep it, so answer references survive edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionInput {
    pub id: Option<Uuid>,
    pub text: String,
    pub is_correct: bool,
}

/// DTO for one question inside a quiz create/edit payload.
/// An id means "update this persisted question"; no id means "insert".
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionInput {
    pub id: Option<i64>,

    #[validate(length(min = 1, max = 2000))]
    pub question: String,

    #[serde(default = "default_question_type")]
    #[validate(custom(function = validate_question_type))]
    pub question_type: String,

    #[validate(custom(function = validate_options))]
    pub options: Vec<OptionInput>,

    #[validate(range(exclusive_min = 0.0, message = "Point value must be positive."))]
    pub point: f64,

    #[validate(length(max = 2000))]
    pub explanation: Option<String>,

    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_question_type() -> String {
    TYPE_TRUE_FALSE.to_string()
}

fn default_required() -> bool {
    true
}

fn validate_question_type(question_type: &str) -> Result<(), validator::ValidationError> {
    if question_type != TYPE_TRUE_FALSE && question_type != TYPE_MULTI_SELECT {
        return Err(validator::ValidationError::new("unknown_question_type"));
    }
    Ok(())
}

fn validate_options(options: &[OptionInput]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.text.is_empty() || opt.text.len() > 500 {
            return Err(validator::ValidationError::new("option_text_length"));
        }
    }
    Ok(())
}

impl QuestionInput {
    /// Materializes the submitted options, assigning uuids where missing.
    pub fn materialized_options(&self) -> Vec<QuestionOption> {
        self.options
            .iter()
            .map(|opt| QuestionOption {
                id: opt.id.unwrap_or_else(Uuid::new_v4),
                text: opt.text.clone(),
                is_correct: opt.is_correct,
            })
            .collect()
    }
}
