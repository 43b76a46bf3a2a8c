// src/handlers/question.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::question::{PublicQuestion, Question},
};

#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    pub quiz_id: i64,
}

/// Lists a quiz's questions for quiz-taking clients.
///
/// The `is_correct` flag is stripped from every option so the payload never
/// leaks the answer key.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<ListQuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question, question_type, options, point, explanation, required, \
                created_at, updated_at \
         FROM questions WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(params.quiz_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let sanitized: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();

    Ok(Json(sanitized))
}
