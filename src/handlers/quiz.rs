// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, UpdateQuizRequest},
    services,
    utils::jwt::Claims,
};

/// Creates a quiz with its initial question set.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let author_id = claims.sub.parse::<i64>().unwrap_or(0);

    let quiz = services::quiz::create(&pool, author_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Edits a quiz: patches scalar fields and reconciles the persisted question
/// set against the submitted list in one transaction.
/// Admin only.
pub async fn sync_quiz(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question_ids = services::quiz::sync(&pool, quiz_id, &payload).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "questions": question_ids
    })))
}
