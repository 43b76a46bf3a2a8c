// src/handlers/quiz_attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::quiz_attempt::{
        EndTimeQuery, ListAttemptsQuery, StartAttemptRequest, SubmitAttemptRequest,
    },
    services,
    utils::jwt::Claims,
};

/// Starts a new attempt on a quiz.
///
/// 409 while the user already has an unsubmitted, unexpired attempt on the
/// same quiz.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let attempt = services::quiz_attempt::start(&pool, user_id, payload.quiz_id).await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Submits answers for an attempt and finalizes it.
///
/// 409 when the attempt was already submitted.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let attempt =
        services::quiz_attempt::finalize(&pool, user_id, attempt_id, &payload.answers).await?;

    Ok(Json(attempt))
}

/// Lists the current user's attempts, newest first. `quiz_id` filters to one
/// quiz.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListAttemptsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let attempts = services::quiz_attempt::list(&pool, user_id, params.quiz_id).await?;

    Ok(Json(attempts))
}

/// End time of the user's active attempt on a quiz, for countdown display.
/// Returns `{"end_time": null}` when nothing is active.
pub async fn attempt_end_time(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<EndTimeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let end_time = services::quiz_attempt::active_end_time(&pool, user_id, params.quiz_id).await?;

    Ok(Json(serde_json::json!({ "end_time": end_time })))
}

/// One attempt by id, scoped to the current user. Serializes to `null` when
/// missing.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let attempt = services::quiz_attempt::get(&pool, user_id, attempt_id).await?;

    Ok(Json(attempt))
}
