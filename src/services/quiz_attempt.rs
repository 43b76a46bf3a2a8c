// src/services/quiz_attempt.rs
//
// Attempt lifecycle: start (single-active-attempt invariant), finalize
// (terminal submit transition), and the read-side lookups.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::{QuizAttempt, SubmittedAnswer};
use crate::services::grading;

const ATTEMPT_COLUMNS: &str = "id, quiz_id, user_id, answers, earned_point, total_point, \
     time_taken, is_passed, passing_grade, start_time, end_time, is_submitted, created_at";

const QUIZ_COLUMNS: &str = "id, title, attempt_limit, duration, passing_grade, description, \
     created_by, questions, created_at, updated_at";

const QUESTION_COLUMNS: &str =
    "id, quiz_id, question, question_type, options, point, explanation, required, \
     created_at, updated_at";

/// Starts a new attempt for (user, quiz).
///
/// Fails with `Conflict` while an unsubmitted, unexpired attempt exists for
/// the pair, and with `NotFound` for a missing quiz. The check and the insert
/// run under a per-(user, quiz) advisory transaction lock, so two concurrent
/// starts cannot both pass the check.
pub async fn start(pool: &PgPool, user_id: i64, quiz_id: i64) -> Result<QuizAttempt, AppError> {
    let mut tx = pool.begin().await?;

    // Serializes concurrent starts for the same pair; released at commit or
    // rollback.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
        .bind(user_id)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();

    let active = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM quiz_attempts \
         WHERE user_id = $1 AND quiz_id = $2 AND NOT is_submitted AND end_time > $3",
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    if active.is_some() {
        return Err(AppError::Conflict(
            "There is a quiz attempt in progress".to_string(),
        ));
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
    ))
    .bind(quiz_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let start_time = now;
    let end_time = start_time + Duration::seconds(quiz.duration);

    // passing_grade is snapshotted here; later quiz edits must not affect
    // this attempt.
    let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts \
             (quiz_id, user_id, answers, earned_point, total_point, time_taken, \
              is_passed, passing_grade, start_time, end_time, is_submitted) \
         VALUES ($1, $2, '[]'::jsonb, 0, 0, 0, FALSE, $3, $4, $5, FALSE) \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(quiz_id)
    .bind(user_id)
    .bind(quiz.passing_grade)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Started attempt {} for user {} on quiz {}",
        attempt.id,
        user_id,
        quiz_id
    );

    Ok(attempt)
}

/// Finalizes an attempt: grades the submission and writes the terminal state.
///
/// `NotFound` when the attempt is missing or owned by someone else;
/// `Conflict` when it was already submitted. The update itself is guarded
/// with `AND NOT is_submitted`, so a lost finalize race also surfaces as
/// `Conflict` instead of overwriting the aggregates.
pub async fn finalize(
    pool: &PgPool,
    user_id: i64,
    attempt_id: i64,
    submitted: &[SubmittedAnswer],
) -> Result<QuizAttempt, AppError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 AND user_id = $2"
    ))
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))?;

    if attempt.is_submitted {
        return Err(AppError::Conflict(
            "Quiz attempt already submitted".to_string(),
        ));
    }

    let questions = load_questions(pool, submitted).await?;
    let outcome = grading::grade(submitted, &questions, attempt.passing_grade)?;

    // Real elapsed time in whole seconds. A late finalize is accepted and
    // records the actual overrun rather than clamping to end_time.
    let time_taken = (Utc::now() - attempt.start_time).num_seconds();

    let updated = sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts \
         SET answers = $1, earned_point = $2, total_point = $3, is_passed = $4, \
             time_taken = $5, is_submitted = TRUE \
         WHERE id = $6 AND user_id = $7 AND NOT is_submitted \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(Json(&outcome.answers))
    .bind(outcome.earned_point)
    .bind(outcome.total_point)
    .bind(outcome.is_passed)
    .bind(time_taken)
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Quiz attempt already submitted".to_string()))?;

    tracing::info!(
        "Finalized attempt {}: {}/{} points, passed={}",
        attempt_id,
        updated.earned_point,
        updated.total_point,
        updated.is_passed
    );

    Ok(updated)
}

/// End time of the user's active (unsubmitted, unexpired) attempt on a quiz,
/// for countdown display. `None` when nothing is active.
pub async fn active_end_time(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let end_time = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT end_time FROM quiz_attempts \
         WHERE user_id = $1 AND quiz_id = $2 AND NOT is_submitted AND end_time > $3 \
         ORDER BY end_time DESC LIMIT 1",
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(end_time)
}

/// All attempts of a user, newest first, optionally filtered by quiz.
pub async fn list(
    pool: &PgPool,
    user_id: i64,
    quiz_id: Option<i64>,
) -> Result<Vec<QuizAttempt>, AppError> {
    let mut query_builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE user_id = "
    ));
    query_builder.push_bind(user_id);

    if let Some(quiz_id) = quiz_id {
        query_builder.push(" AND quiz_id = ");
        query_builder.push_bind(quiz_id);
    }

    query_builder.push(" ORDER BY created_at DESC");

    let attempts = query_builder
        .build_query_as::<QuizAttempt>()
        .fetch_all(pool)
        .await?;

    Ok(attempts)
}

/// One attempt by id, scoped to its owner. `None` when missing or foreign.
pub async fn get(
    pool: &PgPool,
    user_id: i64,
    attempt_id: i64,
) -> Result<Option<QuizAttempt>, AppError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 AND user_id = $2"
    ))
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

/// Loads the questions referenced by a submission, keyed by id.
async fn load_questions(
    pool: &PgPool,
    submitted: &[SubmittedAnswer],
) -> Result<HashMap<i64, Question>, AppError> {
    let ids: Vec<i64> = submitted.iter().map(|a| a.question_id).collect();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    // Dynamic IN clause
    let mut query_builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id IN ("
    ));

    let mut separated = query_builder.separated(",");
    for id in &ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let questions: Vec<Question> = query_builder.build_query_as().fetch_all(pool).await?;

    Ok(questions.into_iter().map(|q| (q.id, q)).collect())
}
