// src/services/quiz.rs
//
// Quiz authoring and the quiz/question sync transaction.

use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::AppError;
use crate::models::quiz::{CreateQuizRequest, Quiz, UpdateQuizRequest};

const QUIZ_COLUMNS: &str = "id, title, attempt_limit, duration, passing_grade, description, \
     created_by, questions, created_at, updated_at";

/// Creates a quiz together with its initial question set.
///
/// Runs as a single transaction: the quiz row is inserted first so every
/// question row can reference it directly, then the ordered id list is
/// written back to `quizzes.questions`. No backfill pass, and a failure
/// anywhere leaves nothing behind.
pub async fn create(
    pool: &PgPool,
    author_id: i64,
    draft: &CreateQuizRequest,
) -> Result<Quiz, AppError> {
    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO quizzes (title, attempt_limit, duration, passing_grade, description, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&draft.title)
    .bind(draft.attempt_limit)
    .bind(draft.duration)
    .bind(draft.passing_grade)
    .bind(&draft.description)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut question_ids = Vec::with_capacity(draft.questions.len());

    for entry in &draft.questions {
        let options = entry.materialized_options();

        let question_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO questions \
                 (quiz_id, question, question_type, options, point, explanation, required) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(quiz_id)
        .bind(&entry.question)
        .bind(&entry.question_type)
        .bind(Json(&options))
        .bind(entry.point)
        .bind(&entry.explanation)
        .bind(entry.required)
        .fetch_one(&mut *tx)
        .await?;

        question_ids.push(question_id);
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET questions = $1 WHERE id = $2 RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(Json(&question_ids))
    .bind(quiz_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Created quiz {} with {} questions",
        quiz.id,
        question_ids.len()
    );

    Ok(quiz)
}

/// Reconciles a quiz against a desired full question list, atomically.
///
/// Within one transaction: scalar quiz fields are patched; each desired
/// entry updates its persisted question (when it carries an id) or inserts a
/// new one; every persisted question of this quiz that the caller omitted is
/// deleted; `quizzes.questions` is set to exactly the kept ids in supplied
/// order. Any failure aborts the transaction, so readers observe the old
/// question set or the new one, never a mix.
///
/// Returns the kept question ids.
pub async fn sync(
    pool: &PgPool,
    quiz_id: i64,
    patch: &UpdateQuizRequest,
) -> Result<Vec<i64>, AppError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE quizzes SET \
             title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             attempt_limit = COALESCE($3, attempt_limit), \
             duration = COALESCE($4, duration), \
             passing_grade = COALESCE($5, passing_grade), \
             updated_at = now() \
         WHERE id = $6",
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.attempt_limit)
    .bind(patch.duration)
    .bind(patch.passing_grade)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let mut kept_ids = Vec::with_capacity(patch.questions.len());

    for entry in &patch.questions {
        let options = entry.materialized_options();

        if let Some(question_id) = entry.id {
            // Existing question: update in place, scoped to this quiz.
            let result = sqlx::query(
                "UPDATE questions SET \
                     question = $1, question_type = $2, options = $3, point = $4, \
                     explanation = $5, required = $6, updated_at = now() \
                 WHERE id = $7 AND quiz_id = $8",
            )
            .bind(&entry.question)
            .bind(&entry.question_type)
            .bind(Json(&options))
            .bind(entry.point)
            .bind(&entry.explanation)
            .bind(entry.required)
            .bind(question_id)
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "Question {} does not belong to quiz {}",
                    question_id, quiz_id
                )));
            }

            kept_ids.push(question_id);
        } else {
            // New question: insert.
            let question_id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO questions \
                     (quiz_id, question, question_type, options, point, explanation, required) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
            )
            .bind(quiz_id)
            .bind(&entry.question)
            .bind(&entry.question_type)
            .bind(Json(&options))
            .bind(entry.point)
            .bind(&entry.explanation)
            .bind(entry.required)
            .fetch_one(&mut *tx)
            .await?;

            kept_ids.push(question_id);
        }
    }

    // Drop every question of this quiz the caller omitted.
    sqlx::query("DELETE FROM questions WHERE quiz_id = $1 AND NOT (id = ANY($2))")
        .bind(quiz_id)
        .bind(&kept_ids)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE quizzes SET questions = $1, updated_at = now() WHERE id = $2")
        .bind(Json(&kept_ids))
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Synced quiz {}: {} questions kept", quiz_id, kept_ids.len());

    Ok(kept_ids)
}
