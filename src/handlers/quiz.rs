// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, FieldErrors},
    models::{
        practice::{
            Practice, PracticeHistoryEntry, PracticeHistoryRow, SubmitAnswerRequest, SubmitAnswerResponse,
        },
        question::{Choice, Question, QuestionDetail, QuestionListParams, QuestionSummary},
    },
    utils::{json::AppJson, jwt::Claims, path::AppPath, query::AppQuery},
};

async fn find_question(pool: &SqlitePool, id: i64) -> Result<Question, AppError> {
    sqlx::query_as::<_, Question>(
        "SELECT id, text, difficulty, created_at, updated_at FROM questions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
}

/// Lists questions, optionally filtered by `?difficulty=`.
///
/// An empty value means no filter; a value outside easy/medium/hard matches
/// no question and yields an empty list.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, text, difficulty, created_at, updated_at FROM questions",
    );
    if let Some(difficulty) = params.difficulty_filter() {
        builder.push(" WHERE difficulty = ");
        builder.push_bind(difficulty.to_string());
    }
    builder.push(" ORDER BY id");

    let questions: Vec<QuestionSummary> = builder
        .build_query_as::<Question>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .into_iter()
        .map(QuestionSummary::from)
        .collect();

    Ok(Json(questions))
}

/// Returns one question with its choices. Correct-answer flags are not exposed.
pub async fn get_question(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = find_question(&pool, id).await?;

    let choices = sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, text, is_correct FROM choices WHERE question_id = ? ORDER BY id",
    )
    .bind(question.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuestionDetail::new(question, choices)))
}

/// Records an answer attempt for the current user.
///
/// * The selected choice must belong to the question in the path.
/// * `is_correct` is copied from the choice at this moment and stored.
/// * Repeated submissions are allowed; each one is a new practice row.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppPath(question_id): AppPath<i64>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let choice_id = req.choice_id.ok_or_else(|| {
        AppError::Validation(FieldErrors::single("choice_id", "This field is required."))
    })?;
    let user_id = claims.user_id()?;

    let question = find_question(&pool, question_id).await?;

    let choice = sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, text, is_correct FROM choices WHERE id = ?",
    )
    .bind(choice_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Choice not found".to_string()))?;

    if choice.question_id != question.id {
        return Err(AppError::BadRequest(
            "Choice does not belong to this question".to_string(),
        ));
    }

    let practice = sqlx::query_as::<_, Practice>(
        r#"
        INSERT INTO practices (user_id, question_id, selected_choice_id, is_correct, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, question_id, selected_choice_id, is_correct, created_at
        "#,
    )
    .bind(user_id)
    .bind(question.id)
    .bind(choice.id)
    .bind(choice.is_correct)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record practice: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::debug!(
        "Practice {} recorded for user {} on question {}",
        practice.id,
        practice.user_id,
        practice.question_id
    );

    Ok(Json(SubmitAnswerResponse {
        is_correct: practice.is_correct,
        message: "Answer submitted successfully".to_string(),
    }))
}

/// Lists the current user's practice attempts, newest first.
pub async fn practice_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let history: Vec<PracticeHistoryEntry> = sqlx::query_as::<_, PracticeHistoryRow>(
        r#"
        SELECT
            p.id,
            p.is_correct,
            p.created_at,
            q.id AS question_id,
            q.text AS question_text,
            q.difficulty AS question_difficulty,
            q.created_at AS question_created_at,
            c.id AS choice_id,
            c.text AS choice_text
        FROM practices p
        JOIN questions q ON p.question_id = q.id
        JOIN choices c ON p.selected_choice_id = c.id
        WHERE p.user_id = ?
        ORDER BY p.created_at DESC, p.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch practice history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .into_iter()
    .map(PracticeHistoryEntry::from)
    .collect();

    Ok(Json(history))
}
