// src/handlers/admin.rs

use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        practice::{PracticeLedgerParams, PracticeLedgerRow},
        question::{AdminQuestion, AdminQuestionParams, Choice, CreateQuestionRequest, Question},
        user::{AdminUserRow, Gender},
    },
    utils::{json::AppJson, path::AppPath, query::AppQuery},
};

/// `%term%` for a `LIKE ... ESCAPE '\'` clause, with the term's own
/// wildcards escaped so they match literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Filters for the admin user listing.
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    /// Substring matched against username, email, first and last name.
    pub search: Option<String>,
    pub gender: Option<Gender>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

/// Lists users with optional search and exact-match filters.
/// Admin only.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT id, username, email, first_name, last_name, gender, phone_number,
               is_active, is_staff
        FROM users
        WHERE 1 = 1
        "#,
    );

    if let Some(search) = search_term(params.search.as_deref()) {
        let pattern = contains_pattern(search);
        builder.push(" AND (username LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR email LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR first_name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR last_name LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    if let Some(gender) = params.gender {
        builder.push(" AND gender = ");
        builder.push_bind(gender);
    }

    if let Some(is_active) = params.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }

    if let Some(is_staff) = params.is_staff {
        builder.push(" AND is_staff = ");
        builder.push_bind(is_staff);
    }

    builder.push(" ORDER BY id DESC");

    let users = builder
        .build_query_as::<AdminUserRow>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(users))
}

/// Lists questions with every choice and its correct-answer flag.
/// Admin only.
///
/// `search` matches a substring of the question text; `difficulty` filters by
/// exact level.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<AdminQuestionParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, text, difficulty, created_at, updated_at FROM questions WHERE 1 = 1",
    );

    if let Some(search) = search_term(params.search.as_deref()) {
        builder.push(" AND text LIKE ");
        builder.push_bind(contains_pattern(search));
        builder.push(" ESCAPE '\\'");
    }

    if let Some(difficulty) = search_term(params.difficulty.as_deref()) {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty.to_string());
    }

    builder.push(" ORDER BY id");

    let questions = builder
        .build_query_as::<Question>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if questions.is_empty() {
        return Ok(Json(Vec::<AdminQuestion>::new()));
    }

    let mut choice_query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, question_id, text, is_correct FROM choices WHERE question_id IN (",
    );
    let mut ids = choice_query.separated(", ");
    for question in &questions {
        ids.push_bind(question.id);
    }
    choice_query.push(") ORDER BY id");

    let mut by_question: HashMap<i64, Vec<Choice>> = HashMap::new();
    for choice in choice_query
        .build_query_as::<Choice>()
        .fetch_all(&pool)
        .await?
    {
        by_question.entry(choice.question_id).or_default().push(choice);
    }

    let listed: Vec<AdminQuestion> = questions
        .into_iter()
        .map(|question| {
            let choices = by_question.remove(&question.id).unwrap_or_default();
            AdminQuestion::new(question, choices)
        })
        .collect();

    Ok(Json(listed))
}

/// Creates a new quiz question together with its choices.
/// Admin only.
///
/// The question and all choices are written in one transaction, and the
/// payload must mark exactly one choice as correct.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (text, difficulty, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, text, difficulty, created_at, updated_at
        "#,
    )
    .bind(payload.text.trim())
    .bind(payload.difficulty)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut choices = Vec::with_capacity(payload.choices.len());
    for choice in &payload.choices {
        let created = sqlx::query_as::<_, Choice>(
            r#"
            INSERT INTO choices (question_id, text, is_correct)
            VALUES (?, ?, ?)
            RETURNING id, question_id, text, is_correct
            "#,
        )
        .bind(question.id)
        .bind(choice.text.trim())
        .bind(choice.is_correct)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create choice: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
        choices.push(created);
    }

    tx.commit().await?;

    tracing::info!(
        "Created {} question {} with {} choices",
        question.difficulty,
        question.id,
        choices.len()
    );

    Ok((StatusCode::CREATED, Json(AdminQuestion::new(question, choices))))
}

/// Deletes a quiz question by ID, cascading to its choices and practice rows.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tracing::info!("Deleted question {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the practice ledger across all users, newest first.
/// Admin only.
pub async fn list_practices(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<PracticeLedgerParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            p.id,
            p.user_id,
            u.username,
            p.question_id,
            q.text AS question_text,
            p.selected_choice_id,
            c.text AS choice_text,
            p.is_correct,
            p.created_at
        FROM practices p
        JOIN users u ON p.user_id = u.id
        JOIN questions q ON p.question_id = q.id
        JOIN choices c ON p.selected_choice_id = c.id
        WHERE 1 = 1
        "#,
    );

    if let Some(user_id) = params.user_id {
        builder.push(" AND p.user_id = ");
        builder.push_bind(user_id);
    }

    if let Some(question_id) = params.question_id {
        builder.push(" AND p.question_id = ");
        builder.push_bind(question_id);
    }

    if let Some(is_correct) = params.is_correct {
        builder.push(" AND p.is_correct = ");
        builder.push_bind(is_correct);
    }

    builder.push(" ORDER BY p.created_at DESC, p.id DESC");

    let rows = builder
        .build_query_as::<PracticeLedgerRow>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list practices: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(rows))
}
