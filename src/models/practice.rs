// src/models/practice.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::{Difficulty, PublicChoice, QuestionSummary};

/// Represents the 'practices' table in the database.
/// One immutable answer attempt; `is_correct` is copied from the choice when written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Practice {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub selected_choice_id: i64,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Flat row of `practices` joined with its question and selected choice.
#[derive(Debug, FromRow)]
pub struct PracticeHistoryRow {
    pub id: i64,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
    pub question_id: i64,
    pub question_text: String,
    pub question_difficulty: Difficulty,
    pub question_created_at: DateTime<Utc>,
    pub choice_id: i64,
    pub choice_text: String,
}

/// One entry of the practice history, question and choice expanded.
#[derive(Debug, Serialize)]
pub struct PracticeHistoryEntry {
    pub id: i64,
    pub question: QuestionSummary,
    pub selected_choice: PublicChoice,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PracticeHistoryRow> for PracticeHistoryEntry {
    fn from(row: PracticeHistoryRow) -> Self {
        Self {
            id: row.id,
            question: QuestionSummary {
                id: row.question_id,
                text: row.question_text,
                difficulty: row.question_difficulty,
                created_at: row.question_created_at,
            },
            selected_choice: PublicChoice {
                id: row.choice_id,
                text: row.choice_text,
            },
            is_correct: row.is_correct,
            created_at: row.created_at,
        }
    }
}

/// Admin view of one ledger row, with who answered what.
#[derive(Debug, FromRow, Serialize)]
pub struct PracticeLedgerRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub question_id: i64,
    pub question_text: String,
    pub selected_choice_id: i64,
    pub choice_text: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Filters for the admin ledger listing.
#[derive(Debug, Default, Deserialize)]
pub struct PracticeLedgerParams {
    pub user_id: Option<i64>,
    pub question_id: Option<i64>,
    pub is_correct: Option<bool>,
}

/// DTO for submitting an answer.
/// `choice_id` stays optional so a missing key maps to a field error.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub choice_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_entry_nests_question_and_choice() {
        let now = Utc::now();
        let entry = PracticeHistoryEntry::from(PracticeHistoryRow {
            id: 10,
            is_correct: false,
            created_at: now,
            question_id: 2,
            question_text: "Largest planet?".into(),
            question_difficulty: Difficulty::Hard,
            question_created_at: now,
            choice_id: 5,
            choice_text: "Mars".into(),
        });
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["question"]["id"], json!(2));
        assert_eq!(value["question"]["difficulty"], json!("hard"));
        assert_eq!(value["selected_choice"], json!({"id": 5, "text": "Mars"}));
        assert_eq!(value["is_correct"], json!(false));
    }

    #[test]
    fn submit_request_tolerates_missing_choice() {
        let req: SubmitAnswerRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.choice_id.is_none());
        assert!(serde_json::from_value::<SubmitAnswerRequest>(json!({"choice_id": "x"})).is_err());
    }
}
