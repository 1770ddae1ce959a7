// src/models/question.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::utils::validate::validate_not_blank;

/// Closed set of difficulty levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents the 'choices' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Question as shown in listings and nested in practice history.
#[derive(Debug, Serialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub text: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for QuestionSummary {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            difficulty: q.difficulty,
            created_at: q.created_at,
        }
    }
}

/// DTO for sending a choice to quiz takers (excludes `is_correct`).
#[derive(Debug, Serialize)]
pub struct PublicChoice {
    pub id: i64,
    pub text: String,
}

impl From<Choice> for PublicChoice {
    fn from(c: Choice) -> Self {
        Self {
            id: c.id,
            text: c.text,
        }
    }
}

/// Question detail with its choices in insertion order.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub text: String,
    pub difficulty: Difficulty,
    pub choices: Vec<PublicChoice>,
    pub created_at: DateTime<Utc>,
}

impl QuestionDetail {
    pub fn new(question: Question, choices: Vec<Choice>) -> Self {
        Self {
            id: question.id,
            text: question.text,
            difficulty: question.difficulty,
            choices: choices.into_iter().map(PublicChoice::from).collect(),
            created_at: question.created_at,
        }
    }
}

/// Query parameters of the question listing.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionListParams {
    pub difficulty: Option<String>,
}

impl QuestionListParams {
    /// Empty or absent means "no filter". Any other value is matched exactly
    /// against the stored level, so an unknown level simply matches nothing.
    pub fn difficulty_filter(&self) -> Option<&str> {
        self.difficulty
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }
}

/// DTO for a single choice inside an admin question payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateChoiceRequest {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question together with its choices.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(
        length(min = 1, max = 5000, message = "Ensure this field has between 1 and 5000 characters."),
        custom(function = validate_not_blank)
    )]
    pub text: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(custom(function = validate_choice_set))]
    pub choices: Vec<CreateChoiceRequest>,
}

/// At least two non-blank choices of at most 200 characters, exactly one of
/// them marked correct.
fn validate_choice_set(choices: &[CreateChoiceRequest]) -> Result<(), validator::ValidationError> {
    if choices
        .iter()
        .any(|c| c.text.trim().is_empty() || c.text.chars().count() > 200)
    {
        return Err(validator::ValidationError::new("invalid_choice_text")
            .with_message("Choice text must have between 1 and 200 characters.".into()));
    }
    if choices.len() < 2 {
        return Err(validator::ValidationError::new("too_few_choices")
            .with_message("A question needs at least two choices.".into()));
    }
    let correct = choices.iter().filter(|c| c.is_correct).count();
    if correct != 1 {
        return Err(validator::ValidationError::new("correct_choice_count")
            .with_message("Exactly one choice must be marked correct.".into()));
    }
    Ok(())
}

/// Admin view of a question, answer flags included.
#[derive(Debug, Serialize)]
pub struct AdminQuestion {
    pub id: i64,
    pub text: String,
    pub difficulty: Difficulty,
    pub choices: Vec<Choice>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminQuestion {
    pub fn new(question: Question, choices: Vec<Choice>) -> Self {
        Self {
            id: question.id,
            text: question.text,
            difficulty: question.difficulty,
            choices,
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }
}

/// Filters for the admin question listing.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuestionParams {
    /// Substring matched against the question text.
    pub search: Option<String>,
    /// Exact stored level; empty means no filter.
    pub difficulty: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question() -> Question {
        let now = Utc::now();
        Question {
            id: 3,
            text: "2 + 2?".into(),
            difficulty: Difficulty::Easy,
            created_at: now,
            updated_at: now,
        }
    }

    fn choice(id: i64, is_correct: bool) -> Choice {
        Choice {
            id,
            question_id: 3,
            text: format!("choice {}", id),
            is_correct,
        }
    }

    #[test]
    fn difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn difficulty_filter_policy() {
        let params = |v: Option<&str>| QuestionListParams {
            difficulty: v.map(String::from),
        };

        assert_eq!(params(None).difficulty_filter(), None);
        assert_eq!(params(Some("")).difficulty_filter(), None);
        assert_eq!(params(Some(" ")).difficulty_filter(), None);
        assert_eq!(params(Some("easy")).difficulty_filter(), Some("easy"));
        assert_eq!(params(Some("impossible")).difficulty_filter(), Some("impossible"));
    }

    #[test]
    fn detail_choices_hide_correct_flag() {
        let detail = QuestionDetail::new(question(), vec![choice(1, true), choice(2, false)]);
        let value = serde_json::to_value(&detail).unwrap();

        for c in value["choices"].as_array().unwrap() {
            assert!(c.get("is_correct").is_none());
        }
        assert_eq!(value["difficulty"], json!("easy"));
        assert_eq!(value["choices"][0]["id"], json!(1));
    }

    #[test]
    fn choice_set_needs_exactly_one_correct() {
        let build = |flags: &[bool]| CreateQuestionRequest {
            text: "Q".into(),
            difficulty: Difficulty::Hard,
            choices: flags
                .iter()
                .map(|&is_correct| CreateChoiceRequest {
                    text: "c".into(),
                    is_correct,
                })
                .collect(),
        };

        assert!(build(&[true, false]).validate().is_ok());
        assert!(build(&[false, false]).validate().is_err());
        assert!(build(&[true, true, false]).validate().is_err());
        assert!(build(&[true]).validate().is_err());
    }

    #[test]
    fn choice_text_is_bounded() {
        let req = CreateQuestionRequest {
            text: "Q".into(),
            difficulty: Difficulty::Easy,
            choices: vec![
                CreateChoiceRequest {
                    text: "x".repeat(201),
                    is_correct: true,
                },
                CreateChoiceRequest {
                    text: "ok".into(),
                    is_correct: false,
                },
            ],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_question_difficulty_is_optional() {
        let req: CreateQuestionRequest = serde_json::from_value(json!({
            "text": "Capital of France?",
            "choices": [{"text": "Paris", "is_correct": true}, {"text": "Rome"}]
        }))
        .unwrap();

        assert_eq!(req.difficulty, Difficulty::Medium);
        assert!(req.validate().is_ok());
    }
}
