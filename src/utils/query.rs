use axum::extract::FromRequestParts;

use crate::error::AppError;

/// `axum::extract::Query` whose rejection is a JSON 400 `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
