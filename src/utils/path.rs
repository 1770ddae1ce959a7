use axum::extract::FromRequestParts;

use crate::error::AppError;

/// `axum::extract::Path` whose rejection is an `AppError`.
/// An id segment that does not parse resolves to a JSON 404, the same as an
/// id that does not exist.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
