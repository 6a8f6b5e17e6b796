use axum::extract::FromRequest;

use crate::error::AppError;

pub mod directory_commands;
pub mod file_commands;

/// `axum::Json`, but malformed bodies are rejected through [`AppError`] so
/// clients get a plain `Bad request` instead of the deserializer's message.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
