use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("path escapes base root: {0}")]
    PathEscapesRoot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("JSON body rejected: {0}")]
    Json(#[from] axum::extract::rejection::JsonRejection),

    #[error("{0}")]
    General(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_)
            | Self::PathEscapesRoot(_)
            | Self::Multipart(_)
            | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) | Self::General(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::NOT_FOUND => {
                tracing::debug!(error = %self, "not found");
                "Not found"
            }
            StatusCode::BAD_REQUEST => {
                tracing::warn!(error = %self, "rejected request");
                "Bad request"
            }
            _ => {
                tracing::error!(error = %self, "request failed");
                "Internal Server Error"
            }
        };
        (status, body).into_response()
    }
}
