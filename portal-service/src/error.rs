use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use pena_shared::store::StoreError;
use thiserror::Error;

/// Error returned by every handler; rendered as `{"error": message}`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::not_found(format!("{} not found", what)),
            StoreError::ConditionFailed(msg) | StoreError::AlreadyExists(msg) => {
                AppError::conflict(msg)
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => {
                error!("Store failure: {}", msg);
                AppError::internal_server_error("The database request failed, please retry")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_statuses() {
        let cases = [
            (StoreError::NotFound("Crew x".into()), StatusCode::NOT_FOUND),
            (StoreError::ConditionFailed("stale".into()), StatusCode::CONFLICT),
            (StoreError::AlreadyExists("dup".into()), StatusCode::CONFLICT),
            (StoreError::Database("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (store_error, status) in cases {
            assert_eq!(AppError::from(store_error).status, status);
        }
    }
}
