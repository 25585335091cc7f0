use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Model file not found at '{0}'. Make sure the trained model is in place or point PHISHING_DETECTOR_MODEL_PATH at it")]
    ModelNotFound(String),

    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Model inference error: {0}")]
    ModelInference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ModelInference(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            _ => {
                tracing::error!("Internal server error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Helper function for creating validation errors
pub fn validation_error(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}

// Helper function for creating inference errors
pub fn inference_error(msg: impl Into<String>) -> AppError {
    AppError::ModelInference(msg.into())
}
