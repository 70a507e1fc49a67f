use axum::response::{IntoResponse, Response};
use http::StatusCode;
use sched_core::EngineError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match e {
            EngineError::NoVenues | EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::Remote(_) | EngineError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            EngineError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<EngineError>() {
            Ok(engine) => engine.into(),
            Err(other) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let invalid = ApiError::from(EngineError::InvalidRequest("window too long".into()));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert!(invalid.message.contains("window too long"));

        let remote = ApiError::from(anyhow::Error::new(EngineError::Remote("timeout".into())));
        assert_eq!(remote.status, StatusCode::BAD_GATEWAY);

        let other = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
