use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::leave_application::TransitionRefused;
use crate::store::StoreError;

#[derive(Debug, Display)]
pub enum LeaveError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(&'static str),
    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Could not generate leave pass: {}", _0)]
    DependencyFailure(String),
    #[display(fmt = "storage error: {}", _0)]
    Storage(StoreError),
}

impl LeaveError {
    pub fn validation(message: impl Into<String>) -> Self {
        LeaveError::Validation(message.into())
    }
}

impl std::error::Error for LeaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeaveError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for LeaveError {
    fn from(value: StoreError) -> Self {
        LeaveError::Storage(value)
    }
}

impl From<TransitionRefused> for LeaveError {
    fn from(value: TransitionRefused) -> Self {
        LeaveError::Conflict(value.to_string())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Conflict(_) => StatusCode::CONFLICT,
            LeaveError::DependencyFailure(_) => StatusCode::BAD_GATEWAY,
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Storage(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
