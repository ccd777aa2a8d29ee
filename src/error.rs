// Error types for the marketplace core and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// Errors raised by the repository, selection and comparison layers.
// Every variant is scoped to the single failed operation; no state is changed.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },

    #[error("the vehicle collection is empty")]
    EmptyCollection,

    #[error("you can only compare up to {limit} vehicles")]
    CapacityExceeded { limit: usize },

    #[error("a comparison needs at least 2 vehicles, got {found}")]
    InsufficientVehicles { found: usize },

    #[error("{0}")]
    Validation(String),

    #[error("client store failure: {0}")]
    Storage(#[from] StoreError),
}

impl MarketError {
    pub fn vehicle_not_found(id: u32) -> Self {
        MarketError::NotFound { entity: "Vehicle", id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation(message.into())
    }
}

// Define a custom application error type for the HTTP layer
#[derive(Debug)]
pub enum AppError {
    Market(MarketError),
    InternalServerError(anyhow::Error),
}

impl From<MarketError> for AppError {
    fn from(error: MarketError) -> Self {
        AppError::Market(error)
    }
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Market(MarketError::Storage(e)) => {
                tracing::error!("Client store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Market(e) => {
                let status = match &e {
                    MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
                    MarketError::Validation(_) => StatusCode::BAD_REQUEST,
                    MarketError::CapacityExceeded { .. } | MarketError::EmptyCollection => {
                        StatusCode::CONFLICT
                    }
                    MarketError::InsufficientVehicles { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::warn!(status = %status, "Request failed: {}", e);
                (status, e.to_string())
            }
            AppError::InternalServerError(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
