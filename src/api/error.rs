use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::portfolio::PortfolioError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// API 錯誤，回應為單一狀態碼加上 `{ "error": ... }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PortfolioError> for ApiError {
    fn from(err: PortfolioError) -> Self {
        let status = match &err {
            PortfolioError::PortfolioNotFound(_)
            | PortfolioError::HoldingNotFound(_)
            | PortfolioError::ConstituentNotFound(_) => StatusCode::NOT_FOUND,
            PortfolioError::InvalidInput(_) | PortfolioError::QuoteUnavailable { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PortfolioError::TransactionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            PortfolioError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "請求處理失敗");
        } else {
            debug!(status = self.status.as_u16(), error = %self.message, "請求被拒絕");
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PortfolioError::PortfolioNotFound(1), StatusCode::NOT_FOUND)]
    #[case(PortfolioError::HoldingNotFound(1), StatusCode::NOT_FOUND)]
    #[case(PortfolioError::InvalidInput("x".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(
        PortfolioError::QuoteUnavailable { ticker: "X".into(), reason: "down".into() },
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(PortfolioError::TransactionFailed("x".into()), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(PortfolioError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] err: PortfolioError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(err).status, expected);
    }
}
