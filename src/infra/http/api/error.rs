use crate::application::error::ErrorReport;
use crate::application::ingest::IngestError;
use crate::application::ledger::LedgerError;
use crate::application::normalize::NormalizeError;
use crate::application::repos::RepoError;
use axum::Json;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use deployledger_api_types::{ApiErrorBody, ApiErrorMessage};

/// Seconds a caller should wait before retrying after a transient failure.
pub const RETRY_AFTER_SECONDS: u64 = 5;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const MALFORMED_EVENT: &str = "malformed_event";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_CURSOR: &str = "invalid_cursor";
    pub const INVALID_QUERY: &str = "invalid_query";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const STORAGE_REJECTED: &str = "storage_rejected";
    pub const STORAGE_UNAVAILABLE: &str = "storage_unavailable";
    pub const TIMEOUT: &str = "timeout";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            retry_after: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn validation_failed(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION_FAILED,
            "Deployment notification failed validation",
            Some(hint.into()),
        )
    }

    pub fn malformed_event(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::MALFORMED_EVENT,
            "Deployment notification is malformed",
            Some(hint.into()),
        )
    }

    /// The store refused the event outright; resending it unchanged will fail again.
    pub fn storage_rejected(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::STORAGE_REJECTED,
            "Deployment ledger refused the notification",
            Some(hint.into()),
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn storage_unavailable(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORAGE_UNAVAILABLE,
            "Deployment ledger is temporarily unavailable",
            Some(hint.into()),
        )
        .with_retry_after(RETRY_AFTER_SECONDS)
    }

    pub fn timeout(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::TIMEOUT,
            "Ingestion did not complete in time",
            Some(hint.into()),
        )
        .with_retry_after(RETRY_AFTER_SECONDS)
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Rejected(inner @ NormalizeError::Malformed(_)) => {
                ApiError::malformed_event(inner.to_string())
            }
            IngestError::Rejected(inner) => ApiError::validation_failed(inner.to_string()),
            IngestError::Storage(RepoError::Timeout) => {
                ApiError::timeout("database did not answer in time")
            }
            IngestError::Storage(inner) if !inner.is_transient() => {
                ApiError::storage_rejected(inner.to_string())
            }
            IngestError::Storage(inner) => ApiError::storage_unavailable(inner.to_string()),
            err @ IngestError::Timeout(_) => ApiError::timeout(err.to_string()),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                "Request body exceeds the configured limit",
                Some(rejection.body_text()),
            )
        } else {
            ApiError::bad_request("Request body could not be read", Some(rejection.body_text()))
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_QUERY,
            "Invalid query parameters",
            Some(rejection.body_text()),
        )
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => ApiError::not_found("Deployment not found"),
            LedgerError::MissingParameter(_) => {
                ApiError::bad_request("Missing query parameter", Some(err.to_string()))
            }
            LedgerError::Pagination(inner) | LedgerError::Repo(RepoError::Pagination(inner)) => {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    codes::INVALID_CURSOR,
                    "Invalid cursor",
                    Some(inner.to_string()),
                )
            }
            LedgerError::Repo(RepoError::Timeout) => {
                ApiError::timeout("database did not answer in time")
            }
            LedgerError::Repo(inner) => ApiError::storage_unavailable(inner.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(seconds) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
