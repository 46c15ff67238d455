//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, LedgerError};
use event_store::EventStoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// No acting identity was supplied.
    Unauthorized(String),
    /// The ledger rejected the operation.
    Ledger(LedgerError),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Ledger(err) => ledger_error_to_response(&err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
        };

        let body = serde_json::json!({ "error": message, "reason": reason });
        (status, axum::Json(body)).into_response()
    }
}

fn ledger_error_to_response(err: &LedgerError) -> (StatusCode, &'static str, String) {
    let status = match err {
        LedgerError::ProductNotFound { .. } | LedgerError::ItemNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        LedgerError::NotOwner { .. } | LedgerError::NotRegistered { .. } => StatusCode::FORBIDDEN,
        LedgerError::AlreadyRegistered { .. } | LedgerError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        LedgerError::LengthMismatch { .. }
        | LedgerError::CountOutOfRange { .. }
        | LedgerError::EmptyBatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.reason(), err.to_string())
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, &'static str, String) {
    match err {
        DomainError::Ledger(ledger_err) => ledger_error_to_response(&ledger_err),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => (
            StatusCode::CONFLICT,
            "concurrency_conflict",
            err.to_string(),
        ),
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<projections::ProjectionError> for ApiError {
    fn from(err: projections::ProjectionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ManufacturerId, ProductId};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_ledger_status_codes() {
        let identity = ManufacturerId::new("M1");
        assert_eq!(
            status_of(
                LedgerError::ProductNotFound {
                    product_id: ProductId::new(1)
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                LedgerError::NotOwner {
                    product_id: ProductId::new(1),
                    identity: identity.clone(),
                    action: "add",
                }
                .into()
            ),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(LedgerError::AlreadyRegistered { identity }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LedgerError::CountOutOfRange { count: 11 }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_domain_wrapping_keeps_ledger_status() {
        let err = DomainError::Ledger(LedgerError::EmptyBatch { action: "sold" });
        assert_eq!(status_of(err.into()), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_concurrency_conflict_is_conflict() {
        let err = DomainError::EventStore(EventStoreError::ConcurrencyConflict {
            expected: event_store::Sequence::new(1),
            actual: event_store::Sequence::new(2),
        });
        assert_eq!(status_of(err.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        assert_eq!(
            status_of(ApiError::Unauthorized("missing x-actor-id".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }
}
