use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cashpoint_core::AtmId;
use cashpoint_infra::ServiceError;

fn classify(err: &ServiceError) -> (StatusCode, &'static str) {
    match err {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ServiceError::EmptyDeposit => (StatusCode::BAD_REQUEST, "invalid_body"),
        ServiceError::InvalidDenominations(_) => (StatusCode::BAD_REQUEST, "invalid_denominations"),
        ServiceError::DepositOverflow(_) => (StatusCode::BAD_REQUEST, "deposit_overflow"),
        ServiceError::AmountOutOfRange { .. } => (StatusCode::BAD_REQUEST, "invalid_amount"),
        ServiceError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "insufficient_funds"),
        ServiceError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        ServiceError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let (status, code) = classify(&err);
    json_error(status, code, err.to_string())
}

/// Withdrawal failures also carry an empty `result`, so callers can always read
/// the dispensed notes from the same field.
pub fn withdraw_error_to_response(err: ServiceError) -> axum::response::Response {
    let (status, code) = classify(&err);
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": err.to_string(),
            "result": {},
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_atm_id(s: &str) -> Result<AtmId, axum::response::Response> {
    s.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid atm id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashpoint_core::DomainError;
    use cashpoint_infra::StoreError;

    #[test]
    fn maps_each_service_error_to_a_status() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::EmptyDeposit, StatusCode::BAD_REQUEST),
            (
                ServiceError::DepositOverflow(DomainError::invariant("count of 50s would overflow")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::AmountOutOfRange { amount: 0, min: 1, max: 1000 },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::InsufficientFunds { requested: 10, total: 5 },
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::Conflict("stale".into()), StatusCode::CONFLICT),
            (
                ServiceError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(parse_atm_id("not-a-uuid").is_err());
        assert!(parse_atm_id(&AtmId::new().to_string()).is_ok());
    }
}
