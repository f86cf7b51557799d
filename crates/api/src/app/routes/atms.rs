use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use cashpoint_core::AtmId;
use cashpoint_infra::WithdrawOutcome;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(open_atm))
        .route("/:id", get(get_atm))
        .route("/:id/add_banknotes", put(add_banknotes))
        .route("/:id/withdraw_banknotes", get(withdraw_banknotes))
}

pub async fn open_atm(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.atms().open().await {
        Ok(atm) => (StatusCode::CREATED, Json(dto::atm_to_json(&atm))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_atm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_atm_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.atms().get(id).await {
        Ok(atm) => (StatusCode::OK, Json(dto::atm_to_json(&atm))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_banknotes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::AddBanknotesRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match errors::parse_atm_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            // An unknown unit is reported before a bad payload.
            if let Err(resp) = ensure_exists(&services, id).await {
                return resp;
            }
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    match services.atms().add_banknotes(id, &body.banknotes).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "banknotes added" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn withdraw_banknotes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<dto::WithdrawQuery>, QueryRejection>,
) -> axum::response::Response {
    let id = match errors::parse_atm_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let amount = match query {
        Ok(Query(q)) => q.amount,
        Err(rejection) => {
            if let Err(resp) = ensure_exists(&services, id).await {
                return resp;
            }
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                rejection.body_text(),
            );
        }
    };

    match services.atms().withdraw(id, amount).await {
        Ok(WithdrawOutcome::Dispensed { plan, .. }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "result": plan,
                "message": "banknotes withdrawn",
            })),
        )
            .into_response(),
        Ok(WithdrawOutcome::Infeasible { available }) => {
            let listed = available
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "result": {},
                    "message": format!(
                        "cannot dispense {amount} with the banknotes on hand; available denominations: [{listed}]"
                    ),
                })),
            )
                .into_response()
        }
        Err(e) => errors::withdraw_error_to_response(e),
    }
}

async fn ensure_exists(services: &AppServices, id: AtmId) -> Result<(), axum::response::Response> {
    services
        .atms()
        .get(id)
        .await
        .map(|_| ())
        .map_err(errors::service_error_to_response)
}
