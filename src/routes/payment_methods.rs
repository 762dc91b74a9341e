use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::payment_methods::{PaymentMethodList, PaymentMethodRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::SavedPaymentMethod,
    response::ApiResponse,
    services::payment_method_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_methods).post(create_method))
        .route("/{id}", delete(delete_method))
        .route("/{id}/default", post(set_default_method))
}

#[utoipa::path(
    get,
    path = "/api/payment-methods",
    responses(
        (status = 200, description = "Saved payment methods, default first", body = ApiResponse<PaymentMethodList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Payment methods"
)]
pub async fn list_methods(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PaymentMethodList>>> {
    let resp = payment_method_service::list_methods(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment-methods",
    request_body = PaymentMethodRequest,
    responses(
        (status = 200, description = "Payment method saved", body = ApiResponse<SavedPaymentMethod>),
        (status = 400, description = "Invalid label or last four digits")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment methods"
)]
pub async fn create_method(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PaymentMethodRequest>,
) -> AppResult<Json<ApiResponse<SavedPaymentMethod>>> {
    let resp = payment_method_service::create_method(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment-methods/{id}/default",
    params(
        ("id" = Uuid, Path, description = "Payment method ID")
    ),
    responses(
        (status = 200, description = "Payment method is now the only default", body = ApiResponse<SavedPaymentMethod>),
        (status = 404, description = "Payment method not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment methods"
)]
pub async fn set_default_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SavedPaymentMethod>>> {
    let resp = payment_method_service::set_default_method(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/payment-methods/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment method ID")
    ),
    responses(
        (status = 200, description = "Payment method deleted"),
        (status = 404, description = "Payment method not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment methods"
)]
pub async fn delete_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = payment_method_service::delete_method(&state, &user, id).await?;
    Ok(Json(resp))
}
