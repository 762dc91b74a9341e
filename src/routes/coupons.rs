use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::coupons::{ApplyCouponRequest, CouponList, CouponQuote},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active))
        .route("/apply", post(apply_coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Active, unexpired coupons", body = ApiResponse<CouponList>)
    ),
    tag = "Coupons"
)]
pub async fn list_active(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_active(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/coupons/apply",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Discount preview against the current cart", body = ApiResponse<CouponQuote>),
        (status = 400, description = "Unknown, inactive or expired coupon")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponQuote>>> {
    let resp = coupon_service::apply_coupon(&state, &user, payload).await?;
    Ok(Json(resp))
}
