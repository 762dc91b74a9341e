use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::profile::UpdateProfileRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile of the current user", body = ApiResponse<Profile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = profile_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<Profile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
