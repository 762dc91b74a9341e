use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        checkups::{CheckupList, KitRequest, UpdateCheckupStatusRequest},
        doctors::DoctorRegistrationForm,
    },
    error::AppResult,
    form::FormData,
    middleware::auth::AuthUser,
    models::{CheckupApplication, Doctor, KitRecommendation},
    response::ApiResponse,
    routes::params::CheckupListQuery,
    services::{
        checkup_service,
        doctor_service::{self, DoctorRegistration},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
        .route("/checkups", get(list_checkups))
        .route("/checkups/{id}/status", put(advance_status))
        .route("/checkups/{id}/kit", put(upsert_kit))
}

#[utoipa::path(
    post,
    path = "/api/doctor/register",
    request_body(content = DoctorRegistrationForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Registration pending approval", body = ApiResponse<Doctor>),
        (status = 409, description = "Already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Doctor"
)]
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Doctor>>> {
    let form = FormData::from_multipart(multipart).await?;
    let registration = DoctorRegistration::from_form(form)?;
    let resp = doctor_service::register(&state, &user, registration).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/doctor/me",
    responses(
        (status = 200, description = "Own doctor registration and its status", body = ApiResponse<Doctor>),
        (status = 404, description = "Not registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Doctor"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Doctor>>> {
    let resp = doctor_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/doctor/checkups",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending | in-progress | completed"),
        ("mine" = Option<bool>, Query, description = "Only applications assigned to me")
    ),
    responses(
        (status = 200, description = "Applications visible to the doctor", body = ApiResponse<CheckupList>),
        (status = 403, description = "Not an approved doctor")
    ),
    security(("bearer_auth" = [])),
    tag = "Doctor"
)]
pub async fn list_checkups(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CheckupListQuery>,
) -> AppResult<Json<ApiResponse<CheckupList>>> {
    let resp = checkup_service::list_for_doctor(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/doctor/checkups/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateCheckupStatusRequest,
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<CheckupApplication>),
        (status = 400, description = "Not the next status")
    ),
    security(("bearer_auth" = [])),
    tag = "Doctor"
)]
pub async fn advance_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCheckupStatusRequest>,
) -> AppResult<Json<ApiResponse<CheckupApplication>>> {
    let resp = checkup_service::advance_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/doctor/checkups/{id}/kit",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = KitRequest,
    responses(
        (status = 200, description = "Kit created or replaced", body = ApiResponse<KitRecommendation>)
    ),
    security(("bearer_auth" = [])),
    tag = "Doctor"
)]
pub async fn upsert_kit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<KitRequest>,
) -> AppResult<Json<ApiResponse<KitRecommendation>>> {
    let resp = checkup_service::upsert_kit(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
