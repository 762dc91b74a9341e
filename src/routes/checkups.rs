use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::checkups::{
        ChatThread, CheckupDetail, CheckupForm, CheckupList, MessagesQuery, PostMessageRequest,
        StepOutcome, ValidateStepRequest,
    },
    error::AppResult,
    form::FormData,
    middleware::auth::AuthUser,
    models::{ChatMessage, KitRecommendation},
    response::ApiResponse,
    routes::params::Pagination,
    services::checkup_service::{self, CheckupSubmission},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(my_checkups).post(submit_checkup))
        .route("/validate-step", post(validate_step))
        .route("/{id}", get(get_checkup))
        .route("/{id}/messages", get(list_messages).post(post_message))
        .route("/{id}/kit", get(get_kit))
}

#[utoipa::path(
    post,
    path = "/api/checkups/validate-step",
    request_body = ValidateStepRequest,
    responses(
        (status = 200, description = "Step is complete; returns the next step", body = ApiResponse<StepOutcome>),
        (status = 400, description = "Step is incomplete")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn validate_step(
    _user: AuthUser,
    Json(payload): Json<ValidateStepRequest>,
) -> AppResult<Json<ApiResponse<StepOutcome>>> {
    let resp = checkup_service::validate_step(payload)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkups",
    request_body(content = CheckupForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<CheckupDetail>),
        (status = 400, description = "A wizard step failed validation")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn submit_checkup(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<CheckupDetail>>> {
    let form = FormData::from_multipart(multipart).await?;
    let submission = CheckupSubmission::from_form(form)?;
    let resp = checkup_service::submit(&state, &user, submission).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkups",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Applications of the current user", body = ApiResponse<CheckupList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn my_checkups(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CheckupList>>> {
    let resp = checkup_service::my_checkups(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkups/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with file URLs and kit", body = ApiResponse<CheckupDetail>),
        (status = 403, description = "Not the patient or an allowed doctor"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn get_checkup(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CheckupDetail>>> {
    let resp = checkup_service::get_checkup(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkups/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Application ID"),
        ("after" = Option<String>, Query, description = "RFC 3339 instant; only newer messages")
    ),
    responses(
        (status = 200, description = "Consultation messages, oldest first", body = ApiResponse<ChatThread>)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<ApiResponse<ChatThread>>> {
    let resp = checkup_service::list_messages(&state, &user, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkups/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = ApiResponse<ChatMessage>),
        (status = 400, description = "Empty or oversized message")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> AppResult<Json<ApiResponse<ChatMessage>>> {
    let resp = checkup_service::post_message(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkups/{id}/kit",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Kit recommended by the doctor", body = ApiResponse<KitRecommendation>),
        (status = 404, description = "No kit yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkups"
)]
pub async fn get_kit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<KitRecommendation>>> {
    let resp = checkup_service::get_kit(&state, &user, id).await?;
    Ok(Json(resp))
}
