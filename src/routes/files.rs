use axum::{
    Router,
    body::Body,
    extract::{Path, Request, State},
    response::Response,
    routing::get,
};
use tower_http::services::ServeFile;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    services::file_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{bucket}/{*key}", get(download))
}

#[utoipa::path(
    get,
    path = "/api/files/{bucket}/{key}",
    params(
        ("bucket" = String, Path, description = "checkup-reports | checkup-selfies | doctor-licenses"),
        ("key" = String, Path, description = "Object key as returned in file URLs")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Not a participant of the owning record"),
        (status = 404, description = "No such object")
    ),
    security(("bearer_auth" = [])),
    tag = "Files"
)]
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    Path((bucket, key)): Path<(String, String)>,
    request: Request,
) -> AppResult<Response> {
    let path = file_service::authorize_download(&state, &user, &bucket, &key).await?;
    let response = ServeFile::new(path)
        .try_call(request)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(response.map(Body::new))
}
