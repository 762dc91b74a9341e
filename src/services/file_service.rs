use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    services::{checkup_service, doctor_service},
    state::AppState,
    storage::{LICENSES_BUCKET, REPORTS_BUCKET, SELFIES_BUCKET, owner_of},
};

/// Resolve a stored object for download after checking the caller may see it.
pub async fn authorize_download(
    state: &AppState,
    user: &AuthUser,
    bucket: &str,
    key: &str,
) -> AppResult<PathBuf> {
    let path = state.storage.object_path(bucket, key)?;
    let owner = owner_of(key).ok_or(AppError::NotFound)?;

    match bucket {
        REPORTS_BUCKET | SELFIES_BUCKET => {
            checkup_service::authorize_object(state, user, owner, &format!("{bucket}/{key}"))
                .await?
        }
        LICENSES_BUCKET => doctor_service::authorize_license(state, user, owner).await?,
        _ => return Err(AppError::NotFound),
    }

    tracing::debug!(bucket, key, user_id = %user.user_id, "object download");
    Ok(path)
}
