use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, Me, RegisterRequest},
    entity::{
        Doctors, Users,
        doctors::Column as DoctorCol,
        profiles::ActiveModel as ProfileActive,
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Take the caller's user row `FOR UPDATE`, serializing per-user writes
/// such as default address and payment method changes.
pub async fn lock_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Users::find_by_id(user_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;
    Ok(())
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| AppError::BadRequest("Invalid email address".into()))?;
    if local.is_empty() || !domain.contains('.') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    if password.chars().count() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        full_name,
    } = payload;
    let email = email.trim().to_lowercase();
    validate_credentials(&email, &password)?;

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .count(&state.orm)
        .await?;
    if exists > 0 {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    ProfileActive {
        id: Set(user.id),
        full_name: Set(full_name.filter(|n| !n.trim().is_empty())),
        phone: Set(None),
        address_line: Set(None),
        city: Set(None),
        state: Set(None),
        postal_code: Set(None),
        country: Set(None),
        is_admin: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(&state.auth, user.id, &user.email)?;

    audit::record(
        &state.orm,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id, "at": Utc::now() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<Me>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;
    let profile = crate::services::profile_service::load_or_create(state, auth.user_id).await?;
    let is_doctor = Doctors::find()
        .filter(DoctorCol::UserId.eq(auth.user_id))
        .count(&state.orm)
        .await?
        > 0;

    Ok(ApiResponse::success(
        "OK",
        Me {
            user: User::from(user),
            profile: profile.into(),
            is_doctor,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_checked_before_hitting_the_database() {
        assert!(validate_credentials("user@example.com", "longenough").is_ok());
        assert!(validate_credentials("user.example.com", "longenough").is_err());
        assert!(validate_credentials("@example.com", "longenough").is_err());
        assert!(validate_credentials("user@localhost", "longenough").is_err());
        assert!(validate_credentials("user@example.com", "short").is_err());
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
