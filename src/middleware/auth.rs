//! Bearer-token identity and capability checks.
//!
//! Customers, admins and doctors go through the same [`authorize`] call; only
//! the facts consulted differ (`profiles.is_admin`, `doctors.status`).

use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::{
        Doctors, Profiles,
        doctors::{Column as DoctorCol, Model as DoctorModel},
    },
    error::{AppError, AppResult},
    state::{AppState, AuthSettings},
    status::DoctorStatus,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Admin,
    Doctor,
}

/// Pure decision over the facts loaded for a caller.
pub fn decide(
    capability: Capability,
    is_admin: bool,
    doctor_status: Option<DoctorStatus>,
) -> Result<(), AppError> {
    match capability {
        Capability::Admin if is_admin => Ok(()),
        Capability::Admin => Err(AppError::Forbidden("admin access required".into())),
        Capability::Doctor => match doctor_status {
            Some(DoctorStatus::Approved) => Ok(()),
            Some(DoctorStatus::Pending) => {
                Err(AppError::Forbidden("doctor approval pending".into()))
            }
            Some(DoctorStatus::Rejected) => {
                Err(AppError::Forbidden("doctor registration was rejected".into()))
            }
            None => Err(AppError::Forbidden("doctor access required".into())),
        },
    }
}

/// Checks the capability and returns the doctor record when one was loaded.
pub async fn authorize(
    state: &AppState,
    user: &AuthUser,
    capability: Capability,
) -> AppResult<Option<DoctorModel>> {
    match capability {
        Capability::Admin => {
            let is_admin = Profiles::find_by_id(user.user_id)
                .one(&state.orm)
                .await?
                .is_some_and(|p| p.is_admin);
            decide(capability, is_admin, None)?;
            Ok(None)
        }
        Capability::Doctor => {
            let doctor = Doctors::find()
                .filter(DoctorCol::UserId.eq(user.user_id))
                .one(&state.orm)
                .await?;
            let status = match &doctor {
                Some(d) => Some(d.status.parse::<DoctorStatus>()?),
                None => None,
            };
            decide(capability, false, status)?;
            Ok(doctor)
        }
    }
}

pub async fn ensure_admin(state: &AppState, user: &AuthUser) -> AppResult<()> {
    authorize(state, user, Capability::Admin).await.map(|_| ())
}

/// The approved doctor record for the caller.
pub async fn require_doctor(state: &AppState, user: &AuthUser) -> AppResult<DoctorModel> {
    authorize(state, user, Capability::Doctor)
        .await?
        .ok_or_else(|| AppError::Forbidden("doctor access required".into()))
}

pub fn issue_token(settings: &AuthSettings, user_id: Uuid, email: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(settings: &AuthSettings, token: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        email: decoded.claims.email,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        verify_token(&state.auth, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        }
    }

    #[test]
    fn token_round_trip_keeps_identity() {
        let id = Uuid::new_v4();
        let token = issue_token(&settings(), id, "a@b.c").unwrap();
        let user = verify_token(&settings(), &token).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "a@b.c");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&settings(), Uuid::new_v4(), "a@b.c").unwrap();
        let other = AuthSettings {
            jwt_secret: "another".into(),
            token_ttl_hours: 1,
        };
        assert!(matches!(
            verify_token(&other, &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn admin_capability_needs_the_flag() {
        assert!(decide(Capability::Admin, true, None).is_ok());
        assert!(matches!(
            decide(Capability::Admin, false, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn doctor_capability_needs_approval() {
        assert!(decide(Capability::Doctor, false, Some(DoctorStatus::Approved)).is_ok());
        match decide(Capability::Doctor, true, Some(DoctorStatus::Pending)) {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "doctor approval pending"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(decide(Capability::Doctor, true, None).is_err());
        assert!(decide(Capability::Doctor, false, Some(DoctorStatus::Rejected)).is_err());
    }
}
