use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    entity::{
        Doctors,
        doctors::{ActiveModel as DoctorActive, Column as DoctorCol},
    },
    error::{AppError, AppResult},
    form::FormData,
    middleware::auth::{AuthUser, ensure_admin},
    models::Doctor,
    response::{ApiResponse, Meta},
    state::AppState,
    status::DoctorStatus,
    storage::{LICENSES_BUCKET, Upload},
};

#[derive(Debug)]
pub struct DoctorRegistration {
    pub full_name: String,
    pub specialization: String,
    pub license_number: String,
    pub license: Upload,
}

impl DoctorRegistration {
    pub fn from_form(mut form: FormData) -> AppResult<Self> {
        let full_name = form.require("full_name")?;
        let specialization = form.require("specialization")?;
        let license_number = form.require("license_number")?;
        let license = form
            .take_files("license")
            .into_iter()
            .next()
            .ok_or_else(|| AppError::BadRequest("license file is required".into()))?;
        Ok(Self {
            full_name,
            specialization,
            license_number,
            license,
        })
    }
}

/// New registrations wait for admin approval.
pub async fn register(
    state: &AppState,
    user: &AuthUser,
    registration: DoctorRegistration,
) -> AppResult<ApiResponse<Doctor>> {
    let existing = Doctors::find()
        .filter(DoctorCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "doctor registration already exists".into(),
        ));
    }

    let license = state
        .storage
        .put(LICENSES_BUCKET, user.user_id, &registration.license)
        .await?;

    let inserted = DoctorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        full_name: Set(registration.full_name),
        specialization: Set(registration.specialization),
        license_number: Set(registration.license_number),
        license_path: Set(license.path()),
        status: Set(DoctorStatus::Pending.as_str().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let doctor = match inserted {
        Ok(doctor) => doctor,
        Err(err) => {
            state.storage.remove(&license).await;
            return Err(err.into());
        }
    };

    tracing::info!(doctor_id = %doctor.id, "doctor registered, awaiting approval");
    audit::record(
        &state.orm,
        user.user_id,
        "doctor_register",
        "doctors",
        serde_json::json!({ "doctor_id": doctor.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Registration received",
        doctor.into(),
        Some(Meta::empty()),
    ))
}

/// The caller's own registration, whatever its status.
/// A license file is readable by the doctor who uploaded it and by admins.
pub async fn authorize_license(state: &AppState, user: &AuthUser, owner: Uuid) -> AppResult<()> {
    if owner == user.user_id {
        return Ok(());
    }
    ensure_admin(state, user).await
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Doctor>> {
    let doctor = Doctors::find()
        .filter(DoctorCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Doctor", doctor.into(), Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_needs_a_license_file() {
        let mut form = FormData::default();
        form.insert_text("full_name", "Dr. Meera Iyer");
        form.insert_text("specialization", "Dermatology");
        form.insert_text("license_number", "AYU-1234");
        assert!(matches!(
            DoctorRegistration::from_form(form),
            Err(AppError::BadRequest(msg)) if msg.contains("license")
        ));
    }

    #[test]
    fn registration_reads_every_field() {
        let mut form = FormData::default();
        form.insert_text("full_name", "Dr. Meera Iyer");
        form.insert_text("specialization", "Dermatology");
        form.insert_text("license_number", " AYU-1234 ");
        form.push_file(
            "license",
            Upload {
                file_name: "license.pdf".into(),
                content_type: Some("application/pdf".into()),
                bytes: b"%PDF".to_vec(),
            },
        );
        let reg = DoctorRegistration::from_form(form).unwrap();
        assert_eq!(reg.license_number, "AYU-1234");
        assert_eq!(reg.license.file_name, "license.pdf");
    }
}
