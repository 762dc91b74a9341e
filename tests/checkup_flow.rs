mod common;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;
use wellness_store_api::{
    dto::checkups::{KitRequest, MessagesQuery, PostMessageRequest, UpdateCheckupStatusRequest},
    entity::doctors,
    error::AppError,
    intake::IntakeDraft,
    middleware::auth::AuthUser,
    models::KitItem,
    routes::params::{CheckupListQuery, Pagination},
    services::{
        checkup_service::{self, CheckupSubmission},
        doctor_service::{self, DoctorRegistration},
        file_service,
    },
    state::AppState,
    status::{CheckupStatus, DoctorStatus},
    storage::Upload,
};

fn selfie(n: usize) -> Upload {
    Upload {
        file_name: format!("selfie-{n}.jpg"),
        content_type: Some("image/jpeg".into()),
        bytes: vec![0xFF, 0xD8, 0xFF, n as u8],
    }
}

fn submission(selfies: usize) -> CheckupSubmission {
    CheckupSubmission {
        draft: IntakeDraft {
            full_name: Some("Meera Iyer".into()),
            age: Some(34),
            gender: Some("female".into()),
            phone: Some("9000000001".into()),
            concern: Some("skin".into()),
            allergies: Some("none".into()),
            selfie_count: selfies,
            problem_description: Some("Dry patches on both cheeks".into()),
            problem_duration: Some("3 months".into()),
            ..Default::default()
        },
        report: None,
        selfies: (0..selfies).map(selfie).collect(),
    }
}

async fn approved_doctor(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = common::create_user(state, false).await?;
    doctors::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        full_name: Set("Dr. Vaidya".into()),
        specialization: Set("Dermatology".into()),
        license_number: Set(common::unique("LIC")),
        license_path: Set("doctor-licenses/test.pdf".into()),
        status: Set(DoctorStatus::Approved.as_str().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user)
}

// Patient submits, a doctor picks it up, they chat, and the doctor recommends a kit.
#[tokio::test]
async fn checkup_submission_consultation_and_kit() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let patient = common::create_user(&state, false).await?;
    let doctor = approved_doctor(&state).await?;
    let other_doctor = approved_doctor(&state).await?;

    let detail = checkup_service::submit(&state, &patient, submission(4))
        .await?
        .data
        .unwrap();
    let id = detail.application.id;
    assert_eq!(detail.application.status, "pending");
    assert_eq!(detail.application.email.as_deref(), Some(patient.email.as_str()));
    assert_eq!(detail.selfie_urls.len(), 4);
    assert!(detail.report_url.is_none());

    let queue = checkup_service::list_for_doctor(
        &state,
        &doctor,
        CheckupListQuery {
            pagination: Pagination::default(),
            status: Some("pending".into()),
            mine: false,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(queue.items.iter().any(|a| a.id == id));

    // Customers without a doctor profile are turned away.
    let denied = checkup_service::advance_status(
        &state,
        &patient,
        id,
        UpdateCheckupStatusRequest {
            status: CheckupStatus::InProgress,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let skipped = checkup_service::advance_status(
        &state,
        &doctor,
        id,
        UpdateCheckupStatusRequest {
            status: CheckupStatus::Completed,
        },
    )
    .await;
    assert!(matches!(skipped, Err(AppError::BadRequest(_))));

    let taken = checkup_service::advance_status(
        &state,
        &doctor,
        id,
        UpdateCheckupStatusRequest {
            status: CheckupStatus::InProgress,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(taken.status, "in-progress");
    assert!(taken.doctor_id.is_some());

    // Once assigned, other doctors lose access.
    let foreign = checkup_service::get_checkup(&state, &other_doctor, id).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    checkup_service::post_message(
        &state,
        &patient,
        id,
        PostMessageRequest {
            body: "Is it safe to use oil at night?".into(),
        },
    )
    .await?;
    checkup_service::post_message(
        &state,
        &doctor,
        id,
        PostMessageRequest {
            body: "Yes, a few drops after cleansing.".into(),
        },
    )
    .await?;
    let thread = checkup_service::list_messages(&state, &patient, id, MessagesQuery { after: None })
        .await?
        .data
        .unwrap();
    let roles: Vec<&str> = thread.items.iter().map(|m| m.sender_role.as_str()).collect();
    assert_eq!(roles, ["patient", "doctor"]);

    checkup_service::upsert_kit(
        &state,
        &doctor,
        id,
        KitRequest {
            items: vec![KitItem {
                product_id: None,
                name: "Kumkumadi Oil".into(),
                usage: Some("Nightly".into()),
            }],
            notes: Some("Review in four weeks".into()),
        },
    )
    .await?;
    let kit = checkup_service::get_kit(&state, &patient, id).await?.data.unwrap();
    assert_eq!(kit.items.len(), 1);
    assert_eq!(kit.items[0].name, "Kumkumadi Oil");

    Ok(())
}

#[tokio::test]
async fn submission_with_too_few_selfies_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let patient = common::create_user(&state, false).await?;

    let result = checkup_service::submit(&state, &patient, submission(3)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let mine = checkup_service::my_checkups(&state, &patient, Pagination::default())
        .await?
        .data
        .unwrap();
    assert!(mine.items.is_empty());

    Ok(())
}

fn split(stored: &str) -> (&str, &str) {
    stored.split_once('/').expect("bucket/key")
}

#[tokio::test]
async fn uploaded_files_are_only_served_to_participants() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let patient = common::create_user(&state, false).await?;
    let stranger = common::create_user(&state, false).await?;
    let doctor = approved_doctor(&state).await?;
    let other_doctor = approved_doctor(&state).await?;

    let detail = checkup_service::submit(&state, &patient, submission(4))
        .await?
        .data
        .unwrap();
    let (bucket, key) = split(&detail.application.selfie_paths[0]);

    let path = file_service::authorize_download(&state, &patient, bucket, key).await?;
    assert!(path.exists());
    let denied = file_service::authorize_download(&state, &stranger, bucket, key).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    checkup_service::advance_status(
        &state,
        &doctor,
        detail.application.id,
        UpdateCheckupStatusRequest {
            status: CheckupStatus::InProgress,
        },
    )
    .await?;
    file_service::authorize_download(&state, &doctor, bucket, key).await?;
    let foreign = file_service::authorize_download(&state, &other_doctor, bucket, key).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let traversal = file_service::authorize_download(&state, &patient, bucket, "../secrets").await;
    assert!(matches!(traversal, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn license_files_are_limited_to_owner_and_admins() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let applicant = common::create_user(&state, false).await?;
    let admin = common::create_user(&state, true).await?;
    let stranger = common::create_user(&state, false).await?;

    let doctor = doctor_service::register(
        &state,
        &applicant,
        DoctorRegistration {
            full_name: "Dr. Kapoor".into(),
            specialization: "Trichology".into(),
            license_number: common::unique("LIC"),
            license: Upload {
                file_name: "license.pdf".into(),
                content_type: Some("application/pdf".into()),
                bytes: b"%PDF-1.4".to_vec(),
            },
        },
    )
    .await?
    .data
    .unwrap();
    let (bucket, key) = split(&doctor.license_path);

    file_service::authorize_download(&state, &applicant, bucket, key).await?;
    file_service::authorize_download(&state, &admin, bucket, key).await?;
    let denied = file_service::authorize_download(&state, &stranger, bucket, key).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    Ok(())
}
