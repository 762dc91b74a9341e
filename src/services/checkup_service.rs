use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::checkups::{
        ChatThread, CheckupDetail, CheckupList, KitRequest, MessagesQuery, PostMessageRequest,
        StepOutcome, UpdateCheckupStatusRequest, ValidateStepRequest,
    },
    entity::{
        ChatMessages, CheckupApplications, KitRecommendations,
        chat_messages::{ActiveModel as MessageActive, Column as MessageCol},
        checkup_applications::{
            ActiveModel as CheckupActive, Column as CheckupCol, Model as CheckupModel,
        },
        doctors::Model as DoctorModel,
        kit_recommendations::{ActiveModel as KitActive, Column as KitCol},
    },
    error::{AppError, AppResult},
    form::FormData,
    intake::{self, IntakeDraft, IntakeWizard},
    middleware::auth::{AuthUser, require_doctor},
    models::{ChatMessage, CheckupApplication, KitRecommendation},
    response::{ApiResponse, Meta},
    routes::params::{CheckupListQuery, Pagination},
    state::AppState,
    status::CheckupStatus,
    storage::{REPORTS_BUCKET, SELFIES_BUCKET, StoredObject, Upload},
};

pub const MAX_MESSAGE_CHARS: usize = 4000;

/// A parsed submission: the draft plus the files it refers to.
#[derive(Debug, Default)]
pub struct CheckupSubmission {
    pub draft: IntakeDraft,
    pub report: Option<Upload>,
    pub selfies: Vec<Upload>,
}

impl CheckupSubmission {
    /// Fields `report` (one file, optional) and `selfies` (repeated).
    pub fn from_form(mut form: FormData) -> AppResult<Self> {
        let age = match form.text("age") {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| AppError::BadRequest("age must be a number".into()))?,
            ),
            None => None,
        };
        let mut reports = form.take_files("report");
        if reports.len() > 1 {
            return Err(AppError::BadRequest("only one report file is allowed".into()));
        }
        let report = reports.pop();
        let selfies = form.take_files("selfies");
        for selfie in &selfies {
            if !selfie
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/"))
            {
                return Err(AppError::BadRequest(format!(
                    "selfie {} is not an image",
                    selfie.file_name
                )));
            }
        }

        let draft = IntakeDraft {
            full_name: form.text("full_name"),
            age,
            gender: form.text("gender"),
            phone: form.text("phone"),
            email: form.text("email"),
            concern: form.text("concern"),
            medical_history: form.text("medical_history"),
            current_medications: form.text("current_medications"),
            allergies: form.text("allergies"),
            has_report: report.is_some(),
            selfie_count: selfies.len(),
            problem_description: form.text("problem_description"),
            problem_duration: form.text("problem_duration"),
        };
        Ok(Self {
            draft,
            report,
            selfies,
        })
    }
}

/// Who is acting on an application.
#[derive(Debug, Clone)]
pub enum Participant {
    Patient,
    Doctor(DoctorModel),
}

impl Participant {
    pub fn role(&self) -> &'static str {
        match self {
            Participant::Patient => "patient",
            Participant::Doctor(_) => "doctor",
        }
    }
}

/// Doctors see unassigned applications and their own.
pub fn doctor_may_access(assigned: Option<Uuid>, doctor_id: Uuid) -> bool {
    assigned.is_none_or(|id| id == doctor_id)
}

async fn participant(
    state: &AppState,
    user: &AuthUser,
    application: &CheckupModel,
) -> AppResult<Participant> {
    if application.user_id == user.user_id {
        return Ok(Participant::Patient);
    }
    let doctor = require_doctor(state, user).await?;
    if !doctor_may_access(application.doctor_id, doctor.id) {
        return Err(AppError::Forbidden(
            "application is assigned to another doctor".into(),
        ));
    }
    Ok(Participant::Doctor(doctor))
}

async fn load(state: &AppState, id: Uuid) -> AppResult<CheckupModel> {
    CheckupApplications::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Whether `stored` (`bucket/key`) is the report or one of the selfies.
fn references_object(application: &CheckupModel, stored: &str) -> bool {
    application.report_path.as_deref() == Some(stored)
        || application
            .selfie_paths
            .as_array()
            .is_some_and(|paths| paths.iter().any(|p| p.as_str() == Some(stored)))
}

/// Files of an application are visible to exactly those who may read it.
pub async fn authorize_object(
    state: &AppState,
    user: &AuthUser,
    owner: Uuid,
    stored: &str,
) -> AppResult<()> {
    let application = CheckupApplications::find()
        .filter(CheckupCol::UserId.eq(owner))
        .all(&state.orm)
        .await?
        .into_iter()
        .find(|a| references_object(a, stored))
        .ok_or(AppError::NotFound)?;
    participant(state, user, &application).await.map(|_| ())
}

/// Stateless gate check for one wizard step.
pub fn validate_step(payload: ValidateStepRequest) -> AppResult<ApiResponse<StepOutcome>> {
    intake::validate_step(payload.step, &payload.draft)?;
    Ok(ApiResponse::success(
        "Step valid",
        StepOutcome {
            step: payload.step,
            next: payload.step.next(),
        },
        Some(Meta::empty()),
    ))
}

async fn discard(state: &AppState, stored: &[StoredObject]) {
    for object in stored {
        state.storage.remove(object).await;
    }
}

async fn store_files(
    state: &AppState,
    owner: Uuid,
    submission: &CheckupSubmission,
    stored: &mut Vec<StoredObject>,
) -> AppResult<(Option<String>, Vec<String>)> {
    let report_path = match &submission.report {
        Some(report) => {
            let object = state.storage.put(REPORTS_BUCKET, owner, report).await?;
            let path = object.path();
            stored.push(object);
            Some(path)
        }
        None => None,
    };
    let mut selfie_paths = Vec::with_capacity(submission.selfies.len());
    for selfie in &submission.selfies {
        let object = state.storage.put(SELFIES_BUCKET, owner, selfie).await?;
        selfie_paths.push(object.path());
        stored.push(object);
    }
    Ok((report_path, selfie_paths))
}

/// Run every intake gate, upload the report then the selfies, then insert the row.
/// Files already written are removed if anything after them fails.
pub async fn submit(
    state: &AppState,
    user: &AuthUser,
    submission: CheckupSubmission,
) -> AppResult<ApiResponse<CheckupDetail>> {
    let intake = IntakeWizard::new(submission.draft.clone()).complete()?;

    let mut stored = Vec::new();
    let (report_path, selfie_paths) =
        match store_files(state, user.user_id, &submission, &mut stored).await {
            Ok(paths) => paths,
            Err(err) => {
                discard(state, &stored).await;
                return Err(err);
            }
        };

    let inserted = CheckupActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        doctor_id: Set(None),
        full_name: Set(intake.full_name),
        age: Set(intake.age),
        gender: Set(intake.gender),
        phone: Set(intake.phone),
        email: Set(intake.email.or_else(|| Some(user.email.clone()))),
        concern: Set(intake.concern.as_str().into()),
        medical_history: Set(intake.medical_history),
        current_medications: Set(intake.current_medications),
        allergies: Set(intake.allergies),
        report_path: Set(report_path),
        selfie_paths: Set(serde_json::json!(selfie_paths)),
        problem_description: Set(intake.problem_description),
        problem_duration: Set(intake.problem_duration),
        status: Set(CheckupStatus::Pending.as_str().into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let application = match inserted {
        Ok(application) => application,
        Err(err) => {
            discard(state, &stored).await;
            return Err(err.into());
        }
    };

    tracing::info!(
        application_id = %application.id,
        selfies = stored.len(),
        "checkup submitted"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkup_submit",
        "checkup_applications",
        serde_json::json!({ "application_id": application.id, "concern": application.concern }),
    )
    .await;

    let detail = to_detail(state, application, None);
    Ok(ApiResponse::success(
        "Checkup submitted",
        detail,
        Some(Meta::empty()),
    ))
}

fn to_detail(
    state: &AppState,
    application: CheckupModel,
    kit: Option<KitRecommendation>,
) -> CheckupDetail {
    let application = CheckupApplication::from(application);
    let report_url = application
        .report_path
        .as_deref()
        .map(|p| state.storage.public_url(p));
    let selfie_urls = application
        .selfie_paths
        .iter()
        .map(|p| state.storage.public_url(p))
        .collect();
    CheckupDetail {
        application,
        report_url,
        selfie_urls,
        kit,
    }
}

pub async fn my_checkups(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CheckupList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = CheckupApplications::find()
        .filter(CheckupCol::UserId.eq(user.user_id))
        .order_by_desc(CheckupCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CheckupApplication::from)
        .collect();
    Ok(ApiResponse::success(
        "Checkups",
        CheckupList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Patient or a doctor with access.
pub async fn get_checkup(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CheckupDetail>> {
    let application = load(state, id).await?;
    participant(state, user, &application).await?;
    let kit = KitRecommendations::find()
        .filter(KitCol::ApplicationId.eq(application.id))
        .one(&state.orm)
        .await?
        .map(KitRecommendation::from);
    Ok(ApiResponse::success(
        "Checkup",
        to_detail(state, application, kit),
        Some(Meta::empty()),
    ))
}

/// Doctor queue: unassigned and own applications, or only own with `mine`.
pub async fn list_for_doctor(
    state: &AppState,
    user: &AuthUser,
    query: CheckupListQuery,
) -> AppResult<ApiResponse<CheckupList>> {
    let doctor = require_doctor(state, user).await?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = if query.mine {
        Condition::all().add(CheckupCol::DoctorId.eq(doctor.id))
    } else {
        Condition::any()
            .add(CheckupCol::DoctorId.is_null())
            .add(CheckupCol::DoctorId.eq(doctor.id))
    };
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: CheckupStatus = status.parse()?;
        condition = Condition::all()
            .add(condition)
            .add(CheckupCol::Status.eq(status.as_str()));
    }

    let finder = CheckupApplications::find()
        .filter(condition)
        .order_by_asc(CheckupCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CheckupApplication::from)
        .collect();

    Ok(ApiResponse::success(
        "Checkups",
        CheckupList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Forward-only; moving to `in-progress` claims the application.
pub async fn advance_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCheckupStatusRequest,
) -> AppResult<ApiResponse<CheckupApplication>> {
    let doctor = require_doctor(state, user).await?;

    let txn = state.orm.begin().await?;
    let application = CheckupApplications::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !doctor_may_access(application.doctor_id, doctor.id) {
        return Err(AppError::Forbidden(
            "application is assigned to another doctor".into(),
        ));
    }
    let current: CheckupStatus = application.status.parse()?;
    if !current.can_advance_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "cannot move a checkup from {current} to {}",
            payload.status
        )));
    }

    let mut active: CheckupActive = application.into();
    active.status = Set(payload.status.as_str().into());
    if payload.status == CheckupStatus::InProgress {
        active.doctor_id = Set(Some(doctor.id));
    }
    active.updated_at = Set(Utc::now().into());
    let application = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "checkup_status_update",
        "checkup_applications",
        serde_json::json!({ "application_id": application.id, "status": application.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkup updated",
        application.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    query: MessagesQuery,
) -> AppResult<ApiResponse<ChatThread>> {
    let application = load(state, id).await?;
    participant(state, user, &application).await?;

    let mut finder = ChatMessages::find().filter(MessageCol::ApplicationId.eq(application.id));
    if let Some(after) = query.after {
        finder = finder.filter(MessageCol::CreatedAt.gt(after.fixed_offset()));
    }
    let items = finder
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ChatMessage::from)
        .collect();

    Ok(ApiResponse::success(
        "Messages",
        ChatThread { items },
        Some(Meta::empty()),
    ))
}

pub fn clean_message(body: &str) -> AppResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".into()));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(body.to_string())
}

pub async fn post_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<ChatMessage>> {
    let body = clean_message(&payload.body)?;
    let application = load(state, id).await?;
    let who = participant(state, user, &application).await?;

    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        application_id: Set(application.id),
        sender_id: Set(user.user_id),
        sender_role: Set(who.role().into()),
        body: Set(body),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(application_id = %application.id, role = who.role(), "chat message posted");

    Ok(ApiResponse::success(
        "Message sent",
        message.into(),
        Some(Meta::empty()),
    ))
}

/// One kit per application; a second call replaces the first.
pub async fn upsert_kit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: KitRequest,
) -> AppResult<ApiResponse<KitRecommendation>> {
    let application = load(state, id).await?;
    let doctor = match participant(state, user, &application).await? {
        Participant::Doctor(doctor) => doctor,
        Participant::Patient => {
            return Err(AppError::Forbidden("only doctors can recommend a kit".into()));
        }
    };
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("kit must contain at least one item".into()));
    }
    if payload.items.iter().any(|item| item.name.trim().is_empty()) {
        return Err(AppError::BadRequest("every kit item needs a name".into()));
    }
    let items = serde_json::to_value(&payload.items).map_err(|e| AppError::Internal(e.into()))?;

    let existing = KitRecommendations::find()
        .filter(KitCol::ApplicationId.eq(application.id))
        .one(&state.orm)
        .await?;
    let kit = match existing {
        Some(kit) => {
            let mut active: KitActive = kit.into();
            active.doctor_id = Set(doctor.id);
            active.items = Set(items);
            active.notes = Set(payload.notes);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            KitActive {
                id: Set(Uuid::new_v4()),
                application_id: Set(application.id),
                doctor_id: Set(doctor.id),
                items: Set(items),
                notes: Set(payload.notes),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.orm,
        user.user_id,
        "kit_upsert",
        "kit_recommendations",
        serde_json::json!({ "application_id": application.id, "kit_id": kit.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Kit saved",
        kit.into(),
        Some(Meta::empty()),
    ))
}

pub async fn get_kit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<KitRecommendation>> {
    let application = load(state, id).await?;
    participant(state, user, &application).await?;
    let kit = KitRecommendations::find()
        .filter(KitCol::ApplicationId.eq(application.id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Kit", kit.into(), Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeStep;

    fn image(name: &str) -> Upload {
        Upload {
            file_name: name.into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![0xFF, 0xD8],
        }
    }

    fn form() -> FormData {
        let mut form = FormData::default();
        for (k, v) in [
            ("full_name", "Asha Rao"),
            ("age", "29"),
            ("gender", "female"),
            ("phone", "9876543210"),
            ("concern", "skin"),
            ("problem_description", "Dry patches on cheeks"),
        ] {
            form.insert_text(k, v);
        }
        for i in 0..4 {
            form.push_file("selfies", image(&format!("s{i}.jpg")));
        }
        form
    }

    #[test]
    fn form_becomes_a_complete_draft() {
        let submission = CheckupSubmission::from_form(form()).unwrap();
        assert_eq!(submission.draft.age, Some(29));
        assert_eq!(submission.draft.selfie_count, 4);
        assert!(!submission.draft.has_report);
        assert!(IntakeWizard::new(submission.draft).complete().is_ok());
    }

    #[test]
    fn three_selfies_stop_at_the_selfie_step() {
        let mut form = form();
        let mut selfies = form.take_files("selfies");
        selfies.pop();
        for s in selfies {
            form.push_file("selfies", s);
        }
        let submission = CheckupSubmission::from_form(form).unwrap();
        let mut wizard = IntakeWizard::new(submission.draft);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.step(), IntakeStep::Selfies);
        assert!(wizard.advance().is_err());
    }

    #[test]
    fn non_numeric_age_and_non_image_selfie_are_rejected() {
        let mut bad_age = form();
        bad_age.insert_text("age", "twenty");
        assert!(CheckupSubmission::from_form(bad_age).is_err());

        let mut bad_selfie = form();
        bad_selfie.push_file(
            "selfies",
            Upload {
                file_name: "notes.txt".into(),
                content_type: Some("text/plain".into()),
                bytes: b"hi".to_vec(),
            },
        );
        assert!(CheckupSubmission::from_form(bad_selfie).is_err());
    }

    #[test]
    fn selfie_without_content_type_is_rejected() {
        let mut untyped = form();
        untyped.push_file(
            "selfies",
            Upload {
                file_name: "s4.jpg".into(),
                content_type: None,
                bytes: vec![0xFF, 0xD8],
            },
        );
        match CheckupSubmission::from_form(untyped) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "selfie s4.jpg is not an image"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn doctors_only_reach_unassigned_or_own_applications() {
        let me = Uuid::new_v4();
        assert!(doctor_may_access(None, me));
        assert!(doctor_may_access(Some(me), me));
        assert!(!doctor_may_access(Some(Uuid::new_v4()), me));
    }

    #[test]
    fn messages_are_trimmed_and_bounded() {
        assert_eq!(clean_message("  hello ").unwrap(), "hello");
        assert!(clean_message("   ").is_err());
        assert!(clean_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn step_validation_reports_the_next_step() {
        let draft = CheckupSubmission::from_form(form()).unwrap().draft;
        let outcome = validate_step(ValidateStepRequest {
            step: IntakeStep::Medical,
            draft,
        })
        .unwrap();
        let data = outcome.data.unwrap();
        assert_eq!(data.next, Some(IntakeStep::Selfies));
    }
}
