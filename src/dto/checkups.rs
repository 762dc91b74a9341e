use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    intake::{IntakeDraft, IntakeStep},
    models::{ChatMessage, CheckupApplication, KitItem, KitRecommendation},
    status::CheckupStatus,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateStepRequest {
    pub step: IntakeStep,
    pub draft: IntakeDraft,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StepOutcome {
    pub step: IntakeStep,
    /// `None` once the last step is valid.
    pub next: Option<IntakeStep>,
}

/// Multipart fields accepted by the submission endpoint.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CheckupForm {
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub phone: String,
    pub email: Option<String>,
    pub concern: String,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub report: Option<Vec<u8>>,
    #[schema(value_type = Vec<String>)]
    pub selfies: Vec<Vec<u8>>,
    pub problem_description: String,
    pub problem_duration: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckupDetail {
    pub application: CheckupApplication,
    pub report_url: Option<String>,
    pub selfie_urls: Vec<String>,
    pub kit: Option<KitRecommendation>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CheckupList {
    #[schema(value_type = Vec<CheckupApplication>)]
    pub items: Vec<CheckupApplication>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCheckupStatusRequest {
    pub status: CheckupStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MessagesQuery {
    /// Only messages created strictly after this instant.
    pub after: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ChatThread {
    #[schema(value_type = Vec<ChatMessage>)]
    pub items: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct KitRequest {
    pub items: Vec<KitItem>,
    pub notes: Option<String>,
}
