use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::Doctor, status::DoctorStatus};

/// Multipart fields accepted by doctor registration.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct DoctorRegistrationForm {
    pub full_name: String,
    pub specialization: String,
    pub license_number: String,
    #[schema(value_type = String, format = Binary)]
    pub license: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct DoctorList {
    #[schema(value_type = Vec<Doctor>)]
    pub items: Vec<Doctor>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDoctorStatusRequest {
    pub status: DoctorStatus,
}
