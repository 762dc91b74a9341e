use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::SavedPaymentMethod, status::PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentMethodRequest {
    pub kind: PaymentMethod,
    pub label: String,
    /// Last four digits of the card or account; never the full number.
    pub last_four: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentMethodList {
    #[schema(value_type = Vec<SavedPaymentMethod>)]
    pub items: Vec<SavedPaymentMethod>,
}
