use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Address;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
