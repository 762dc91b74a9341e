use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::Profile, routes::params::Pagination};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub threshold: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub products: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub customers: i64,
    pub pending_checkups: i64,
    pub pending_doctors: i64,
    /// Sum of `total_amount` over paid orders.
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CustomerList {
    #[schema(value_type = Vec<Profile>)]
    pub items: Vec<Profile>,
}
