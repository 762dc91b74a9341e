use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponQuote {
    pub coupon: Coupon,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_percentage: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub code: Option<String>,
    pub discount_percentage: Option<i32>,
    /// `null` keeps the current expiry; use `clear_expiry` to remove it.
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_expiry: bool,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}
