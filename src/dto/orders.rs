use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Order, OrderItem},
    status::{OrderStatus, PaymentMethod, PaymentStatus},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Explicit shipping details; otherwise `address_id` or the profile defaults are used.
    pub shipping: Option<ShippingDetails>,
    pub address_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    /// Copy the shipping details onto the profile.
    #[serde(default)]
    pub save_as_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}
