use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_percentage: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub invoice_number: String,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedPaymentMethod {
    pub id: Uuid,
    pub kind: String,
    pub label: String,
    pub last_four: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPost {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub specialization: String,
    pub license_number: String,
    pub license_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckupApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub phone: String,
    pub email: Option<String>,
    pub concern: String,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub report_path: Option<String>,
    pub selfie_paths: Vec<String>,
    pub problem_description: String,
    pub problem_duration: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: Uuid,
    pub application_id: Uuid,
    pub sender_id: Uuid,
    pub sender_role: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KitItem {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KitRecommendation {
    pub id: Uuid,
    pub application_id: Uuid,
    pub doctor_id: Uuid,
    pub items: Vec<KitItem>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<entity::users::Model> for User {
    fn from(m: entity::users::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::profiles::Model> for Profile {
    fn from(m: entity::profiles::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            phone: m.phone,
            address_line: m.address_line,
            city: m.city,
            state: m.state,
            postal_code: m.postal_code,
            country: m.country,
            is_admin: m.is_admin,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::categories::Model> for Category {
    fn from(m: entity::categories::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            image_url: m.image_url,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::products::Model> for Product {
    fn from(m: entity::products::Model) -> Self {
        Self {
            id: m.id,
            category_id: m.category_id,
            name: m.name,
            description: m.description,
            price: m.price,
            stock: m.stock,
            image_url: m.image_url,
            is_active: m.is_active,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::cart_items::Model> for CartItem {
    fn from(m: entity::cart_items::Model) -> Self {
        Self {
            id: m.id,
            cart_id: m.cart_id,
            product_id: m.product_id,
            quantity: m.quantity,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::coupons::Model> for Coupon {
    fn from(m: entity::coupons::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            discount_percentage: m.discount_percentage,
            expires_at: m.expires_at.map(|dt| dt.with_timezone(&Utc)),
            is_active: m.is_active,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::orders::Model> for Order {
    fn from(m: entity::orders::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            coupon_id: m.coupon_id,
            subtotal: m.subtotal,
            discount_amount: m.discount_amount,
            total_amount: m.total_amount,
            status: m.status,
            payment_method: m.payment_method,
            payment_status: m.payment_status,
            invoice_number: m.invoice_number,
            shipping_name: m.shipping_name,
            shipping_phone: m.shipping_phone,
            shipping_address: m.shipping_address,
            shipping_city: m.shipping_city,
            shipping_state: m.shipping_state,
            shipping_postal_code: m.shipping_postal_code,
            paid_at: m.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(m: entity::order_items::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            product_id: m.product_id,
            product_name: m.product_name,
            quantity: m.quantity,
            price: m.price,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::addresses::Model> for Address {
    fn from(m: entity::addresses::Model) -> Self {
        Self {
            id: m.id,
            label: m.label,
            full_name: m.full_name,
            phone: m.phone,
            address_line: m.address_line,
            city: m.city,
            state: m.state,
            postal_code: m.postal_code,
            is_default: m.is_default,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::payment_methods::Model> for SavedPaymentMethod {
    fn from(m: entity::payment_methods::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            label: m.label,
            last_four: m.last_four,
            is_default: m.is_default,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::blog_posts::Model> for BlogPost {
    fn from(m: entity::blog_posts::Model) -> Self {
        Self {
            id: m.id,
            author_id: m.author_id,
            title: m.title,
            slug: m.slug,
            excerpt: m.excerpt,
            content: m.content,
            cover_image_url: m.cover_image_url,
            published: m.published,
            published_at: m.published_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::doctors::Model> for Doctor {
    fn from(m: entity::doctors::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            full_name: m.full_name,
            specialization: m.specialization,
            license_number: m.license_number,
            license_path: m.license_path,
            status: m.status,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::checkup_applications::Model> for CheckupApplication {
    fn from(m: entity::checkup_applications::Model) -> Self {
        // Rows written by this service always hold a string array.
        let selfie_paths = serde_json::from_value(m.selfie_paths).unwrap_or_default();
        Self {
            id: m.id,
            user_id: m.user_id,
            doctor_id: m.doctor_id,
            full_name: m.full_name,
            age: m.age,
            gender: m.gender,
            phone: m.phone,
            email: m.email,
            concern: m.concern,
            medical_history: m.medical_history,
            current_medications: m.current_medications,
            allergies: m.allergies,
            report_path: m.report_path,
            selfie_paths,
            problem_description: m.problem_description,
            problem_duration: m.problem_duration,
            status: m.status,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::chat_messages::Model> for ChatMessage {
    fn from(m: entity::chat_messages::Model) -> Self {
        Self {
            id: m.id,
            application_id: m.application_id,
            sender_id: m.sender_id,
            sender_role: m.sender_role,
            body: m.body,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::kit_recommendations::Model> for KitRecommendation {
    fn from(m: entity::kit_recommendations::Model) -> Self {
        let items = serde_json::from_value(m.items).unwrap_or_default();
        Self {
            id: m.id,
            application_id: m.application_id,
            doctor_id: m.doctor_id,
            items,
            notes: m.notes,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}
