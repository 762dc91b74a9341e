pub mod address_service;
pub mod admin_service;
pub mod auth_service;
pub mod blog_service;
pub mod cart_service;
pub mod category_service;
pub mod checkup_service;
pub mod coupon_service;
pub mod doctor_service;
pub mod file_service;
pub mod order_service;
pub mod payment_method_service;
pub mod product_service;
pub mod profile_service;
