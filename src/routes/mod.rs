use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod categories;
pub mod checkups;
pub mod coupons;
pub mod doc;
pub mod doctor;
pub mod files;
pub mod health;
pub mod orders;
pub mod params;
pub mod payment_methods;
pub mod products;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/coupons", coupons::router())
        .nest("/orders", orders::route())
        .nest("/addresses", addresses::router())
        .nest("/payment-methods", payment_methods::router())
        .nest("/blog", blog::router())
        .nest("/checkups", checkups::router())
        .nest("/doctor", doctor::router())
        .nest("/admin", admin::router())
        .nest("/files", files::router())
}
