pub mod addresses;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod categories;
pub mod checkups;
pub mod coupons;
pub mod doctors;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod profile;
