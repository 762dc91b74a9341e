pub mod addresses;
pub mod audit_logs;
pub mod blog_posts;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod chat_messages;
pub mod checkup_applications;
pub mod coupons;
pub mod doctors;
pub mod kit_recommendations;
pub mod order_items;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod profiles;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use blog_posts::Entity as BlogPosts;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use chat_messages::Entity as ChatMessages;
pub use checkup_applications::Entity as CheckupApplications;
pub use coupons::Entity as Coupons;
pub use doctors::Entity as Doctors;
pub use kit_recommendations::Entity as KitRecommendations;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use users::Entity as Users;
