use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses, admin as admin_dto, auth as auth_dto, blog as blog_dto, cart as cart_dto,
        categories as category_dto, checkups as checkup_dto, coupons as coupon_dto,
        doctors as doctor_dto, orders as order_dto, payment_methods as payment_dto,
        products as product_dto, profile as profile_dto,
    },
    intake::{Concern, IntakeDraft, IntakeStep},
    models::{
        Address, BlogPost, CartItem, Category, ChatMessage, CheckupApplication, Coupon, Doctor,
        KitItem, KitRecommendation, Order, OrderItem, Product, Profile, SavedPaymentMethod, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses as address_routes, admin, auth, blog, cart, categories, checkups, coupons,
        doctor, files, health, orders, params, payment_methods, products as product_routes,
        profile,
    },
    status::{CheckupStatus, DoctorStatus, OrderStatus, PaymentMethod, PaymentStatus},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        profile::get_profile,
        profile::update_profile,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        coupons::list_active,
        coupons::apply_coupon,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        address_routes::list_addresses,
        address_routes::create_address,
        address_routes::update_address,
        address_routes::set_default_address,
        address_routes::delete_address,
        payment_methods::list_methods,
        payment_methods::create_method,
        payment_methods::set_default_method,
        payment_methods::delete_method,
        blog::list_posts,
        blog::get_post,
        checkups::validate_step,
        checkups::submit_checkup,
        checkups::my_checkups,
        checkups::get_checkup,
        checkups::list_messages,
        checkups::post_message,
        checkups::get_kit,
        doctor::register,
        doctor::me,
        doctor::list_checkups,
        doctor::advance_status,
        doctor::upsert_kit,
        files::download,
        admin::dashboard,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_payment_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_customers,
        admin::list_doctors,
        admin::update_doctor_status,
        admin::list_coupons,
        admin::create_coupon,
        admin::update_coupon,
        admin::delete_coupon,
        admin::list_posts,
        admin::create_post,
        admin::update_post,
        admin::delete_post
    ),
    components(
        schemas(
            User,
            Profile,
            Category,
            Product,
            CartItem,
            Coupon,
            Order,
            OrderItem,
            Address,
            SavedPaymentMethod,
            BlogPost,
            Doctor,
            CheckupApplication,
            ChatMessage,
            KitItem,
            KitRecommendation,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            CheckupStatus,
            DoctorStatus,
            IntakeStep,
            Concern,
            IntakeDraft,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::Me,
            profile_dto::UpdateProfileRequest,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ProductList,
            category_dto::CreateCategoryRequest,
            category_dto::UpdateCategoryRequest,
            category_dto::CategoryList,
            cart_dto::AddToCartRequest,
            cart_dto::UpdateCartItemRequest,
            cart_dto::CartItemDto,
            cart_dto::CartSummary,
            coupon_dto::ApplyCouponRequest,
            coupon_dto::CouponQuote,
            coupon_dto::CreateCouponRequest,
            coupon_dto::UpdateCouponRequest,
            coupon_dto::CouponList,
            order_dto::ShippingDetails,
            order_dto::CheckoutRequest,
            order_dto::OrderWithItems,
            order_dto::OrderList,
            order_dto::UpdateOrderStatusRequest,
            order_dto::UpdatePaymentStatusRequest,
            addresses::AddressRequest,
            addresses::AddressList,
            payment_dto::PaymentMethodRequest,
            payment_dto::PaymentMethodList,
            blog_dto::CreateBlogPostRequest,
            blog_dto::UpdateBlogPostRequest,
            blog_dto::BlogPostList,
            checkup_dto::ValidateStepRequest,
            checkup_dto::StepOutcome,
            checkup_dto::CheckupForm,
            checkup_dto::CheckupDetail,
            checkup_dto::CheckupList,
            checkup_dto::UpdateCheckupStatusRequest,
            checkup_dto::PostMessageRequest,
            checkup_dto::ChatThread,
            checkup_dto::KitRequest,
            doctor_dto::DoctorRegistrationForm,
            doctor_dto::DoctorList,
            doctor_dto::UpdateDoctorStatusRequest,
            admin_dto::DashboardStats,
            admin_dto::CustomerList,
            admin_dto::InventoryAdjustRequest,
            admin_dto::LowStockQuery,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<product_dto::ProductList>,
            ApiResponse<cart_dto::CartSummary>,
            ApiResponse<order_dto::OrderWithItems>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<checkup_dto::CheckupDetail>,
            ApiResponse<admin_dto::DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Profile", description = "Customer profile endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Addresses", description = "Saved address endpoints"),
        (name = "Payment methods", description = "Saved payment method endpoints"),
        (name = "Blog", description = "Wellness blog endpoints"),
        (name = "Checkups", description = "Patient checkup endpoints"),
        (name = "Doctor", description = "Doctor portal endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Files", description = "Authenticated downloads of uploaded files"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
