use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{CustomerList, DashboardStats, InventoryAdjustRequest, LowStockQuery},
        blog::{BlogPostList, CreateBlogPostRequest, UpdateBlogPostRequest},
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
        doctors::{DoctorList, UpdateDoctorStatusRequest},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest, UpdatePaymentStatusRequest},
        products::ProductList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BlogPost, Coupon, Doctor, Order, Product},
    response::ApiResponse,
    routes::params::{DoctorListQuery, OrderListQuery, Pagination},
    services::{admin_service, blog_service, coupon_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/payment-status", patch(update_payment_status))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/customers", get(list_customers))
        .route("/doctors", get(list_doctors))
        .route("/doctors/{id}/status", patch(update_doctor_status))
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/{id}", put(update_coupon).delete(delete_coupon))
        .route("/blog", get(list_posts).post(create_post))
        .route("/blog/{id}", put(update_post).delete(delete_post))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Store counters and paid revenue", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = admin_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Any order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Order is already final")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/payment-status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = ApiResponse<Order>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_payment_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("threshold" = Option<i32>, Query, description = "Stock at or below this, default 5")
    ),
    responses(
        (status = 200, description = "Products running low", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted by delta", body = ApiResponse<Product>),
        (status = 400, description = "Zero delta or negative result")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Customer profiles", body = ApiResponse<CustomerList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CustomerList>>> {
    let resp = admin_service::list_customers(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending | approved | rejected")
    ),
    responses(
        (status = 200, description = "Doctor registrations", body = ApiResponse<DoctorList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_doctors(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DoctorListQuery>,
) -> AppResult<Json<ApiResponse<DoctorList>>> {
    let resp = admin_service::list_doctors(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/doctors/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Doctor ID")
    ),
    request_body = UpdateDoctorStatusRequest,
    responses(
        (status = 200, description = "Doctor approved or rejected", body = ApiResponse<Doctor>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_doctor_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDoctorStatusRequest>,
) -> AppResult<Json<ApiResponse<Doctor>>> {
    let resp = admin_service::update_doctor_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/coupons",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "All coupons", body = ApiResponse<CouponList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_all(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 200, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 409, description = "Code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::create_coupon(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/coupons/{id}",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = ApiResponse<Coupon>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::update_coupon(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/coupons/{id}",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    responses(
        (status = 200, description = "Coupon deleted"),
        (status = 404, description = "Coupon not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = coupon_service::delete_coupon(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/blog",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "All posts including drafts", body = ApiResponse<BlogPostList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BlogPostList>>> {
    let resp = blog_service::list_all(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog",
    request_body = CreateBlogPostRequest,
    responses(
        (status = 200, description = "Post created", body = ApiResponse<BlogPost>),
        (status = 409, description = "Slug already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBlogPostRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::create_post(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/blog/{id}",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    request_body = UpdateBlogPostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<BlogPost>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBlogPostRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::update_post(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/blog/{id}",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = blog_service::delete_post(&state, &user, id).await?;
    Ok(Json(resp))
}
