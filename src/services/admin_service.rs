use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{CustomerList, DashboardStats, InventoryAdjustRequest, LowStockQuery},
        doctors::{DoctorList, UpdateDoctorStatusRequest},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest, UpdatePaymentStatusRequest},
        products::ProductList,
    },
    entity::{
        CheckupApplications, Doctors, Orders, Products, Profiles,
        checkup_applications::Column as CheckupCol,
        doctors::{ActiveModel as DoctorActive, Column as DoctorCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol},
        products::{ActiveModel as ProductActive, Column as ProdCol},
        profiles::Column as ProfileCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Doctor, Order, Product, Profile},
    response::{ApiResponse, Meta},
    routes::params::{DoctorListQuery, OrderListQuery, Pagination},
    services::order_service,
    state::AppState,
    status::{CheckupStatus, DoctorStatus, OrderStatus, PaymentStatus},
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(state, user).await?;
    order_service::list_matching(state, Condition::all(), query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(state, user).await?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::with_items(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Order found",
        data,
        Some(Meta::empty()),
    ))
}

/// Delivered and cancelled orders are final; anything else may move freely.
pub fn check_order_transition(current: OrderStatus, next: OrderStatus) -> AppResult<()> {
    if current == next {
        return Ok(());
    }
    if current.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Order is already {current} and cannot change"
        )));
    }
    Ok(())
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(state, user).await?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderStatus = existing.status.parse()?;
    check_order_transition(current, payload.status)?;

    let order = if payload.status == current {
        existing
    } else if payload.status == OrderStatus::Cancelled {
        order_service::cancel_locked(&txn, existing).await?
    } else {
        let mut active: OrderActive = existing.into();
        active.status = Set(payload.status.as_str().into());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    };
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(state, user).await?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.payment_status = Set(payload.payment_status.as_str().into());
    if payload.payment_status == PaymentStatus::Paid {
        active.paid_at = Set(Some(Utc::now().into()));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "payment_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_status": order.payment_status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment status updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(state, user).await?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(state, user).await?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .filter(|s| *s >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct RevenueRow {
    revenue: i64,
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(state, user).await?;

    let products = Products::find().count(&state.orm).await? as i64;
    let orders = Orders::find().count(&state.orm).await? as i64;
    let pending_orders = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;
    let customers = Profiles::find()
        .filter(ProfileCol::IsAdmin.eq(false))
        .count(&state.orm)
        .await? as i64;
    let pending_checkups = CheckupApplications::find()
        .filter(CheckupCol::Status.eq(CheckupStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;
    let pending_doctors = Doctors::find()
        .filter(DoctorCol::Status.eq(DoctorStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;

    // SUM(bigint) is numeric in Postgres; cast back for the row model.
    let revenue = Orders::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(total_amount), 0)::BIGINT"), "revenue")
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
        .into_model::<RevenueRow>()
        .one(&state.orm)
        .await?
        .map(|row| row.revenue)
        .unwrap_or(0);

    let stats = DashboardStats {
        products,
        orders,
        pending_orders,
        customers,
        pending_checkups,
        pending_doctors,
        revenue,
    };
    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(state, user).await?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Profiles::find()
        .filter(ProfileCol::IsAdmin.eq(false))
        .order_by_desc(ProfileCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Profile::from)
        .collect();

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_doctors(
    state: &AppState,
    user: &AuthUser,
    query: DoctorListQuery,
) -> AppResult<ApiResponse<DoctorList>> {
    ensure_admin(state, user).await?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut finder = Doctors::find();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: DoctorStatus = status.parse()?;
        finder = finder.filter(DoctorCol::Status.eq(status.as_str()));
    }
    let finder = finder.order_by_desc(DoctorCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Doctor::from)
        .collect();

    Ok(ApiResponse::success(
        "Doctors",
        DoctorList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_doctor_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDoctorStatusRequest,
) -> AppResult<ApiResponse<Doctor>> {
    ensure_admin(state, user).await?;
    let existing = Doctors::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: DoctorActive = existing.into();
    active.status = Set(payload.status.as_str().into());
    let doctor = active.update(&state.orm).await?;

    tracing::info!(doctor_id = %doctor.id, status = %doctor.status, "doctor status changed");
    audit::record(
        &state.orm,
        user.user_id,
        "doctor_status_update",
        "doctors",
        serde_json::json!({ "doctor_id": doctor.id, "status": doctor.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Doctor updated",
        doctor.into(),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_orders_cannot_move() {
        use OrderStatus::*;
        assert!(check_order_transition(Pending, Shipped).is_ok());
        assert!(check_order_transition(Shipped, Cancelled).is_ok());
        assert!(check_order_transition(Delivered, Delivered).is_ok());
        assert!(matches!(
            check_order_transition(Delivered, Processing),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_order_transition(Cancelled, Pending).is_err());
    }
}
