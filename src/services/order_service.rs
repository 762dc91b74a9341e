use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, ShippingDetails},
    entity::{
        Addresses, CartItems, Carts, OrderItems, Orders, Products, Profiles,
        addresses::Column as AddressCol,
        cart_items::Column as CartItemCol,
        carts::Column as CartCol,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::{Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    pricing::{self, CartLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{coupon_service, profile_service},
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_matching(state, condition, query).await
}

/// Shared by the customer and admin listings.
pub(crate) async fn list_matching(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}

fn require_field(value: &str, name: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("shipping {name} is required")));
    }
    Ok(())
}

pub fn validate_shipping(shipping: &ShippingDetails) -> AppResult<()> {
    require_field(&shipping.full_name, "full_name")?;
    require_field(&shipping.phone, "phone")?;
    require_field(&shipping.address_line, "address_line")?;
    require_field(&shipping.city, "city")?;
    require_field(&shipping.state, "state")?;
    require_field(&shipping.postal_code, "postal_code")?;
    Ok(())
}

/// Explicit details win, then a saved address, then the default address,
/// then the profile's shipping defaults.
async fn resolve_shipping(
    state: &AppState,
    user_id: Uuid,
    payload: &CheckoutRequest,
) -> AppResult<ShippingDetails> {
    if let Some(shipping) = &payload.shipping {
        return Ok(shipping.clone());
    }

    let address = match payload.address_id {
        Some(id) => Some(
            Addresses::find_by_id(id)
                .filter(AddressCol::UserId.eq(user_id))
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::BadRequest("address not found".into()))?,
        ),
        None => {
            Addresses::find()
                .filter(
                    Condition::all()
                        .add(AddressCol::UserId.eq(user_id))
                        .add(AddressCol::IsDefault.eq(true)),
                )
                .one(&state.orm)
                .await?
        }
    };
    if let Some(a) = address {
        return Ok(ShippingDetails {
            full_name: a.full_name,
            phone: a.phone,
            address_line: a.address_line,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
        });
    }

    let profile = Profiles::find_by_id(user_id).one(&state.orm).await?;
    let details = profile.and_then(|p| {
        Some(ShippingDetails {
            full_name: p.full_name?,
            phone: p.phone?,
            address_line: p.address_line?,
            city: p.city?,
            state: p.state?,
            postal_code: p.postal_code?,
        })
    });
    details.ok_or_else(|| AppError::BadRequest("shipping details are required".into()))
}

/// Every step runs inside one transaction; any error drops it and rolls back.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping = resolve_shipping(state, user.user_id, &payload).await?;
    validate_shipping(&shipping)?;

    let txn = state.orm.begin().await?;

    if payload.save_as_default {
        profile_service::save_shipping_defaults(&txn, user.user_id, &shipping).await?;
    }

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let cart_items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .lock_exclusive()
        .all(&txn)
        .await?;
    if cart_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let product_ids: Vec<Uuid> = cart_items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock_exclusive()
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut rows = Vec::with_capacity(cart_items.len());
    for item in &cart_items {
        let product = products
            .get(&item.product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::BadRequest("a product in the cart is no longer available".into()))?;
        rows.push((item, product));
    }

    let lines: Vec<CartLine> = rows
        .iter()
        .map(|(item, product)| CartLine {
            quantity: item.quantity,
            unit_price: product.price,
        })
        .collect();
    let subtotal = pricing::cart_total(&lines);

    let now = Utc::now();
    let coupon = match payload
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(code) => Some(coupon_service::resolve_coupon(&txn, code, now).await?),
        None => None,
    };

    for (item, product) in &rows {
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
    }

    let discount_amount = coupon
        .as_ref()
        .map(|c| pricing::discount_amount(subtotal, c.discount_percentage))
        .unwrap_or(0);

    // Non-COD payments are simulated and settle immediately.
    let settled = payload.payment_method.settles_at_checkout();
    let payment_status = if settled {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    };

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        coupon_id: Set(coupon.as_ref().map(|c| c.id)),
        subtotal: Set(subtotal),
        discount_amount: Set(discount_amount),
        total_amount: Set(subtotal - discount_amount),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_method: Set(payload.payment_method.as_str().into()),
        payment_status: Set(payment_status.as_str().into()),
        invoice_number: Set(build_invoice_number(order_id)),
        shipping_name: Set(shipping.full_name.trim().to_string()),
        shipping_phone: Set(shipping.phone.trim().to_string()),
        shipping_address: Set(shipping.address_line.trim().to_string()),
        shipping_city: Set(shipping.city.trim().to_string()),
        shipping_state: Set(shipping.state.trim().to_string()),
        shipping_postal_code: Set(shipping.postal_code.trim().to_string()),
        paid_at: Set(settled.then(|| now.into())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(rows.len());
    for (item, product) in &rows {
        let saved = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            quantity: Set(item.quantity),
            price: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(saved));

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        total = order.total_amount,
        items = order_items.len(),
        "order placed"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "coupon_id": order.coupon_id,
            "total_amount": order.total_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order.into(),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Put the ordered quantities back on the shelf.
pub(crate) async fn restock(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    // Same product lock order as checkout.
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(txn)
        .await?;
    for item in items {
        if let Some(product_id) = item.product_id {
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
                .filter(ProdCol::Id.eq(product_id))
                .exec(txn)
                .await?;
        }
    }
    Ok(())
}

/// Move an order to `cancelled`, restocking and refunding a settled payment.
pub(crate) async fn cancel_locked(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> AppResult<OrderModel> {
    restock(txn, order.id).await?;
    let was_paid = order.payment_status == PaymentStatus::Paid.as_str();
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().into());
    if was_paid {
        active.payment_status = Set(PaymentStatus::Refunded.as_str().into());
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Customers may cancel their own orders while still pending.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status != OrderStatus::Pending.as_str() {
        return Err(AppError::BadRequest(
            "Only pending orders can be cancelled".into(),
        ));
    }

    let order = cancel_locked(&txn, order).await?;
    let order = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        order,
        Some(Meta::empty()),
    ))
}

fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("INV-{}-{}", date, &suffix[..8]).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address_line: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            postal_code: "411001".into(),
        }
    }

    #[test]
    fn invoice_number_has_date_and_short_id() {
        let id = Uuid::new_v4();
        let invoice = build_invoice_number(id);
        let parts: Vec<&str> = invoice.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INV");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            parts[2],
            id.simple().to_string()[..8].to_uppercase()
        );
    }

    #[test]
    fn shipping_requires_every_field() {
        assert!(validate_shipping(&shipping()).is_ok());
        let mut missing_city = shipping();
        missing_city.city = "  ".into();
        match validate_shipping(&missing_city) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("city")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
