mod common;

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;
use wellness_store_api::{
    dto::{
        cart::AddToCartRequest,
        coupons::{ApplyCouponRequest, CreateCouponRequest},
        orders::{CheckoutRequest, ShippingDetails, UpdateOrderStatusRequest},
    },
    entity::{Orders, Products, coupons, orders, products},
    error::AppError,
    middleware::auth::AuthUser,
    services::{admin_service, cart_service, coupon_service, order_service},
    state::AppState,
    status::{OrderStatus, PaymentMethod},
};

fn shipping() -> ShippingDetails {
    ShippingDetails {
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line: "12 MG Road".into(),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
    }
}

fn checkout_request(coupon_code: Option<String>) -> CheckoutRequest {
    CheckoutRequest {
        shipping: Some(shipping()),
        address_id: None,
        payment_method: PaymentMethod::Cod,
        coupon_code,
        save_as_default: false,
    }
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product missing"))?;
    Ok(product.stock)
}

async fn order_count(state: &AppState, user: &AuthUser) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(orders::Column::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?)
}

// Customer fills the cart, applies a coupon and checks out; admin ships and delivers.
#[tokio::test]
async fn cart_coupon_checkout_and_admin_status_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, false).await?;
    let admin = common::create_user(&state, true).await?;
    let product_id = common::create_product(&state, 59900, 5).await?;

    let summary = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(summary.subtotal, 119800);
    assert_eq!(summary.item_count, 2);

    let code = common::unique("TEN").to_uppercase();
    coupon_service::create_coupon(
        &state,
        &admin,
        CreateCouponRequest {
            code: code.clone(),
            discount_percentage: 10,
            expires_at: Some(Utc::now() + Duration::days(1)),
            is_active: Some(true),
        },
    )
    .await?;

    let quote = coupon_service::apply_coupon(
        &state,
        &customer,
        ApplyCouponRequest {
            code: code.to_lowercase(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(quote.discount_amount, 11980);
    assert_eq!(quote.total, 107820);

    let placed = order_service::checkout(&state, &customer, checkout_request(Some(code)))
        .await?
        .data
        .unwrap();
    assert_eq!(placed.order.subtotal, 119800);
    assert_eq!(placed.order.total_amount, 107820);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.payment_status, "pending");
    assert!(placed.order.invoice_number.starts_with("INV-"));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, 59900);

    assert_eq!(stock_of(&state, product_id).await?, 3);
    let cart = cart_service::get_cart(&state, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    // Customers cannot reach the admin surface.
    let denied = admin_service::update_order_status(
        &state,
        &customer,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    for next in [OrderStatus::Shipped, OrderStatus::Delivered] {
        let updated = admin_service::update_order_status(
            &state,
            &admin,
            placed.order.id,
            UpdateOrderStatusRequest { status: next },
        )
        .await?
        .data
        .unwrap();
        assert_eq!(updated.status, next.as_str());
    }

    let reopened = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Processing,
        },
    )
    .await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn insufficient_stock_leaves_everything_untouched() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, false).await?;
    let product_id = common::create_product(&state, 25000, 2).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;

    // Someone else buys one in the meantime.
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product missing"))?;
    let mut active: products::ActiveModel = product.into();
    active.stock = Set(1);
    active.update(&state.orm).await?;

    let result = order_service::checkout(&state, &customer, checkout_request(None)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(stock_of(&state, product_id).await?, 1);
    assert_eq!(order_count(&state, &customer).await?, 0);
    let cart = cart_service::get_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.item_count, 2);

    Ok(())
}

#[tokio::test]
async fn expired_coupon_rejects_checkout_without_side_effects() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, false).await?;
    let product_id = common::create_product(&state, 10000, 4).await?;

    let code = common::unique("OLD").to_uppercase();
    coupons::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.clone()),
        discount_percentage: Set(20),
        expires_at: Set(Some((Utc::now() - Duration::days(1)).into())),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 1,
        },
    )
    .await?;

    let result = order_service::checkout(&state, &customer, checkout_request(Some(code))).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(stock_of(&state, product_id).await?, 4);
    assert_eq!(order_count(&state, &customer).await?, 0);
    let cart = cart_service::get_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.subtotal, 10000);

    Ok(())
}

#[tokio::test]
async fn cancelling_a_pending_order_restocks() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, false).await?;
    let product_id = common::create_product(&state, 39900, 6).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 3,
        },
    )
    .await?;
    let placed = order_service::checkout(&state, &customer, checkout_request(None))
        .await?
        .data
        .unwrap();
    assert_eq!(stock_of(&state, product_id).await?, 3);

    let cancelled = order_service::cancel_order(&state, &customer, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.order.status, "cancelled");
    assert_eq!(stock_of(&state, product_id).await?, 6);

    let again = order_service::cancel_order(&state, &customer, placed.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    Ok(())
}

// Carts hold the same two products in opposite orders; every checkout must go through.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_over_shared_products_all_succeed() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let first = common::create_product(&state, 24900, 20).await?;
    let second = common::create_product(&state, 59900, 20).await?;

    let mut customers = Vec::new();
    for n in 0..8 {
        let customer = common::create_user(&state, false).await?;
        let order = if n % 2 == 0 {
            [first, second]
        } else {
            [second, first]
        };
        for product_id in order {
            cart_service::add_to_cart(
                &state,
                &customer,
                AddToCartRequest {
                    product_id,
                    quantity: 1,
                },
            )
            .await?;
        }
        customers.push(customer);
    }

    let mut handles = Vec::new();
    for customer in customers.clone() {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            order_service::checkout(&state, &customer, checkout_request(None)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(stock_of(&state, first).await?, 12);
    assert_eq!(stock_of(&state, second).await?, 12);
    for customer in &customers {
        assert_eq!(order_count(&state, customer).await?, 1);
    }

    Ok(())
}
