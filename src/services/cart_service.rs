use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, Condition, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartSummary, UpdateCartItemRequest},
    entity::{
        CartItems, Carts, Products,
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Model as CartModel},
        products::Model as ProductModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing::{self, CartLine},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The user's single cart, created on first use.
pub async fn cart_for_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart);
    }
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(cart)
}

/// Cart rows joined with their products, oldest first.
pub async fn cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<(CartItemModel, ProductModel)>> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .collect())
}

pub fn summarize(cart_id: Uuid, rows: Vec<(CartItemModel, ProductModel)>) -> CartSummary {
    let lines: Vec<CartLine> = rows
        .iter()
        .map(|(item, product)| CartLine {
            quantity: item.quantity,
            unit_price: product.price,
        })
        .collect();
    let items = rows
        .into_iter()
        .map(|(item, product)| CartItemDto {
            id: item.id,
            line_total: i64::from(item.quantity) * product.price,
            quantity: item.quantity,
            product: product.into(),
        })
        .collect();
    CartSummary {
        cart_id,
        items,
        item_count: pricing::item_count(&lines),
        subtotal: pricing::cart_total(&lines),
    }
}

async fn load_summary(state: &AppState, user_id: Uuid) -> AppResult<CartSummary> {
    let cart = cart_for_user(&state.orm, user_id).await?;
    let rows = cart_lines(&state.orm, cart.id).await?;
    Ok(summarize(cart.id, rows))
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let summary = load_summary(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", summary, Some(Meta::empty())))
}

async fn find_item(
    state: &AppState,
    cart_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<CartItemModel>> {
    Ok(CartItems::find()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart_id))
                .add(CartItemCol::ProductId.eq(product_id)),
        )
        .one(&state.orm)
        .await?)
}

fn ensure_stock(product: &ProductModel, wanted: i32) -> AppResult<()> {
    if wanted > product.stock {
        return Err(AppError::BadRequest(format!(
            "only {} of {} in stock",
            product.stock.max(0),
            product.name
        )));
    }
    Ok(())
}

/// Add `quantity` units; an existing line is incremented rather than replaced.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;

    let cart = cart_for_user(&state.orm, user.user_id).await?;

    match find_item(state, cart.id, product.id).await? {
        Some(item) => {
            let quantity = item.quantity.saturating_add(payload.quantity);
            ensure_stock(&product, quantity)?;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
        }
        None => {
            ensure_stock(&product, payload.quantity)?;
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    audit::record(
        &state.orm,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": payload.quantity }),
    )
    .await;

    let summary = load_summary(state, user.user_id).await?;
    Ok(ApiResponse::success("Added to cart", summary, Some(Meta::empty())))
}

/// Set the quantity of a line; anything below 1 removes it.
pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    if payload.quantity < 1 {
        return remove_from_cart(state, user, product_id).await;
    }

    let cart = cart_for_user(&state.orm, user.user_id).await?;
    let item = find_item(state, cart.id, product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_stock(&product, payload.quantity)?;

    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    let summary = load_summary(state, user.user_id).await?;
    Ok(ApiResponse::success("Cart updated", summary, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartSummary>> {
    let cart = cart_for_user(&state.orm, user.user_id).await?;
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart.id))
                .add(CartItemCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let summary = load_summary(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Removed from cart",
        summary,
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let cart = cart_for_user(&state.orm, user.user_id).await?;
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Cart cleared",
        summarize(cart.id, Vec::new()),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(quantity: i32, price: i64) -> (CartItemModel, ProductModel) {
        let now = Utc::now().fixed_offset();
        let product_id = Uuid::new_v4();
        (
            CartItemModel {
                id: Uuid::new_v4(),
                cart_id: Uuid::nil(),
                product_id,
                quantity,
                created_at: now,
            },
            ProductModel {
                id: product_id,
                category_id: None,
                name: format!("product {price}"),
                description: None,
                price,
                stock: 100,
                image_url: None,
                is_active: true,
                created_at: now,
            },
        )
    }

    #[test]
    fn summary_totals_match_lines() {
        let summary = summarize(Uuid::nil(), vec![row(2, 59_900), row(1, 15_000)]);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, 2 * 59_900 + 15_000);
        assert_eq!(summary.items[0].line_total, 119_800);
        assert_eq!(
            summary.subtotal,
            summary.items.iter().map(|i| i.line_total).sum::<i64>()
        );
    }

    #[test]
    fn empty_cart_has_zero_totals() {
        let summary = summarize(Uuid::nil(), Vec::new());
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.subtotal, 0);
        assert!(summary.items.is_empty());
    }

    #[test]
    fn stock_guard_reports_availability() {
        let (_, product) = row(1, 100);
        assert!(ensure_stock(&product, 100).is_ok());
        assert!(matches!(
            ensure_stock(&product, 101),
            Err(AppError::BadRequest(_))
        ));
    }
}
