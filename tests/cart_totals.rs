mod common;

use wellness_store_api::{
    dto::cart::{AddToCartRequest, CartSummary, UpdateCartItemRequest},
    services::cart_service,
};

fn assert_totals(summary: &CartSummary, item_count: i64, subtotal: i64) {
    assert_eq!(summary.item_count, item_count);
    assert_eq!(summary.subtotal, subtotal);
    let recomputed: i64 = summary
        .items
        .iter()
        .map(|line| i64::from(line.quantity) * line.product.price)
        .sum();
    assert_eq!(recomputed, summary.subtotal);
}

// add -> update(3) -> update(0) -> re-add -> remove keeps totals in step with the lines.
#[tokio::test]
async fn cart_totals_follow_every_mutation() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, false).await?;
    let oil = common::create_product(&state, 59900, 10).await?;
    let tea = common::create_product(&state, 24900, 10).await?;

    let summary = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: oil,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_totals(&summary, 2, 119800);

    let summary = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: tea,
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();
    assert_totals(&summary, 3, 144700);

    let summary =
        cart_service::update_cart_item(&state, &customer, oil, UpdateCartItemRequest { quantity: 3 })
            .await?
            .data
            .unwrap();
    assert_totals(&summary, 4, 204600);

    // Zero removes the line instead of storing it.
    let summary =
        cart_service::update_cart_item(&state, &customer, oil, UpdateCartItemRequest { quantity: 0 })
            .await?
            .data
            .unwrap();
    assert_totals(&summary, 1, 24900);
    assert!(summary.items.iter().all(|line| line.product.id != oil));

    let summary = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: oil,
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();
    assert_totals(&summary, 2, 84800);

    let summary = cart_service::remove_from_cart(&state, &customer, tea)
        .await?
        .data
        .unwrap();
    assert_totals(&summary, 1, 59900);

    let summary = cart_service::update_cart_item(
        &state,
        &customer,
        oil,
        UpdateCartItemRequest { quantity: -2 },
    )
    .await?
    .data
    .unwrap();
    assert_totals(&summary, 0, 0);
    assert!(summary.items.is_empty());

    Ok(())
}
