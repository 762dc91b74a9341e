use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, Condition, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::coupons::{
        ApplyCouponRequest, CouponList, CouponQuote, CreateCouponRequest, UpdateCouponRequest,
    },
    entity::{
        Coupons,
        coupons::{ActiveModel as CouponActive, Column as CouponCol, Model as CouponModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Coupon,
    pricing::{self, CouponRejection, CouponRule},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

fn rule(model: &CouponModel) -> CouponRule {
    CouponRule {
        discount_percentage: model.discount_percentage,
        is_active: model.is_active,
        expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Look a code up and check it is usable at `now`.
///
/// Runs on whatever connection the caller holds, so checkout re-validates
/// inside its own transaction.
pub async fn resolve_coupon<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    now: DateTime<Utc>,
) -> AppResult<CouponModel> {
    let wanted = pricing::normalize_code(code);
    if wanted.is_empty() {
        return Err(CouponRejection::Unknown.into());
    }
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(wanted))
        .one(conn)
        .await?
        .ok_or(CouponRejection::Unknown)?;
    pricing::check_coupon(&rule(&coupon), now)?;
    Ok(coupon)
}

pub async fn list_active(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    let (page, limit, offset) = pagination.normalize();
    let now: DateTime<chrono::FixedOffset> = Utc::now().into();
    let finder = Coupons::find()
        .filter(
            Condition::all().add(CouponCol::IsActive.eq(true)).add(
                Condition::any()
                    .add(CouponCol::ExpiresAt.is_null())
                    .add(CouponCol::ExpiresAt.gt(now)),
            ),
        )
        .order_by_desc(CouponCol::DiscountPercentage);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Preview what a code would take off the caller's current cart.
pub async fn apply_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponQuote>> {
    let coupon = resolve_coupon(&state.orm, &payload.code, Utc::now()).await?;

    let cart = cart_service::cart_for_user(&state.orm, user.user_id).await?;
    let rows = cart_service::cart_lines(&state.orm, cart.id).await?;
    let summary = cart_service::summarize(cart.id, rows);
    if summary.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let discount_amount = pricing::discount_amount(summary.subtotal, coupon.discount_percentage);
    let quote = CouponQuote {
        subtotal: summary.subtotal,
        discount_amount,
        total: summary.subtotal - discount_amount,
        coupon: coupon.into(),
    };
    Ok(ApiResponse::success(
        "Coupon applied",
        quote,
        Some(Meta::empty()),
    ))
}

fn validate_percentage(pct: i32) -> AppResult<()> {
    if !(1..=100).contains(&pct) {
        return Err(AppError::BadRequest(
            "discount_percentage must be between 1 and 100".into(),
        ));
    }
    Ok(())
}

fn clean_code(code: &str) -> AppResult<String> {
    let code = pricing::normalize_code(code);
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".into()));
    }
    Ok(code)
}

pub async fn list_all(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(state, user).await?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Coupons::find().order_by_desc(CouponCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();
    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(state, user).await?;
    let code = clean_code(&payload.code)?;
    validate_percentage(payload.discount_percentage)?;

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_percentage: Set(payload.discount_percentage),
        expires_at: Set(payload.expires_at.map(Into::into)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon created",
        coupon.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(state, user).await?;
    let existing = Coupons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CouponActive = existing.into();
    if let Some(code) = payload.code {
        active.code = Set(clean_code(&code)?);
    }
    if let Some(pct) = payload.discount_percentage {
        validate_percentage(pct)?;
        active.discount_percentage = Set(pct);
    }
    if payload.clear_expiry {
        active.expires_at = Set(None);
    } else if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(Some(expires_at.into()));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let coupon = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "coupon_update",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        coupon.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(state, user).await?;
    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        user.user_id,
        "coupon_delete",
        "coupons",
        serde_json::json!({ "coupon_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(1).is_ok());
        assert!(validate_percentage(100).is_ok());
        assert!(validate_percentage(0).is_err());
        assert!(validate_percentage(101).is_err());
    }

    #[test]
    fn codes_are_stored_upper_cased() {
        assert_eq!(clean_code("  welcome10 ").unwrap(), "WELCOME10");
        assert!(matches!(clean_code("   "), Err(AppError::BadRequest(_))));
    }
}
