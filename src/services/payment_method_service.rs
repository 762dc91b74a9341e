use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::payment_methods::{PaymentMethodList, PaymentMethodRequest},
    entity::{
        PaymentMethods,
        payment_methods::{
            ActiveModel as MethodActive, Column as MethodCol, Model as MethodModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::SavedPaymentMethod,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

/// Only the last four digits are ever stored.
pub fn validate_last_four(value: Option<&str>) -> AppResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()) => Ok(Some(v.into())),
        Some(_) => Err(AppError::BadRequest(
            "last_four must be exactly 4 digits".into(),
        )),
    }
}

async fn owned(txn: &DatabaseTransaction, user_id: Uuid, id: Uuid) -> AppResult<MethodModel> {
    PaymentMethods::find_by_id(id)
        .filter(MethodCol::UserId.eq(user_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn unset_defaults(txn: &DatabaseTransaction, user_id: Uuid, keep: Uuid) -> AppResult<()> {
    PaymentMethods::update_many()
        .col_expr(MethodCol::IsDefault, Expr::value(false))
        .filter(
            Condition::all()
                .add(MethodCol::UserId.eq(user_id))
                .add(MethodCol::Id.ne(keep)),
        )
        .exec(txn)
        .await?;
    Ok(())
}

pub async fn list_methods(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PaymentMethodList>> {
    let items = PaymentMethods::find()
        .filter(MethodCol::UserId.eq(user.user_id))
        .order_by_desc(MethodCol::IsDefault)
        .order_by_desc(MethodCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(SavedPaymentMethod::from)
        .collect();
    Ok(ApiResponse::success(
        "Payment methods",
        PaymentMethodList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_method(
    state: &AppState,
    user: &AuthUser,
    payload: PaymentMethodRequest,
) -> AppResult<ApiResponse<SavedPaymentMethod>> {
    if payload.label.trim().is_empty() {
        return Err(AppError::BadRequest("label is required".into()));
    }
    let last_four = validate_last_four(payload.last_four.as_deref())?;

    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = PaymentMethods::find()
        .filter(MethodCol::UserId.eq(user.user_id))
        .count(&txn)
        .await?;
    let is_default = payload.is_default || existing == 0;

    let id = Uuid::new_v4();
    if is_default {
        unset_defaults(&txn, user.user_id, id).await?;
    }
    let method = MethodActive {
        id: Set(id),
        user_id: Set(user.user_id),
        kind: Set(payload.kind.as_str().into()),
        label: Set(payload.label.trim().to_string()),
        last_four: Set(last_four),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "payment_method_create",
        "payment_methods",
        serde_json::json!({ "payment_method_id": method.id, "kind": method.kind }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment method saved",
        method.into(),
        Some(Meta::empty()),
    ))
}

pub async fn set_default_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SavedPaymentMethod>> {
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = owned(&txn, user.user_id, id).await?;
    unset_defaults(&txn, user.user_id, id).await?;

    let mut active: MethodActive = existing.into();
    active.is_default = Set(true);
    let method = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Default payment method updated",
        method.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = owned(&txn, user.user_id, id).await?;
    PaymentMethods::delete_by_id(existing.id).exec(&txn).await?;

    if existing.is_default {
        let next = PaymentMethods::find()
            .filter(MethodCol::UserId.eq(user.user_id))
            .order_by_desc(MethodCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut active: MethodActive = next.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "payment_method_delete",
        "payment_methods",
        serde_json::json!({ "payment_method_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_four_must_be_four_digits() {
        assert_eq!(validate_last_four(None).unwrap(), None);
        assert_eq!(validate_last_four(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_last_four(Some(" 4242 ")).unwrap(),
            Some("4242".to_string())
        );
        assert!(validate_last_four(Some("424")).is_err());
        assert!(validate_last_four(Some("42a2")).is_err());
        assert!(validate_last_four(Some("4242424242424242")).is_err());
    }
}
