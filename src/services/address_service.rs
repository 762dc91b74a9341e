use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{AddressList, AddressRequest},
    entity::{
        Addresses,
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Model as AddressModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

fn validate(payload: &AddressRequest) -> AppResult<()> {
    let required = [
        ("label", &payload.label),
        ("full_name", &payload.full_name),
        ("phone", &payload.phone),
        ("address_line", &payload.address_line),
        ("city", &payload.city),
        ("state", &payload.state),
        ("postal_code", &payload.postal_code),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{name} is required")));
        }
    }
    Ok(())
}

async fn owned(txn: &DatabaseTransaction, user_id: Uuid, id: Uuid) -> AppResult<AddressModel> {
    Addresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn unset_defaults(txn: &DatabaseTransaction, user_id: Uuid, keep: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(
            Condition::all()
                .add(AddressCol::UserId.eq(user_id))
                .add(AddressCol::Id.ne(keep)),
        )
        .exec(txn)
        .await?;
    Ok(())
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success(
        "Addresses",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

/// The first address a user saves becomes the default.
pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;

    let existing = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .count(&txn)
        .await?;
    let is_default = payload.is_default || existing == 0;

    let id = Uuid::new_v4();
    if is_default {
        unset_defaults(&txn, user.user_id, id).await?;
    }
    let address = AddressActive {
        id: Set(id),
        user_id: Set(user.user_id),
        label: Set(payload.label.trim().to_string()),
        full_name: Set(payload.full_name.trim().to_string()),
        phone: Set(payload.phone.trim().to_string()),
        address_line: Set(payload.address_line.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        postal_code: Set(payload.postal_code.trim().to_string()),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address saved",
        address.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = owned(&txn, user.user_id, id).await?;
    let is_default = existing.is_default || payload.is_default;
    if payload.is_default {
        unset_defaults(&txn, user.user_id, id).await?;
    }

    let mut active: AddressActive = existing.into();
    active.label = Set(payload.label.trim().to_string());
    active.full_name = Set(payload.full_name.trim().to_string());
    active.phone = Set(payload.phone.trim().to_string());
    active.address_line = Set(payload.address_line.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.postal_code = Set(payload.postal_code.trim().to_string());
    active.is_default = Set(is_default);
    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Updated",
        address.into(),
        Some(Meta::empty()),
    ))
}

/// Make one address the default and clear the flag on every other.
pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = owned(&txn, user.user_id, id).await?;
    unset_defaults(&txn, user.user_id, id).await?;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    let address = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "address_default",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Default address updated",
        address.into(),
        Some(Meta::empty()),
    ))
}

/// Deleting the default promotes the most recent remaining address.
pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    auth_service::lock_user(&txn, user.user_id).await?;
    let existing = owned(&txn, user.user_id, id).await?;
    Addresses::delete_by_id(existing.id).exec(&txn).await?;

    if existing.is_default {
        let next = Addresses::find()
            .filter(AddressCol::UserId.eq(user.user_id))
            .order_by_desc(AddressCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut active: AddressActive = next.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_line_of_the_address_is_required() {
        let mut payload = AddressRequest {
            label: "Home".into(),
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address_line: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            postal_code: "411001".into(),
            is_default: false,
        };
        assert!(validate(&payload).is_ok());
        payload.postal_code = " ".into();
        match validate(&payload) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "postal_code is required"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
