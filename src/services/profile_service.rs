use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::{orders::ShippingDetails, profile::UpdateProfileRequest},
    entity::{
        Profiles,
        profiles::{ActiveModel as ProfileActive, Model as ProfileModel},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Fetch the caller's profile, creating an empty one for accounts that predate profiles.
pub async fn load_or_create(state: &AppState, user_id: Uuid) -> AppResult<ProfileModel> {
    if let Some(profile) = Profiles::find_by_id(user_id).one(&state.orm).await? {
        return Ok(profile);
    }
    let profile = ProfileActive {
        id: Set(user_id),
        full_name: Set(None),
        phone: Set(None),
        address_line: Set(None),
        city: Set(None),
        state: Set(None),
        postal_code: Set(None),
        country: Set(None),
        is_admin: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(profile)
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = load_or_create(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", profile.into(), Some(Meta::empty())))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let existing = load_or_create(state, user.user_id).await?;
    let mut active: ProfileActive = existing.into();
    if let Some(v) = payload.full_name {
        active.full_name = Set(non_blank(v));
    }
    if let Some(v) = payload.phone {
        active.phone = Set(non_blank(v));
    }
    if let Some(v) = payload.address_line {
        active.address_line = Set(non_blank(v));
    }
    if let Some(v) = payload.city {
        active.city = Set(non_blank(v));
    }
    if let Some(v) = payload.state {
        active.state = Set(non_blank(v));
    }
    if let Some(v) = payload.postal_code {
        active.postal_code = Set(non_blank(v));
    }
    if let Some(v) = payload.country {
        active.country = Set(non_blank(v));
    }
    active.updated_at = Set(Utc::now().into());
    let profile = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "profile_update",
        "profiles",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        profile.into(),
        Some(Meta::empty()),
    ))
}

/// Copy checkout shipping details onto the profile inside the caller's transaction.
pub async fn save_shipping_defaults<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    shipping: &ShippingDetails,
) -> AppResult<()> {
    let existing = Profiles::find_by_id(user_id).one(conn).await?;
    let is_new = existing.is_none();
    let mut active: ProfileActive = match existing {
        Some(profile) => profile.into(),
        None => ProfileActive {
            id: Set(user_id),
            country: Set(None),
            is_admin: Set(false),
            created_at: NotSet,
            ..Default::default()
        },
    };
    active.full_name = Set(Some(shipping.full_name.clone()));
    active.phone = Set(Some(shipping.phone.clone()));
    active.address_line = Set(Some(shipping.address_line.clone()));
    active.city = Set(Some(shipping.city.clone()));
    active.state = Set(Some(shipping.state.clone()));
    active.postal_code = Set(Some(shipping.postal_code.clone()));
    active.updated_at = Set(Utc::now().into());
    if is_new {
        active.insert(conn).await?;
    } else {
        active.update(conn).await?;
    }
    Ok(())
}
