#![allow(dead_code)]

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;
use wellness_store_api::{
    db::{create_orm_conn, run_migrations},
    entity::{products::ActiveModel as ProductActive, profiles, users::ActiveModel as UserActive},
    middleware::auth::AuthUser,
    state::{AppState, AuthSettings},
    storage::Storage,
};

/// Connect to the test database, or `None` so the caller can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let upload_dir = std::env::temp_dir().join("wellness-store-tests");
    Ok(Some(AppState::new(
        orm,
        Storage::new(upload_dir, "http://localhost:3000/api/files"),
        AuthSettings {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        },
    )))
}

/// Tests share one database, so every row they create carries a unique tag.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn create_user(state: &AppState, is_admin: bool) -> anyhow::Result<AuthUser> {
    let email = format!("{}@example.com", unique("user"));
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set("dummy".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    profiles::ActiveModel {
        id: Set(user.id),
        full_name: Set(Some("Test User".into())),
        phone: Set(None),
        address_line: Set(None),
        city: Set(None),
        state: Set(None),
        postal_code: Set(None),
        country: Set(None),
        is_admin: Set(is_admin),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email,
    })
}

pub async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(None),
        name: Set(unique("Neem Soap")),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        image_url: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}
