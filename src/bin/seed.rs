use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;
use wellness_store_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Categories, Coupons, Products, Profiles, Users, categories, coupons, products, profiles,
        users,
    },
    services::auth_service::hash_password,
    slug::slugify,
};

const CATEGORIES: &[(&str, &str)] = &[
    ("Herbal Oils", "Cold-pressed oils for massage and hair care"),
    ("Churnas", "Traditional powdered herbal blends"),
    ("Teas", "Loose leaf and herbal infusions"),
];

// (category, name, description, price in paise, stock)
const PRODUCTS: &[(&str, &str, &str, i64, i32)] = &[
    ("Herbal Oils", "Bhringraj Hair Oil", "Nourishing oil for scalp and hair", 59900, 40),
    ("Herbal Oils", "Mahanarayan Oil", "Warming massage oil for joints", 44900, 25),
    ("Churnas", "Triphala Churna", "Gentle daily digestive support", 29900, 60),
    ("Churnas", "Ashwagandha Powder", "Adaptogen for stress and sleep", 39900, 3),
    ("Teas", "Tulsi Green Tea", "Holy basil with green tea leaves", 24900, 80),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin12345", "Store Admin", true).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user12345", "Asha Customer", false).await?;
    seed_catalog(&orm).await?;
    seed_coupon(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    full_name: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    let user_id = match Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        Some(user) => user.id,
        None => {
            let password_hash = hash_password(password)?;
            users::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.to_string()),
                password_hash: Set(password_hash),
                created_at: NotSet,
            }
            .insert(orm)
            .await?
            .id
        }
    };

    match Profiles::find_by_id(user_id).one(orm).await? {
        Some(profile) => {
            let mut active: profiles::ActiveModel = profile.into();
            active.is_admin = Set(is_admin);
            active.update(orm).await?;
        }
        None => {
            profiles::ActiveModel {
                id: Set(user_id),
                full_name: Set(Some(full_name.to_string())),
                phone: Set(None),
                address_line: Set(None),
                city: Set(None),
                state: Set(None),
                postal_code: Set(None),
                country: Set(Some("India".to_string())),
                is_admin: Set(is_admin),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(orm)
            .await?;
        }
    }

    println!("Ensured user {email} (admin={is_admin})");
    Ok(user_id)
}

async fn seed_catalog(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, description) in CATEGORIES {
        let slug = slugify(name);
        let exists = Categories::find()
            .filter(categories::Column::Slug.eq(slug.as_str()))
            .one(orm)
            .await?
            .is_some();
        if !exists {
            categories::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                slug: Set(slug),
                description: Set(Some(description.to_string())),
                image_url: Set(None),
                created_at: NotSet,
            }
            .insert(orm)
            .await?;
        }
    }

    for (category, name, description, price, stock) in PRODUCTS {
        let exists = Products::find()
            .filter(products::Column::Name.eq(*name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let category_id = Categories::find()
            .filter(categories::Column::Slug.eq(slugify(category)))
            .one(orm)
            .await?
            .map(|c| c.id);
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(category_id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(*price),
            stock: Set(*stock),
            image_url: Set(None),
            is_active: Set(true),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded categories and products");
    Ok(())
}

async fn seed_coupon(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let exists = Coupons::find()
        .filter(coupons::Column::Code.eq("WELCOME10"))
        .one(orm)
        .await?
        .is_some();
    if !exists {
        coupons::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set("WELCOME10".to_string()),
            discount_percentage: Set(10),
            expires_at: Set(Some((Utc::now() + Duration::days(90)).into())),
            is_active: Set(true),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded coupon WELCOME10");
    Ok(())
}
