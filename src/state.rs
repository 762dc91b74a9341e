use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, storage::Storage};

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub storage: Storage,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, storage: Storage, auth: AuthSettings) -> Self {
        Self { orm, storage, auth }
    }

    pub fn from_config(orm: DatabaseConnection, config: &AppConfig) -> Self {
        Self::new(
            orm,
            Storage::new(&config.upload_dir, &config.public_base_url),
            AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                token_ttl_hours: config.jwt_ttl_hours,
            },
        )
    }
}
