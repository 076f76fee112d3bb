// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::digiflazz::DigiflazzClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub digiflazz: Option<DigiflazzClient>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        let digiflazz = config.digiflazz.clone().map(DigiflazzClient::new);
        Self {
            db_pool,
            config: Arc::new(config),
            digiflazz,
        }
    }
}
