use std::sync::Arc;

use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::auth::{repo::seaorm::SeaOrmAuthRepository, AuthService, TokenIssuer};
use service::bus::{repository::SeaOrmBusRepository, BusService};
use service::uploads::UploadStore;

pub type AdminAuth = AuthService<SeaOrmAuthRepository>;
pub type BusCatalog = BusService<SeaOrmBusRepository>;

/// Everything a handler needs, built once per process (or per test).
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AdminAuth>,
    pub buses: Arc<BusCatalog>,
    pub uploads: Arc<UploadStore>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        let uploads = Arc::new(UploadStore::from_config(&cfg.uploads));
        let tokens = TokenIssuer::new(&cfg.auth.jwt_secret, cfg.auth.token_ttl_hours);
        let auth = AuthService::new(Arc::new(SeaOrmAuthRepository { db: db.clone() }), tokens);
        let buses = BusService::new(Arc::new(SeaOrmBusRepository { db }), Arc::clone(&uploads))
            .require_image_on_create(cfg.uploads.require_image_on_create);
        Self { auth: Arc::new(auth), buses: Arc::new(buses), uploads }
    }
}
