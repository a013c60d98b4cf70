use std::sync::Arc;

use crate::{assets::AssetStore, db::OrmConn, services::auth_service::AccessGate};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub assets: Arc<AssetStore>,
    pub gate: Arc<AccessGate>,
}
