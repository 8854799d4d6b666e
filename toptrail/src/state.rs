//! Shared aggregator state handed to every request handler.

use crate::db::Db;
use crate::ranking::RankingStore;
use crate::registry::ServerRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: ServerRegistry,
    pub ranking: RankingStore,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        Self {
            registry: ServerRegistry::new(db.clone()),
            ranking: RankingStore::new(db),
        }
    }
}
