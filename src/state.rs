use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::cache::AppCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{Category, CategoryKind, Profile, Tag};

/// Server-side session store holding valid session tokens.
pub type SessionStore = Arc<Mutex<HashSet<String>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub cache: Arc<AppCache>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            cache: Arc::new(AppCache::new()),
            sessions: SessionStore::default(),
        }
    }

    pub fn profile(&self) -> AppResult<Arc<Profile>> {
        self.cache.load_profile(&self.db)
    }

    pub fn cached_categories(&self, kind: CategoryKind) -> AppResult<Vec<Category>> {
        self.cache.load_categories(&self.db, kind)
    }

    pub fn cached_tags(&self) -> AppResult<Vec<Tag>> {
        self.cache.load_tags(&self.db)
    }
}
