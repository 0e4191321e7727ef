use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::db::queries::{categories, profile, tags};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{Category, CategoryKind, Profile, Tag};
use crate::state::AppState;

struct Slot<T> {
    inner: RwLock<Option<(u64, T)>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    fn get(&self, gen: u64) -> Option<T> {
        let guard = self.inner.read().ok()?;
        match guard.as_ref() {
            Some((stored_gen, val)) if *stored_gen == gen => Some(val.clone()),
            _ => None,
        }
    }

    fn set(&self, gen: u64, val: T) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some((gen, val));
        }
    }
}

/// Read-mostly lookups shared by every request.
///
/// Entries are tagged with the generation they were loaded at; bumping the
/// generation makes all of them stale at once.
pub struct AppCache {
    generation: AtomicU64,
    profile: Slot<Arc<Profile>>,
    expense_categories: Slot<Vec<Category>>,
    income_categories: Slot<Vec<Category>>,
    tags: Slot<Vec<Tag>>,
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AppCache {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            profile: Slot::new(),
            expense_categories: Slot::new(),
            income_categories: Slot::new(),
            tags: Slot::new(),
        }
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn gen(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Immutable snapshot of the user profile.
    pub fn load_profile(&self, pool: &DbPool) -> AppResult<Arc<Profile>> {
        let gen = self.gen();
        if let Some(cached) = self.profile.get(gen) {
            return Ok(cached);
        }
        let conn = pool.get()?;
        let val = Arc::new(profile::get_profile(&conn)?);
        self.profile.set(gen, Arc::clone(&val));
        Ok(val)
    }

    /// The only way to change the profile: persist it, then publish a new snapshot.
    pub fn store_profile(&self, pool: &DbPool, new_profile: Profile) -> AppResult<Arc<Profile>> {
        let conn = pool.get()?;
        profile::save_profile(&conn, &new_profile)?;
        self.invalidate();
        let snapshot = Arc::new(new_profile);
        self.profile.set(self.gen(), Arc::clone(&snapshot));
        tracing::debug!(username = %snapshot.username, "Profile snapshot replaced");
        Ok(snapshot)
    }

    pub fn load_categories(&self, pool: &DbPool, kind: CategoryKind) -> AppResult<Vec<Category>> {
        let slot = match kind {
            CategoryKind::Expense => &self.expense_categories,
            CategoryKind::Income => &self.income_categories,
        };
        let gen = self.gen();
        if let Some(cached) = slot.get(gen) {
            return Ok(cached);
        }
        let conn = pool.get()?;
        let val = categories::list_categories(&conn, kind)?;
        slot.set(gen, val.clone());
        Ok(val)
    }

    pub fn load_tags(&self, pool: &DbPool) -> AppResult<Vec<Tag>> {
        let gen = self.gen();
        if let Some(cached) = self.tags.get(gen) {
            return Ok(cached);
        }
        let conn = pool.get()?;
        let val = tags::list_tags(&conn)?;
        self.tags.set(gen, val.clone());
        Ok(val)
    }
}

pub async fn cache_invalidation_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mutating = matches!(
        *req.method(),
        axum::http::Method::POST
            | axum::http::Method::PUT
            | axum::http::Method::DELETE
            | axum::http::Method::PATCH
    );
    let resp = next.run(req).await;
    if mutating && resp.status().is_success() {
        state.cache.invalidate();
    }
    resp
}
