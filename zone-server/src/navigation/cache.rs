//! Navigation response cache
//!
//! Entries live until a write invalidates their scope; there is no TTL.
//! Invalidation bumps an epoch before removing entries, and a resolve only
//! stores its result if the epoch is unchanged, checked under the shard lock.
//! A resolve racing an invalidation therefore never re-populates stale data.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::models::{LevelType, NavigationView, ZoneType};

use super::{LevelContext, NavigationResolver};
use crate::error::ServiceResult;

/// Cache key of one resolved level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavKey {
    pub project_id: i64,
    pub level: LevelType,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
}

impl NavKey {
    pub fn new(project_id: i64, context: &LevelContext) -> Self {
        Self {
            project_id,
            level: context.level(),
            building_id: context.building_id(),
            floor_number: context.floor_number(),
        }
    }
}

fn or_null<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

impl fmt::Display for NavKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "apartment_nav:{}:{}:{}:{}",
            self.project_id,
            self.level,
            or_null(self.building_id),
            or_null(self.floor_number)
        )
    }
}

/// Set of cache entries affected by a write
///
/// `None` for building or floor matches every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavScope {
    pub project_id: i64,
    pub level: LevelType,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
}

impl NavScope {
    pub fn overview(project_id: i64) -> Self {
        Self {
            project_id,
            level: LevelType::Overview,
            building_id: None,
            floor_number: None,
        }
    }

    pub fn building(project_id: i64, building_id: Option<i64>) -> Self {
        Self {
            project_id,
            level: LevelType::Building,
            building_id,
            floor_number: None,
        }
    }

    pub fn floor(project_id: i64, building_id: i64, floor_number: Option<i32>) -> Self {
        Self {
            project_id,
            level: LevelType::Floor,
            building_id: Some(building_id),
            floor_number,
        }
    }

    /// Scope touched by a zone of the given type and placement
    pub fn for_zone(
        project_id: i64,
        zone_type: ZoneType,
        building_id: Option<i64>,
        floor_number: Option<i32>,
    ) -> Self {
        Self {
            project_id,
            level: zone_type.level(),
            building_id: if zone_type.requires_building() { building_id } else { None },
            floor_number: if zone_type == ZoneType::ApartmentUnit { floor_number } else { None },
        }
    }

    /// Scope of an image slot
    pub fn for_context(project_id: i64, context: &LevelContext) -> Self {
        Self {
            project_id,
            level: context.level(),
            building_id: context.building_id(),
            floor_number: context.floor_number(),
        }
    }

    pub fn matches(&self, key: &NavKey) -> bool {
        key.project_id == self.project_id
            && key.level == self.level
            && self.building_id.is_none_or(|b| key.building_id == Some(b))
            && self.floor_number.is_none_or(|f| key.floor_number == Some(f))
    }
}

struct Inner {
    resolver: NavigationResolver,
    entries: DashMap<NavKey, Arc<NavigationView>>,
    epoch: AtomicU64,
}

/// Memoizing wrapper around [`NavigationResolver`]
#[derive(Clone)]
pub struct NavigationCache {
    inner: Arc<Inner>,
}

impl NavigationCache {
    pub fn new(resolver: NavigationResolver) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                entries: DashMap::new(),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn resolver(&self) -> &NavigationResolver {
        &self.inner.resolver
    }

    pub async fn resolve(
        &self,
        project_id: i64,
        context: LevelContext,
    ) -> ServiceResult<Arc<NavigationView>> {
        let key = NavKey::new(project_id, &context);
        if let Some(hit) = self.inner.entries.get(&key) {
            tracing::debug!(key = %key, "Navigation cache hit");
            return Ok(hit.value().clone());
        }

        let epoch = self.epoch();
        let view = Arc::new(self.inner.resolver.resolve(project_id, context).await?);
        Ok(self.store_if_current(key, epoch, view))
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Store a view resolved at `epoch` unless an invalidation ran since
    ///
    /// Returns the entry a concurrent resolve already stored, if any.
    fn store_if_current(
        &self,
        key: NavKey,
        epoch: u64,
        view: Arc<NavigationView>,
    ) -> Arc<NavigationView> {
        match self.inner.entries.entry(key) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                if self.epoch() == epoch {
                    slot.insert(view.clone());
                    tracing::debug!(key = %key, "Navigation cache filled");
                } else {
                    tracing::debug!(key = %key, "Stale navigation view not cached");
                }
                view
            }
        }
    }

    /// Remove every entry in `scope`; returns how many were removed
    pub fn invalidate(&self, scope: &NavScope) -> usize {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        let before = self.inner.entries.len();
        self.inner.entries.retain(|key, _| !scope.matches(key));
        let removed = before.saturating_sub(self.inner.entries.len());
        tracing::debug!(
            project_id = scope.project_id,
            level = %scope.level,
            building_id = ?scope.building_id,
            floor_number = ?scope.floor_number,
            removed,
            "Navigation cache invalidated"
        );
        removed
    }

    /// Remove every entry of a project
    pub fn invalidate_project(&self, project_id: i64) -> usize {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        let before = self.inner.entries.len();
        self.inner.entries.retain(|key, _| key.project_id != project_id);
        before.saturating_sub(self.inner.entries.len())
    }

    /// Drop everything (operational flush)
    pub fn clear(&self) -> usize {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        let count = self.inner.entries.len();
        self.inner.entries.clear();
        count
    }

    pub fn contains(&self, project_id: i64, context: &LevelContext) -> bool {
        self.inner
            .entries
            .contains_key(&NavKey::new(project_id, context))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}
