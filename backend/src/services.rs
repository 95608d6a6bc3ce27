//! Wiring of the domain services over shared ports.

use std::sync::Arc;

use mockable::Clock;

use crate::config::HelpdeskSettings;
use crate::domain::ports::{CacheStore, Store};
use crate::domain::{
    AdminService, AnalyticsService, DoctorService, ResultCache, TicketSequenceLocks,
    TicketService, UnitOfWorkFactory,
};
use crate::outbound::cache::InMemoryCacheStore;
use crate::outbound::persistence::MemoryStore;

/// Every service, sharing one store, one result cache and one set of
/// ticket sequence locks.
#[derive(Clone)]
pub struct HelpdeskServices {
    /// Ticket workflows.
    pub tickets: TicketService,
    /// Administration.
    pub admin: AdminService,
    /// Doctor dashboard.
    pub doctors: DoctorService,
    /// System-wide analytics.
    pub analytics: AnalyticsService,
}

impl HelpdeskServices {
    /// Build the services over `store` and `cache`, applying `settings`.
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        settings: &HelpdeskSettings,
    ) -> Self {
        let sessions = UnitOfWorkFactory::new(store, settings.commit_policy());
        let cache = ResultCache::new(cache, settings.cache_ttls());
        Self {
            tickets: TicketService::new(
                sessions.clone(),
                cache.clone(),
                Arc::clone(&clock),
                Arc::new(TicketSequenceLocks::new()),
            ),
            admin: AdminService::new(sessions.clone(), cache.clone()),
            doctors: DoctorService::new(sessions.clone(), cache.clone()),
            analytics: AnalyticsService::new(sessions, cache, clock),
        }
    }

    /// Services over a fresh [`MemoryStore`] and [`InMemoryCacheStore`].
    ///
    /// Returns the store too so callers can seed it.
    pub fn in_memory(clock: Arc<dyn Clock>, settings: &HelpdeskSettings) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(InMemoryCacheStore::new(Arc::clone(&clock)));
        (Self::new(store.clone(), cache, clock, settings), store)
    }
}
