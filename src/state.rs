//! Shared application state handed to every handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::messaging::EventPublisher;
use crate::services::auth::AuthService;
use crate::services::{AccountService, CartService, OrderService};
use crate::store::memory::MemoryStore;
use crate::store::postgres::PgStore;
use crate::store::{AddressStore, CartStore, Catalog, ContactStore, OrderRepository, UserStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserStore>,
    addresses: Arc<dyn AddressStore>,
    contacts: Arc<dyn ContactStore>,
    auth: AuthService,
    events: EventPublisher,
}

impl AppState {
    pub fn postgres(pool: PgPool, auth: AuthService, events: EventPublisher) -> Self {
        Self::with_store(Arc::new(PgStore::new(pool)), auth, events)
    }

    /// State over a shared [`MemoryStore`], with event publishing disabled.
    pub fn in_memory(store: Arc<MemoryStore>, auth: AuthService) -> Self {
        Self::with_store(store, auth, EventPublisher::disabled())
    }

    fn with_store<S>(store: Arc<S>, auth: AuthService, events: EventPublisher) -> Self
    where
        S: Catalog + CartStore + OrderRepository + UserStore + AddressStore + ContactStore + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                catalog: store.clone(),
                carts: store.clone(),
                orders: store.clone(),
                users: store.clone(),
                addresses: store.clone(),
                contacts: store,
                auth,
                events,
            }),
        }
    }

    pub fn auth(&self) -> &AuthService { &self.inner.auth }
    pub fn catalog(&self) -> &dyn Catalog { self.inner.catalog.as_ref() }
    pub fn addresses(&self) -> &dyn AddressStore { self.inner.addresses.as_ref() }
    pub fn contacts(&self) -> &dyn ContactStore { self.inner.contacts.as_ref() }

    pub fn cart_service(&self) -> CartService<'_> {
        CartService::new(self.inner.carts.as_ref(), self.inner.catalog.as_ref())
    }

    pub fn order_service(&self) -> OrderService<'_> {
        let inner = &self.inner;
        OrderService::new(inner.catalog.as_ref(), inner.orders.as_ref(), inner.users.as_ref(), inner.carts.as_ref(), &inner.events)
    }

    pub fn account_service(&self) -> AccountService<'_> {
        AccountService::new(self.inner.users.as_ref(), &self.inner.auth)
    }
}
