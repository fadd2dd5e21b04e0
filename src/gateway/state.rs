use std::sync::Arc;

use crate::account::{AccountRepository, FieldLimits};
use crate::payment::PaymentRepository;
use crate::store::LedgerStore;
use crate::transfer::TransferCoordinator;

/// Gateway application state (shared by all handlers)
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountRepository,
    pub payments: PaymentRepository,
    pub transfers: TransferCoordinator,
    /// Backing store, for health checks
    pub store: Arc<dyn LedgerStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, limits: FieldLimits) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone(), limits),
            payments: PaymentRepository::new(store.clone()),
            transfers: TransferCoordinator::new(store.clone(), limits),
            store,
        }
    }
}
