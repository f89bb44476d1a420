//! Application-wide wiring of one client and store per entity type

use std::sync::Arc;

use crate::client::EntityClient;
use crate::models::{Expense, Income, Transaction};
use crate::transport::TransportRef;

/// Owns the entity clients, and through them the stores, for the process
///
/// Every client shares the same transport. Stores are independent.
#[derive(Clone)]
pub struct AppContext {
    pub expenses: EntityClient<Expense>,
    pub incomes: EntityClient<Income>,
    pub transactions: EntityClient<Transaction>,
}

impl AppContext {
    pub fn new(transport: TransportRef) -> Self {
        Self {
            expenses: EntityClient::new(Arc::clone(&transport)),
            incomes: EntityClient::new(Arc::clone(&transport)),
            transactions: EntityClient::new(transport),
        }
    }
}
