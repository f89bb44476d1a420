//! Entity state management for expenses, incomes and transactions
//!
//! One generic [`EntityStore`] and [`EntityClient`] serve every entity type.
//! The client talks to the REST backend through a [`RestTransport`] and
//! reports each call to its store as lifecycle events.

pub mod client;
pub mod context;
pub mod error;
pub mod join;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod store;
pub mod time;
pub mod transport;

pub use client::{clean_entity, EntityClient, ListPage};
pub use context::AppContext;
pub use error::{ClientError, ClientResult, ErrorCode, ErrorDetails, ErrorSeverity, FieldError};
pub use join::resolve_reference;
pub use memory::InMemoryBackend;
pub use models::{Entity, EntityId, Expense, Income, Transaction};
pub use pagination::{ListQuery, PageLinks, PaginationState, SortOrder};
pub use store::{EntityState, EntityStore, LifecycleEvent, Operation, Outcome, Ticket};
pub use transport::{HyperTransport, Method, RestRequest, RestResponse, RestTransport, TransportRef};
