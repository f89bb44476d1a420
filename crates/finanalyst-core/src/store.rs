//! Entity store - per-entity state machine driven by request lifecycle events
//!
//! A store holds what the view layer renders for one entity type: the loaded
//! list, the selected record, in-flight flags, pagination metadata and the
//! last error. It changes only through [`EntityStore::dispatch`].
//!
//! Reads (`loading`) and writes (`updating`) are tracked by independent
//! flags. `update_success` is raised by a successful write and cleared by the
//! next operation start or a reset.
//!
//! Every operation carries a sequence number. A list completion older than
//! the newest issued list read is discarded, and likewise for single reads,
//! so out-of-order responses cannot overwrite newer ones. Write completions
//! are applied in completion order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ClientError;
use crate::models::Entity;
use crate::pagination::PageLinks;

/// Operation kinds the client reports to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List read; `page` is the 0-based page or `None` for "fetch all"
    ListRead { page: Option<u32> },
    SingleRead,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Operation {
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::ListRead { .. } | Operation::SingleRead)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListRead { .. } => "list",
            Operation::SingleRead => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::PartialUpdate => "partial-update",
            Operation::Delete => "delete",
        }
    }
}

/// Successful result of an operation, as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Listed {
        records: Vec<T>,
        total_items: u64,
        links: PageLinks,
    },
    Loaded(T),
    Saved(T),
    Deleted,
}

/// Lifecycle notification of one asynchronous operation
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent<T> {
    Started { op: Operation, seq: u64 },
    Succeeded { op: Operation, seq: u64, outcome: Outcome<T> },
    Failed { op: Operation, seq: u64, error: ClientError },
    Reset,
}

/// Handle for an operation that has been started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub op: Operation,
    pub seq: u64,
}

/// Observable state of one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState<T> {
    pub entities: Vec<T>,
    pub entity: T,
    pub loading: bool,
    pub updating: bool,
    pub update_success: bool,
    pub total_items: u64,
    pub links: PageLinks,
    pub error_message: Option<ClientError>,
}

impl<T: Default> Default for EntityState<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            entity: T::default(),
            loading: false,
            updating: false,
            update_success: false,
            total_items: 0,
            links: PageLinks::default(),
            error_message: None,
        }
    }
}

struct Inner<T> {
    state: EntityState<T>,
    latest_list_seq: u64,
    latest_get_seq: u64,
}

impl<T> Inner<T> {
    /// Newest started sequence of the same read kind as `op`
    fn latest_read(&mut self, op: Operation) -> Option<&mut u64> {
        match op {
            Operation::ListRead { .. } => Some(&mut self.latest_list_seq),
            Operation::SingleRead => Some(&mut self.latest_get_seq),
            _ => None,
        }
    }
}

/// Process-wide store for one entity type
pub struct EntityStore<T> {
    inner: RwLock<Inner<T>>,
    next_seq: AtomicU64,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: EntityState::default(),
                latest_list_seq: 0,
                latest_get_seq: 0,
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Allocate a sequence number and apply the `Started` transition
    pub fn begin(&self, op: Operation) -> Ticket {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(LifecycleEvent::Started { op, seq });
        Ticket { op, seq }
    }

    pub fn succeed(&self, ticket: Ticket, outcome: Outcome<T>) -> bool {
        self.dispatch(LifecycleEvent::Succeeded {
            op: ticket.op,
            seq: ticket.seq,
            outcome,
        })
    }

    pub fn fail(&self, ticket: Ticket, error: ClientError) -> bool {
        self.dispatch(LifecycleEvent::Failed {
            op: ticket.op,
            seq: ticket.seq,
            error,
        })
    }

    /// Return the state to its initial value
    pub fn reset(&self) {
        self.dispatch(LifecycleEvent::Reset);
    }

    /// Apply one event; returns `false` when a stale read completion was dropped
    pub fn dispatch(&self, event: LifecycleEvent<T>) -> bool {
        let mut inner = self.write();

        match event {
            LifecycleEvent::Started { op, seq } => {
                let state = &mut inner.state;
                state.error_message = None;
                state.update_success = false;
                if op.is_read() {
                    state.loading = true;
                } else {
                    state.updating = true;
                }
                if let Some(latest) = inner.latest_read(op) {
                    *latest = (*latest).max(seq);
                }
                true
            }
            LifecycleEvent::Succeeded { op, seq, outcome } => {
                if Self::is_stale(&mut inner, op, seq) {
                    log::debug!(
                        target: "finanalyst::store",
                        "{}: dropping stale {} completion #{}",
                        T::NAME,
                        op.name(),
                        seq
                    );
                    return false;
                }
                Self::apply_success(&mut inner.state, op, outcome);
                true
            }
            LifecycleEvent::Failed { op, seq, error } => {
                if Self::is_stale(&mut inner, op, seq) {
                    log::debug!(
                        target: "finanalyst::store",
                        "{}: dropping stale {} failure #{}",
                        T::NAME,
                        op.name(),
                        seq
                    );
                    return false;
                }
                let state = &mut inner.state;
                if op.is_read() {
                    state.loading = false;
                } else {
                    state.updating = false;
                }
                state.update_success = false;
                state.error_message = Some(error);
                true
            }
            LifecycleEvent::Reset => {
                inner.state = EntityState::default();
                true
            }
        }
    }

    fn is_stale(inner: &mut Inner<T>, op: Operation, seq: u64) -> bool {
        inner.latest_read(op).map_or(false, |latest| seq < *latest)
    }

    fn apply_success(state: &mut EntityState<T>, op: Operation, outcome: Outcome<T>) {
        match outcome {
            Outcome::Listed {
                records,
                total_items,
                links,
            } => {
                state.loading = false;
                match op {
                    Operation::ListRead { page: Some(page) } if page > 0 => {
                        let known: HashSet<_> =
                            state.entities.iter().filter_map(|e| e.id()).collect();
                        state.entities.extend(
                            records
                                .into_iter()
                                .filter(|r| r.id().map_or(true, |id| !known.contains(&id))),
                        );
                    }
                    _ => state.entities = records,
                }
                state.total_items = total_items;
                state.links = links;
            }
            Outcome::Loaded(record) => {
                state.loading = false;
                state.entity = record;
            }
            Outcome::Saved(record) => {
                state.updating = false;
                state.update_success = true;
                state.entity = record;
            }
            Outcome::Deleted => {
                state.updating = false;
                state.update_success = true;
                state.entity = T::default();
            }
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> EntityState<T> {
        self.read().state.clone()
    }

    pub fn update_success(&self) -> bool {
        self.read().state.update_success
    }

    pub fn error_message(&self) -> Option<ClientError> {
        self.read().state.error_message.clone()
    }

    /// Loaded list records
    pub fn entities(&self) -> Vec<T> {
        self.read().state.entities.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ==================== Tests ====================
