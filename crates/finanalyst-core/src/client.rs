//! Generic entity client
//!
//! Each operation reports `Started` to the entity store before any I/O and
//! exactly one of `Succeeded`/`Failed` when it completes. The returned
//! result mirrors what the store received.

use serde_json::Value;
use std::sync::Arc;

use finanalyst_utils::cache_buster;

use crate::error::{log_failure, ClientError, ClientResult};
use crate::models::{Entity, EntityId};
use crate::pagination::{list_path, parse_link_header, parse_total_count, ListQuery, PageLinks};
use crate::store::{EntityState, EntityStore, Operation, Outcome, Ticket};
use crate::transport::{Method, RestRequest, RestResponse, TransportRef, MERGE_PATCH_JSON};

/// One list response
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub records: Vec<T>,
    pub total_items: u64,
    pub links: PageLinks,
}

/// REST client for one entity type, bound to that type's store
pub struct EntityClient<T: Entity> {
    transport: TransportRef,
    store: Arc<EntityStore<T>>,
}

impl<T: Entity> Clone for EntityClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Entity> EntityClient<T> {
    pub fn new(transport: TransportRef) -> Self {
        Self::with_store(transport, Arc::new(EntityStore::new()))
    }

    pub fn with_store(transport: TransportRef, store: Arc<EntityStore<T>>) -> Self {
        Self { transport, store }
    }

    /// Client on the same transport with a fresh store of its own
    pub fn detached(&self) -> Self {
        Self::new(Arc::clone(&self.transport))
    }

    pub fn store(&self) -> &Arc<EntityStore<T>> {
        &self.store
    }

    pub fn state(&self) -> EntityState<T> {
        self.store.snapshot()
    }

    pub fn reset(&self) {
        self.store.reset();
    }

    // ==================== Operations ====================

    /// Fetch a page of records, or every record when `query` is `None`
    pub async fn list(&self, query: Option<ListQuery>) -> ClientResult<ListPage<T>> {
        let ticket = self.store.begin(Operation::ListRead {
            page: query.as_ref().map(|q| q.page),
        });
        let path = list_path(&T::api_path(), query.as_ref(), cache_buster());

        let result = match self.exchange(RestRequest::get(path)).await {
            Ok(response) => decode_list(&response),
            Err(e) => Err(e),
        };

        self.finish(ticket, &T::api_path(), result, |page: &ListPage<T>| {
            Outcome::Listed {
                records: page.records.clone(),
                total_items: page.total_items,
                links: page.links,
            }
        })
    }

    pub async fn get(&self, id: EntityId) -> ClientResult<T> {
        let ticket = self.store.begin(Operation::SingleRead);
        let path = T::api_item_path(id);
        let result = self.fetch_record(RestRequest::get(path.clone())).await;
        self.finish(ticket, &path, result, |record: &T| Outcome::Loaded(record.clone()))
    }

    /// Persist a new record; it must not carry an id
    pub async fn create(&self, entity: &T) -> ClientResult<T> {
        let ticket = self.store.begin(Operation::Create);
        let path = T::api_path();

        let result = if entity.id().is_some() {
            Err(ClientError::local_validation(
                format!("A new {} cannot already have an ID", T::NAME),
                "error.idexists",
            ))
        } else {
            match clean_body(entity) {
                Ok(body) => {
                    self.fetch_record(RestRequest::with_json(Method::Post, path.clone(), body))
                        .await
                }
                Err(e) => Err(e),
            }
        };

        self.finish(ticket, &path, result, |record: &T| Outcome::Saved(record.clone()))
    }

    /// Replace the server copy of an existing record
    pub async fn update(&self, entity: &T) -> ClientResult<T> {
        self.write_existing(Operation::Update, entity).await
    }

    /// Merge the non-null fields of `entity` into the server copy
    pub async fn partial_update(&self, entity: &T) -> ClientResult<T> {
        self.write_existing(Operation::PartialUpdate, entity).await
    }

    pub async fn delete(&self, id: EntityId) -> ClientResult<()> {
        let ticket = self.store.begin(Operation::Delete);
        let path = T::api_item_path(id);
        let result = self
            .exchange(RestRequest::delete(path.clone()))
            .await
            .map(|_| ());
        self.finish(ticket, &path, result, |_: &()| Outcome::Deleted)
    }

    /// `create` followed by a full `list` once the create has succeeded
    ///
    /// The refresh outcome lands in the store; the saved record is returned
    /// even if the refresh fails.
    pub async fn create_and_refresh(&self, entity: &T) -> ClientResult<T> {
        let saved = self.create(entity).await?;
        let _ = self.list(None).await;
        Ok(saved)
    }

    /// `delete` followed by a full `list` once the delete has succeeded
    pub async fn delete_and_refresh(&self, id: EntityId) -> ClientResult<()> {
        self.delete(id).await?;
        let _ = self.list(None).await;
        Ok(())
    }

    // ==================== Internals ====================

    async fn write_existing(&self, op: Operation, entity: &T) -> ClientResult<T> {
        let ticket = self.store.begin(op);

        let Some(id) = entity.id() else {
            let path = T::api_path();
            let error = ClientError::local_validation("Invalid id", "error.idnull");
            return self.finish(ticket, &path, Err(error), |record: &T| {
                Outcome::Saved(record.clone())
            });
        };

        let path = T::api_item_path(id);
        let result = match clean_body(entity) {
            Ok(body) => {
                let request = if op == Operation::PartialUpdate {
                    RestRequest::with_json(Method::Patch, path.clone(), body)
                        .content_type(MERGE_PATCH_JSON)
                } else {
                    RestRequest::with_json(Method::Put, path.clone(), body)
                };
                self.fetch_record(request).await
            }
            Err(e) => Err(e),
        };

        self.finish(ticket, &path, result, |record: &T| Outcome::Saved(record.clone()))
    }

    async fn fetch_record(&self, request: RestRequest) -> ClientResult<T> {
        let response = self.exchange(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Send a request and turn non-2xx statuses into errors
    async fn exchange(&self, request: RestRequest) -> ClientResult<RestResponse> {
        log::debug!(target: "finanalyst::client", "{} {}", request.method, request.path);
        let resource = request.resource().to_string();
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_response(
                response.status,
                &resource,
                &response.body,
            ))
        }
    }

    fn finish<R>(
        &self,
        ticket: Ticket,
        resource: &str,
        result: ClientResult<R>,
        outcome: impl FnOnce(&R) -> Outcome<T>,
    ) -> ClientResult<R> {
        match result {
            Ok(value) => {
                self.store.succeed(ticket, outcome(&value));
                Ok(value)
            }
            Err(error) => {
                log_failure(ticket.op.name(), resource, &error);
                self.store.fail(ticket, error.clone());
                Err(error)
            }
        }
    }
}

fn decode_list<T: Entity>(response: &RestResponse) -> ClientResult<ListPage<T>> {
    let records: Vec<T> = serde_json::from_slice(&response.body)?;
    let total_items = parse_total_count(response.header("x-total-count"))
        .unwrap_or(records.len() as u64);
    let links = response
        .header("link")
        .map(parse_link_header)
        .unwrap_or_default();
    Ok(ListPage {
        records,
        total_items,
        links,
    })
}

/// Serialize a record for transmission, dropping unselected references
///
/// A nested object whose `id` is missing, `null`, `""` or `-1` is the
/// form's "no selection" marker and is removed from the payload.
pub fn clean_entity<T: Entity>(entity: &T) -> ClientResult<Value> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(fields) = &mut value {
        fields.retain(|_, field| match field {
            Value::Object(nested) => !is_empty_marker(nested.get("id")),
            _ => true,
        });
    }
    Ok(value)
}

fn is_empty_marker(id: Option<&Value>) -> bool {
    match id {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_i64() == Some(-1),
        Some(_) => false,
    }
}

fn clean_body<T: Entity>(entity: &T) -> ClientResult<Vec<u8>> {
    Ok(serde_json::to_vec(&clean_entity(entity)?)?)
}
