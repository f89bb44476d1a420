//! In-process REST backend
//!
//! Serves `/api/<collection>` with the same status codes, headers and problem
//! bodies as the real backend, keeping records as JSON in memory. Used by the
//! `--in-memory` demo mode and by tests.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::ClientResult;
use crate::models::{Entity, EntityId};
use crate::pagination::{build_link_header, parse_query};
use crate::transport::{Method, RestRequest, RestResponse, RestTransport};

struct Collection {
    entity_name: &'static str,
    required: &'static [&'static str],
    records: BTreeMap<EntityId, Map<String, Value>>,
    next_id: EntityId,
}

impl Collection {
    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// REST backend holding every registered collection in memory
#[derive(Default)]
pub struct InMemoryBackend {
    collections: Mutex<HashMap<&'static str, Collection>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the collection of `T`
    pub fn with_collection<T: Entity>(self) -> Self {
        self.register::<T>();
        self
    }

    pub fn register<T: Entity>(&self) {
        self.lock().entry(T::COLLECTION).or_insert_with(|| Collection {
            entity_name: T::NAME,
            required: T::REQUIRED_FIELDS,
            records: BTreeMap::new(),
            next_id: 1,
        });
    }

    /// Insert records directly, keeping their ids when present
    pub fn seed<T: Entity>(&self, records: Vec<T>) -> ClientResult<Vec<EntityId>> {
        self.register::<T>();
        let mut collections = self.lock();
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let mut fields = match serde_json::to_value(&record)? {
                Value::Object(fields) => fields,
                _ => continue,
            };
            if let Some(collection) = collections.get_mut(T::COLLECTION) {
                let id = match record.id() {
                    Some(id) => {
                        collection.next_id = collection.next_id.max(id + 1);
                        id
                    }
                    None => collection.allocate_id(),
                };
                fields.insert("id".to_string(), json!(id));
                collection.records.insert(id, fields);
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// Number of stored records in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, Collection>> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serve one request
    pub fn handle(&self, request: &RestRequest) -> RestResponse {
        let (path, query) = match request.path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (request.path.as_str(), ""),
        };
        let segments: Vec<&str> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let (collection_name, id) = match segments.as_slice() {
            ["api", collection] => (*collection, None),
            ["api", collection, id] => match id.parse::<EntityId>() {
                Ok(id) => (*collection, Some(id)),
                Err(_) => return problem(400, "Bad Request", "error.http.400"),
            },
            _ => return RestResponse::new(404),
        };

        let mut collections = self.lock();
        if !collections.contains_key(collection_name) {
            return RestResponse::new(404);
        }

        let response = match (request.method, id) {
            (Method::Get, None) => {
                collections
                    .get(collection_name)
                    .map(|c| list(c, path, query))
            }
            (Method::Get, Some(id)) => collections.get(collection_name).map(|c| {
                match c.records.get(&id) {
                    Some(record) => json_response(200, &hydrate(record, &collections)),
                    None => RestResponse::new(404),
                }
            }),
            (Method::Post, None) => Some(create(&mut collections, collection_name, path, request)),
            (Method::Put, Some(id)) => {
                Some(replace(&mut collections, collection_name, id, request, false))
            }
            (Method::Patch, Some(id)) => {
                Some(replace(&mut collections, collection_name, id, request, true))
            }
            (Method::Delete, Some(id)) => collections.get_mut(collection_name).map(|c| {
                match c.records.remove(&id) {
                    Some(_) => RestResponse::new(204),
                    None => RestResponse::new(404),
                }
            }),
            _ => Some(RestResponse::new(405)),
        };

        response.unwrap_or_else(|| RestResponse::new(404))
    }
}

#[async_trait]
impl RestTransport for InMemoryBackend {
    async fn send(&self, request: RestRequest) -> ClientResult<RestResponse> {
        let response = self.handle(&request);
        log::debug!(
            target: "finanalyst::backend",
            "{} {} -> {}",
            request.method,
            request.path,
            response.status
        );
        Ok(response)
    }
}

// ==================== Handlers ====================

fn list(collection: &Collection, path: &str, query: &str) -> RestResponse {
    let params = parse_query(query);
    let mut records: Vec<&Map<String, Value>> = collection.records.values().collect();

    if let Some(sort) = params.get("sort") {
        let mut parts = sort.splitn(2, ',');
        let field = parts.next().unwrap_or("id").trim().to_string();
        let descending = parts
            .next()
            .map(|o| o.trim().eq_ignore_ascii_case("desc"))
            .unwrap_or(false);
        records.sort_by(|a, b| {
            let ordering = compare_values(
                a.get(&field).unwrap_or(&Value::Null),
                b.get(&field).unwrap_or(&Value::Null),
            )
            .then_with(|| compare_values(&a["id"], &b["id"]));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    let total = records.len() as u64;
    let paginated = params.contains_key("page") || params.contains_key("size");
    let mut response = RestResponse::new(200).with_header("X-Total-Count", total.to_string());

    if paginated {
        let page = params
            .get("page")
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0);
        let size = params
            .get("size")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(20);
        records = records
            .into_iter()
            .skip(page as usize * size as usize)
            .take(size as usize)
            .collect();
        response = response.with_header("Link", build_link_header(path, page, size, total));
    }

    let body: Vec<&Map<String, Value>> = records;
    match serde_json::to_vec(&body) {
        Ok(bytes) => response
            .with_header("Content-Type", "application/json")
            .with_body(bytes),
        Err(_) => RestResponse::new(500),
    }
}

fn create(
    collections: &mut HashMap<&'static str, Collection>,
    name: &str,
    path: &str,
    request: &RestRequest,
) -> RestResponse {
    let mut fields = match parse_body(request) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let Some(collection) = collections.get_mut(name) else {
        return RestResponse::new(404);
    };

    if !fields.get("id").map_or(true, Value::is_null) {
        return problem(
            400,
            &format!("A new {} cannot already have an ID", collection.entity_name),
            "error.idexists",
        );
    }
    if let Some(response) = check_required(collection, &fields) {
        return response;
    }

    let id = collection.allocate_id();
    fields.insert("id".to_string(), json!(id));
    collection.records.insert(id, fields);

    let saved = match collections.get(name).and_then(|c| c.records.get(&id)) {
        Some(saved) => hydrate(saved, collections),
        None => return RestResponse::new(500),
    };
    json_response(201, &saved).with_header("Location", format!("{}/{}", path, id))
}

fn replace(
    collections: &mut HashMap<&'static str, Collection>,
    name: &str,
    id: EntityId,
    request: &RestRequest,
    merge: bool,
) -> RestResponse {
    let incoming = match parse_body(request) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let Some(collection) = collections.get_mut(name) else {
        return RestResponse::new(404);
    };

    match incoming.get("id").and_then(Value::as_i64) {
        None => return problem(400, "Invalid id", "error.idnull"),
        Some(body_id) if body_id != id => return problem(400, "Invalid ID", "error.idinvalid"),
        Some(_) => {}
    }
    let Some(existing) = collection.records.get(&id) else {
        return RestResponse::new(404);
    };

    let fields = if merge {
        let mut merged = existing.clone();
        for (key, value) in incoming {
            if !value.is_null() {
                merged.insert(key, value);
            }
        }
        merged
    } else {
        incoming
    };

    if let Some(response) = check_required(collection, &fields) {
        return response;
    }
    collection.records.insert(id, fields);

    match collections.get(name).and_then(|c| c.records.get(&id)) {
        Some(saved) => json_response(200, &hydrate(saved, collections)),
        None => RestResponse::new(500),
    }
}

// ==================== Helpers ====================

fn parse_body(request: &RestRequest) -> Result<Map<String, Value>, RestResponse> {
    let body = request.body.as_deref().unwrap_or(b"");
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(problem(400, "Bad Request", "error.http.400")),
    }
}

fn check_required(collection: &Collection, fields: &Map<String, Value>) -> Option<RestResponse> {
    let field_errors: Vec<Value> = collection
        .required
        .iter()
        .filter(|field| fields.get(**field).map_or(true, Value::is_null))
        .map(|field| {
            json!({
                "objectName": collection.entity_name,
                "field": field,
                "message": "must not be null",
            })
        })
        .collect();

    if field_errors.is_empty() {
        return None;
    }

    let body = json!({
        "title": "Method argument not valid",
        "status": 400,
        "message": "error.validation",
        "fieldErrors": field_errors,
    });
    Some(json_response(400, &body))
}

/// Expand nested `{ "id": n }` references to the stored record of the
/// collection whose entity name matches the field name
fn hydrate(record: &Map<String, Value>, collections: &HashMap<&'static str, Collection>) -> Value {
    let mut out = record.clone();
    for (key, value) in out.iter_mut() {
        let Some(ref_id) = value.get("id").and_then(Value::as_i64) else {
            continue;
        };
        let referenced = collections
            .values()
            .find(|c| c.entity_name == key.as_str())
            .and_then(|c| c.records.get(&ref_id));
        if let Some(referenced) = referenced {
            *value = Value::Object(referenced.clone());
        }
    }
    Value::Object(out)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn json_response(status: u16, body: &Value) -> RestResponse {
    RestResponse::new(status)
        .with_header("Content-Type", "application/json")
        .with_body(body.to_string().into_bytes())
}

fn problem(status: u16, title: &str, message: &str) -> RestResponse {
    json_response(
        status,
        &json!({
            "title": title,
            "status": status,
            "message": message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, Income, Transaction};
    use crate::pagination::{parse_link_header, parse_total_count};

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new()
            .with_collection::<Expense>()
            .with_collection::<Income>()
            .with_collection::<Transaction>()
    }

    fn income(name: &str) -> Income {
        Income {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn body(response: &RestResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn test_create_assigns_id_and_location() {
        let backend = backend();
        let request = RestRequest::with_json(
            Method::Post,
            "/api/incomes",
            br#"{"name":"Salary"}"#.to_vec(),
        );
        let response = backend.handle(&request);
        assert_eq!(response.status, 201);
        assert_eq!(response.header("location"), Some("/api/incomes/1"));
        assert_eq!(body(&response)["id"], 1);
        assert_eq!(backend.count("incomes"), 1);
    }

    #[test]
    fn test_create_rejects_id_and_missing_required() {
        let backend = backend();
        let response = backend.handle(&RestRequest::with_json(
            Method::Post,
            "/api/incomes",
            br#"{"id":4,"name":"Salary"}"#.to_vec(),
        ));
        assert_eq!(response.status, 400);
        assert_eq!(body(&response)["message"], "error.idexists");

        let response = backend.handle(&RestRequest::with_json(
            Method::Post,
            "/api/expenses",
            br#"{"name":"Rent"}"#.to_vec(),
        ));
        assert_eq!(response.status, 400);
        let problem = body(&response);
        assert_eq!(problem["fieldErrors"][0]["field"], "category");
        assert_eq!(problem["fieldErrors"][0]["objectName"], "expense");
    }

    #[test]
    fn test_list_sorts_and_paginates() {
        let backend = backend();
        backend
            .seed(vec![income("Zeta"), income("alpha"), income("Mid")])
            .unwrap();

        let response = backend.handle(&RestRequest::get(
            "/api/incomes?page=0&size=2&sort=name%2Casc&cacheBuster=1",
        ));
        assert_eq!(response.status, 200);
        assert_eq!(parse_total_count(response.header("x-total-count")), Some(3));
        let names: Vec<_> = body(&response)
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "Mid"]);

        let links = parse_link_header(response.header("link").unwrap());
        assert_eq!(links.next, Some(1));
        assert_eq!(links.last, Some(1));
    }

    #[test]
    fn test_unparametrized_list_returns_everything() {
        let backend = backend();
        backend.seed(vec![income("A"), income("B")]).unwrap();
        let response = backend.handle(&RestRequest::get("/api/incomes?cacheBuster=5"));
        assert_eq!(body(&response).as_array().unwrap().len(), 2);
        assert!(response.header("link").is_none());
    }

    #[test]
    fn test_update_checks_ids() {
        let backend = backend();
        backend.seed(vec![income("A")]).unwrap();

        let put = |path: &str, json: &str| {
            backend.handle(&RestRequest::with_json(
                Method::Put,
                path,
                json.as_bytes().to_vec(),
            ))
        };
        assert_eq!(body(&put("/api/incomes/1", r#"{"name":"B"}"#))["message"], "error.idnull");
        assert_eq!(
            body(&put("/api/incomes/1", r#"{"id":2,"name":"B"}"#))["message"],
            "error.idinvalid"
        );
        assert_eq!(put("/api/incomes/9", r#"{"id":9,"name":"B"}"#).status, 404);

        let response = put("/api/incomes/1", r#"{"id":1,"name":"B"}"#);
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["name"], "B");
    }

    #[test]
    fn test_patch_merges_non_null_fields() {
        let backend = backend();
        backend
            .seed(vec![Expense {
                category: Some("Housing".to_string()),
                name: Some("Rent".to_string()),
                search_string1: Some("LANDLORD".to_string()),
                ..Default::default()
            }])
            .unwrap();

        let response = backend.handle(&RestRequest::with_json(
            Method::Patch,
            "/api/expenses/1",
            br#"{"id":1,"name":"Mortgage","category":null}"#.to_vec(),
        ));
        assert_eq!(response.status, 200);
        let saved = body(&response);
        assert_eq!(saved["name"], "Mortgage");
        assert_eq!(saved["category"], "Housing");
        assert_eq!(saved["searchString1"], "LANDLORD");
    }

    #[test]
    fn test_delete_and_missing_records() {
        let backend = backend();
        backend.seed(vec![income("A")]).unwrap();
        assert_eq!(backend.handle(&RestRequest::delete("/api/incomes/1")).status, 204);
        assert_eq!(backend.handle(&RestRequest::delete("/api/incomes/1")).status, 404);
        assert_eq!(backend.handle(&RestRequest::get("/api/incomes/1")).status, 404);
        assert_eq!(backend.handle(&RestRequest::get("/api/unknown")).status, 404);
    }

    #[test]
    fn test_transaction_references_are_hydrated() {
        let backend = backend();
        backend.seed(vec![income("Salary")]).unwrap();
        let response = backend.handle(&RestRequest::with_json(
            Method::Post,
            "/api/transactions",
            br#"{"description1":"Payroll","income":{"id":1},"isTracked":true}"#.to_vec(),
        ));
        assert_eq!(response.status, 201);
        assert_eq!(body(&response)["income"]["name"], "Salary");
    }
}
