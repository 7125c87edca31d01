//! In-memory Pet Store behind a wiremock server
//!
//! The blocking client must not run inside a tokio context, so the runtime
//! here only starts and mounts the server; requests are sent from the test
//! thread.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once, PoisonError};

use serde_json::Value;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const API_PREFIX: &str = "/api/v3";
const VALID_STATUSES: [&str; 3] = ["available", "pending", "sold"];

static TRACING: Once = Once::new();

pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Deviations from the documented contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// PUT /pet answers the stored document without applying the update.
    pub stale_updates: bool,
    /// Every DELETE answers 500.
    pub fail_deletes: bool,
}

#[derive(Debug, Default)]
struct State {
    pets: HashMap<i64, Value>,
    orders: HashMap<i64, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePetStore {
    state: Arc<Mutex<State>>,
    quirks: Quirks,
}

fn text(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_string(body)
}

fn json(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

fn document_id(body: &[u8]) -> Option<(i64, Value)> {
    let doc: Value = serde_json::from_slice(body).ok()?;
    let id = doc.get("id")?.as_i64()?;
    Some((id, doc))
}

impl FakePetStore {
    pub fn with_quirks(quirks: Quirks) -> Self {
        Self {
            quirks,
            ..Self::default()
        }
    }

    pub fn pet_count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).pets.len()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).orders.len()
    }

    fn pets(&self, state: &mut State, method: &str, rest: &[&str], request: &Request) -> ResponseTemplate {
        match (method, rest) {
            ("POST", []) => match document_id(&request.body) {
                Some((id, doc)) => {
                    state.pets.insert(id, doc.clone());
                    json(200, doc)
                }
                None => text(400, "Invalid input"),
            },
            ("PUT", []) => match document_id(&request.body) {
                Some((id, doc)) => match state.pets.get_mut(&id) {
                    Some(stored) if self.quirks.stale_updates => json(200, stored.clone()),
                    Some(stored) => {
                        *stored = doc.clone();
                        json(200, doc)
                    }
                    None => text(404, "Pet not found"),
                },
                None => text(400, "Invalid ID supplied"),
            },
            ("GET", ["findByStatus"]) => {
                let status = request
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "status")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                if !VALID_STATUSES.contains(&status.as_str()) {
                    return text(400, "Invalid status value");
                }
                let pets: Vec<Value> = state
                    .pets
                    .values()
                    .filter(|p| p.get("status").and_then(Value::as_str) == Some(status.as_str()))
                    .cloned()
                    .collect();
                json(200, Value::Array(pets))
            }
            (_, [id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    return text(400, "Invalid ID supplied");
                };
                match method {
                    "GET" => state
                        .pets
                        .get(&id)
                        .map_or_else(|| text(404, "Pet not found"), |p| json(200, p.clone())),
                    "DELETE" if self.quirks.fail_deletes => text(500, "Internal error"),
                    "DELETE" => {
                        state.pets.remove(&id);
                        text(200, "Pet deleted")
                    }
                    _ => text(405, "Method not allowed"),
                }
            }
            _ => text(404, "Not found"),
        }
    }

    fn orders(&self, state: &mut State, method: &str, rest: &[&str], request: &Request) -> ResponseTemplate {
        match (method, rest) {
            ("POST", []) => match document_id(&request.body) {
                Some((id, doc)) => {
                    state.orders.insert(id, doc.clone());
                    json(200, doc)
                }
                None => text(400, "Invalid input"),
            },
            (_, [id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    return text(400, "Invalid ID supplied");
                };
                match method {
                    "GET" => state
                        .orders
                        .get(&id)
                        .map_or_else(|| text(404, "Order not found"), |o| json(200, o.clone())),
                    "DELETE" if self.quirks.fail_deletes => text(500, "Internal error"),
                    "DELETE" => match state.orders.remove(&id) {
                        Some(_) => text(200, ""),
                        None => text(404, "Order not found"),
                    },
                    _ => text(405, "Method not allowed"),
                }
            }
            _ => text(404, "Not found"),
        }
    }
}

impl Respond for FakePetStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path();
        let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let method = request.method.as_str();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match segments.as_slice() {
            ["pet", rest @ ..] => self.pets(&mut state, method, rest, request),
            ["store", "order", rest @ ..] => self.orders(&mut state, method, rest, request),
            _ => text(404, "Not found"),
        }
    }
}

/// A running fake service.
pub struct FakeService {
    server: MockServer,
    runtime: tokio::runtime::Runtime,
    pub store: FakePetStore,
}

impl FakeService {
    pub fn start(store: FakePetStore) -> Self {
        init_test_tracing();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(any())
                .respond_with(store.clone())
                .mount(&server)
                .await;
            server
        });
        Self {
            server,
            runtime,
            store,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}{API_PREFIX}", self.server.uri())
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}
