#![allow(dead_code)]

use std::sync::Arc;

use crm_client::auth::{AuthSession, MemoryTokenStore, TokenStore};
use crm_client::graphql::DataProvider;
use crm_client::transport::{AuthenticatedTransport, MissingTokenPolicy};
use serde_json::Value;
use wiremock::{MockServer, Request};

pub fn graphql_url(server: &MockServer) -> String {
    format!("{}/graphql", server.uri())
}

pub fn store_with(token: Option<&str>) -> Arc<MemoryTokenStore> {
    Arc::new(token.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_token))
}

pub fn transport(store: Arc<MemoryTokenStore>) -> AuthenticatedTransport {
    AuthenticatedTransport::new(store)
}

pub fn transport_with_policy(
    store: Arc<MemoryTokenStore>,
    policy: MissingTokenPolicy,
) -> AuthenticatedTransport {
    AuthenticatedTransport::new(store).with_missing_token_policy(policy)
}

pub fn session(server: &MockServer, store: Arc<MemoryTokenStore>) -> AuthSession {
    let dyn_store: Arc<dyn TokenStore> = store;
    let data = DataProvider::new(graphql_url(server), AuthenticatedTransport::new(dyn_store.clone()));
    AuthSession::new(data, dyn_store)
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
}

pub fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn body_json(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("request body is JSON")
}
