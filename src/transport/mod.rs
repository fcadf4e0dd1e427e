//! Authenticated HTTP transport for the GraphQL endpoint.
//!
//! Every call reads the current token, injects the auth and content headers,
//! buffers the response body once, and turns GraphQL error bodies into an
//! [`ErrorEnvelope`].

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::store::{current_token, TokenStore};
use crate::error::{CrmError, ErrorEnvelope};

/// CORS preflight opt-in header expected by the backend's GraphQL server.
pub const APOLLO_REQUIRE_PREFLIGHT: HeaderName = HeaderName::from_static("apollo-require-preflight");

/// What to send as `Authorization` when no caller header and no token exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTokenPolicy {
    /// Send the literal `Bearer undefined`, matching the dashboard's behavior.
    #[default]
    LiteralUndefined,
    /// Leave the `Authorization` header out.
    Omit,
}

/// Method, headers, and body for a single call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    /// POST with a JSON-serialized body.
    pub fn post_json<T: Serialize + ?Sized>(body: &T) -> Result<Self, CrmError> {
        Ok(Self {
            body: Some(serde_json::to_vec(body)?),
            ..Self::default()
        })
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// A completed response whose body has been buffered.
///
/// The transport inspects a copy of the body; the caller still reads the
/// full, unconsumed body through [`bytes`](Self::bytes), [`text`](Self::text),
/// or [`json`](Self::json).
#[derive(Clone)]
pub struct TransportResponse {
    status: reqwest::StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TransportResponse {
    pub fn status(&self) -> reqwest::StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CrmError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// HTTP transport that authenticates every call from a [`TokenStore`].
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    missing_token: MissingTokenPolicy,
}

impl fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("missing_token", &self.missing_token)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedTransport {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            missing_token: MissingTokenPolicy::default(),
        }
    }

    /// Use a preconfigured HTTP client (proxy, TLS roots, ...).
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_missing_token_policy(mut self, policy: MissingTokenPolicy) -> Self {
        self.missing_token = policy;
        self
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Issue one request. No retries: one call, one outcome.
    pub async fn send(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<TransportResponse, ErrorEnvelope> {
        let token = current_token(self.store.as_ref());
        let headers = build_headers(options.headers, token.as_deref(), self.missing_token);

        debug!(%url, method = %options.method, "sending GraphQL request");
        let mut request = self.http.request(options.method, url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%url, error = %err, "GraphQL request failed before a response arrived");
            ErrorEnvelope::unknown()
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| {
                warn!(%url, error = %err, "failed to read GraphQL response body");
                ErrorEnvelope::unknown()
            })?
            .to_vec();
        debug!(%url, %status, body_len = body.len(), "GraphQL response received");

        if let Some(envelope) = inspect_body(&body) {
            debug!(
                %url,
                status_code = %envelope.status_code,
                "GraphQL response carried an error envelope"
            );
            return Err(envelope);
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Merge caller headers with the authorization and content headers.
///
/// A non-empty caller `Authorization` wins; `Content-Type` and the preflight
/// header always take the fixed values.
pub fn build_headers(
    mut headers: HeaderMap,
    token: Option<&str>,
    policy: MissingTokenPolicy,
) -> HeaderMap {
    let caller_supplied = headers
        .get(AUTHORIZATION)
        .is_some_and(|value| !value.as_bytes().is_empty());

    if !caller_supplied {
        let bearer = match (token, policy) {
            (Some(token), _) => Some(format!("Bearer {token}")),
            (None, MissingTokenPolicy::LiteralUndefined) => Some("Bearer undefined".to_string()),
            (None, MissingTokenPolicy::Omit) => None,
        };
        match bearer.map(|value| HeaderValue::from_str(&value)) {
            Some(Ok(value)) => {
                headers.insert(AUTHORIZATION, value);
            }
            Some(Err(_)) => {
                warn!("stored access token is not a valid header value; sending no Authorization");
                headers.remove(AUTHORIZATION);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(APOLLO_REQUIRE_PREFLIGHT, HeaderValue::from_static("true"));
    headers
}

fn inspect_body(body: &[u8]) -> Option<ErrorEnvelope> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => ErrorEnvelope::from_graphql_body(&value),
        Err(_) => Some(ErrorEnvelope::unknown()),
    }
}
