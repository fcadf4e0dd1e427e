//! GraphQL payloads and the data provider used by the session manager.

pub mod operations;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrmError, Result};
use crate::transport::{AuthenticatedTransport, RequestOptions};

/// Typed GraphQL operation definition.
///
/// Implement this for each query, mutation, or subscription the client sends.
pub trait GraphqlOperation {
    type Variables: Serialize + Send + Sync;
    type ResponseData: DeserializeOwned + Send;

    const QUERY: &'static str;
    const OPERATION_NAME: &'static str;
}

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest<V> {
    pub query: String,
    pub variables: V,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl<V> GraphqlRequest<V> {
    pub fn new(query: impl Into<String>, variables: V) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Successful GraphQL response body. Error bodies never reach this type:
/// the transport turns them into an envelope first.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub extensions: Option<Value>,
}

/// Parameters for a raw, untyped call.
#[derive(Debug, Clone, Default)]
pub struct CustomParams {
    /// Overrides the provider's endpoint when set.
    pub url: Option<String>,
    pub headers: HeaderMap,
    pub query: String,
    pub variables: Value,
}

impl CustomParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Object(serde_json::Map::new()),
            ..Self::default()
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Sends GraphQL documents to one endpoint through the authenticated
/// transport.
#[derive(Debug, Clone)]
pub struct DataProvider {
    api_url: String,
    transport: AuthenticatedTransport,
}

impl DataProvider {
    pub fn new(api_url: impl Into<String>, transport: AuthenticatedTransport) -> Self {
        Self {
            api_url: api_url.into(),
            transport,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// Send a raw query and decode its `data` member.
    pub async fn custom<T: DeserializeOwned>(&self, params: CustomParams) -> Result<T> {
        let url = params.url.as_deref().unwrap_or(&self.api_url).to_string();
        let request = GraphqlRequest::new(params.query, params.variables);
        self.post(&url, &request, params.headers).await
    }

    /// Send a typed operation and decode its `data` member.
    pub async fn execute<O: GraphqlOperation>(
        &self,
        variables: O::Variables,
        headers: HeaderMap,
    ) -> Result<O::ResponseData> {
        let request =
            GraphqlRequest::new(O::QUERY, variables).with_operation_name(O::OPERATION_NAME);
        self.post(&self.api_url, &request, headers).await
    }

    /// Send a typed operation and return the whole response body.
    ///
    /// Succeeds whenever the transport does; `data` may be absent or null.
    pub async fn send<O: GraphqlOperation>(
        &self,
        variables: O::Variables,
        headers: HeaderMap,
    ) -> Result<GraphqlResponse<O::ResponseData>> {
        let request =
            GraphqlRequest::new(O::QUERY, variables).with_operation_name(O::OPERATION_NAME);
        self.post_response(&self.api_url, &request, headers).await
    }

    async fn post<V: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        request: &GraphqlRequest<V>,
        headers: HeaderMap,
    ) -> Result<T> {
        self.post_response(url, request, headers)
            .await?
            .data
            .ok_or_else(|| CrmError::Decode("GraphQL response has no data".to_string()))
    }

    async fn post_response<V: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        request: &GraphqlRequest<V>,
        headers: HeaderMap,
    ) -> Result<GraphqlResponse<T>> {
        let options = RequestOptions::post_json(request)?.with_headers(headers);
        let response = self.transport.send(url, options).await?;
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_operation_name_in_camel_case() {
        let request = GraphqlRequest::new("query Me { me { name } }", json!({}))
            .with_operation_name("Me");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "query Me { me { name } }",
                "variables": {},
                "operationName": "Me"
            })
        );
    }

    #[test]
    fn request_without_operation_name_omits_it() {
        let value = serde_json::to_value(GraphqlRequest::new("{ a }", json!({"x": 1}))).unwrap();
        assert!(value.get("operationName").is_none());
    }

    #[test]
    fn custom_params_default_to_empty_variables() {
        let params = CustomParams::new("{ a }");
        assert_eq!(params.variables, json!({}));
        assert!(params.url.is_none());
    }
}
