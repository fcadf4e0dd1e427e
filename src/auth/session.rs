use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use super::provider::{
    AuthActionResponse, AuthFailure, AuthProvider, CheckResponse, Credentials, Identity,
    OnErrorResponse, Redirect,
};
use super::store::{current_token, TokenStore};
use crate::error::CrmError;
use crate::graphql::operations::{
    IdentityQuery, LoginMutation, LoginVariables, NoVariables, SessionCheckQuery,
};
use crate::graphql::DataProvider;

const LOGIN_FAILED_MESSAGE: &str = "Login failed";
const LOGIN_FAILED_NAME: &str = "Invalid email or password";

/// Session manager over the GraphQL backend.
///
/// Moves between *unauthenticated* (no token) and *authenticated* (token
/// stored) through `login` and `logout`. The token store is the only shared
/// state.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use crm_client::auth::{AuthProvider, AuthSession, Credentials, MemoryTokenStore};
/// use crm_client::graphql::DataProvider;
/// use crm_client::transport::AuthenticatedTransport;
///
/// # async fn example() {
/// let store = Arc::new(MemoryTokenStore::new());
/// let transport = AuthenticatedTransport::new(store.clone());
/// let data = DataProvider::new("https://api.crm.refine.dev/graphql", transport);
/// let session = AuthSession::new(data, store);
/// let outcome = session.login(Credentials::demo()).await;
/// assert!(outcome.success);
/// # }
/// ```
#[derive(Clone)]
pub struct AuthSession {
    data: DataProvider,
    store: Arc<dyn TokenStore>,
}

impl AuthSession {
    pub fn new(data: DataProvider, store: Arc<dyn TokenStore>) -> Self {
        Self { data, store }
    }

    pub fn data_provider(&self) -> &DataProvider {
        &self.data
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Run the error policy and carry out a forced logout when it asks for one.
    pub async fn apply_error_policy(&self, error: CrmError) -> OnErrorResponse {
        let decision = self.on_error(error).await;
        if decision.is_logout() {
            self.logout().await;
        }
        decision
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("api_url", &self.data.api_url())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for AuthSession {
    /// Only the email is sent; the backend's login mutation takes no password.
    async fn login(&self, credentials: Credentials) -> AuthActionResponse {
        let variables = LoginVariables {
            email: credentials.email,
        };
        let result = self
            .data
            .execute::<LoginMutation>(variables, HeaderMap::new())
            .await
            .and_then(|data| {
                self.store
                    .set(&data.login.access_token)
                    .map_err(CrmError::from)
            });

        match result {
            Ok(()) => {
                debug!("login succeeded; session is authenticated");
                AuthActionResponse::success(Redirect::Home)
            }
            Err(err) => {
                debug!(error = %err, "login failed");
                AuthActionResponse::failure(login_failure(&err))
            }
        }
    }

    async fn logout(&self) -> AuthActionResponse {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear access token during logout");
        }
        debug!("logged out");
        AuthActionResponse::success(Redirect::Login)
    }

    async fn check(&self) -> CheckResponse {
        match self
            .data
            .send::<SessionCheckQuery>(NoVariables::default(), HeaderMap::new())
            .await
        {
            Ok(_) => CheckResponse::authenticated(),
            Err(err) => {
                debug!(error = %err, "session check failed");
                CheckResponse::unauthenticated()
            }
        }
    }

    async fn on_error(&self, error: CrmError) -> OnErrorResponse {
        if error.is_unauthenticated() {
            OnErrorResponse::Logout
        } else {
            OnErrorResponse::Error(error)
        }
    }

    async fn get_identity(&self) -> Option<Identity> {
        let mut headers = HeaderMap::new();
        if let Some(token) = current_token(self.store.as_ref()) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        match self
            .data
            .execute::<IdentityQuery>(NoVariables::default(), headers)
            .await
        {
            Ok(data) => Some(data.me),
            Err(err) => {
                debug!(error = %err, "identity lookup failed");
                None
            }
        }
    }
}

fn login_failure(error: &CrmError) -> AuthFailure {
    let message = error.message();
    AuthFailure {
        message: if message.is_empty() {
            LOGIN_FAILED_MESSAGE.to_string()
        } else {
            message
        },
        name: LOGIN_FAILED_NAME.to_string(),
    }
}
