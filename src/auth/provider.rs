//! The auth-provider seam a front end drives, and the values it returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CrmError;

/// Demo account accepted by the public CRM backend.
pub const DEMO_CREDENTIALS: DemoCredentials = DemoCredentials {
    email: "michael.scott@dundermifflin.com",
    password: "demodemo",
};

#[derive(Debug, Clone, Copy)]
pub struct DemoCredentials {
    pub email: &'static str,
    pub password: &'static str,
}

/// Email and password for one login attempt. Never stored.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_CREDENTIALS.email, DEMO_CREDENTIALS.password)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The signed-in user, fetched fresh on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Where the front end should navigate after an auth action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum Redirect {
    #[strum(serialize = "/")]
    #[serde(rename = "/")]
    Home,
    #[strum(serialize = "/login")]
    #[serde(rename = "/login")]
    Login,
}

/// Failure details shown on the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    pub message: String,
    pub name: String,
}

/// Outcome of `login` and `logout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<Redirect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AuthFailure>,
}

impl AuthActionResponse {
    pub fn success(redirect_to: Redirect) -> Self {
        Self {
            success: true,
            redirect_to: Some(redirect_to),
            error: None,
        }
    }

    pub fn failure(error: AuthFailure) -> Self {
        Self {
            success: false,
            redirect_to: None,
            error: Some(error),
        }
    }
}

/// Outcome of `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub authenticated: bool,
    pub redirect_to: Redirect,
}

impl CheckResponse {
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            redirect_to: Redirect::Home,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            redirect_to: Redirect::Login,
        }
    }
}

/// Decision of the error policy hook.
#[derive(Debug)]
pub enum OnErrorResponse {
    /// The session is no longer valid; the front end must log out.
    Logout,
    /// Not an auth problem; the error is handed back unchanged.
    Error(CrmError),
}

impl OnErrorResponse {
    pub fn is_logout(&self) -> bool {
        matches!(self, Self::Logout)
    }
}

/// Authentication operations a front end drives.
///
/// Every method returns an explicit outcome; none of them fail with an error
/// the caller has to catch.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, credentials: Credentials) -> AuthActionResponse;
    async fn logout(&self) -> AuthActionResponse;
    async fn check(&self) -> CheckResponse;
    async fn on_error(&self, error: CrmError) -> OnErrorResponse;
    async fn get_identity(&self) -> Option<Identity>;
}
