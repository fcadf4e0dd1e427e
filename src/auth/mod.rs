//! Access-token storage and the session manager built on top of it.

pub mod error;
pub mod provider;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use provider::{
    AuthActionResponse, AuthFailure, AuthProvider, CheckResponse, Credentials, Identity,
    OnErrorResponse, Redirect, DEMO_CREDENTIALS,
};
pub use session::AuthSession;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreConfig, ACCESS_TOKEN_KEY};
