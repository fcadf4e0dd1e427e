//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthActionResponse, AuthProvider, AuthSession, CheckResponse, Credentials, Identity,
    MemoryTokenStore, OnErrorResponse, Redirect, TokenStore,
};
pub use crate::config::CrmConfig;
pub use crate::error::{CrmError, ErrorEnvelope, Result, StatusCode};
pub use crate::graphql::{CustomParams, DataProvider};
pub use crate::transport::{AuthenticatedTransport, MissingTokenPolicy, RequestOptions};

#[cfg(feature = "realtime")]
pub use crate::realtime::{RealtimeCapability, RealtimeChannel};
