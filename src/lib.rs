//! crm-client: authenticated GraphQL client for the CRM dashboard backend.
//!
//! Provides the token store, the authenticated transport that normalizes
//! GraphQL error bodies, the session manager (login, logout, check,
//! identity, error policy), and the realtime subscription channel.
//!
//! # Quick Start
//!
//! ```no_run
//! use crm_client::prelude::*;
//!
//! # async fn example() {
//! let config = CrmConfig::from_env();
//! let session = config.session(config.token_store());
//! let outcome = session.login(Credentials::demo()).await;
//! if outcome.success {
//!     println!("{:?}", session.get_identity().await);
//! }
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;
pub mod prelude;
pub mod resources;
pub mod transport;

#[cfg(feature = "realtime")]
pub mod realtime;

#[cfg(feature = "cli")]
pub mod cli;
