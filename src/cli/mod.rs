//! CLI entry point for the CRM client.

pub mod auth;
pub mod companies;

use clap::{Parser, Subcommand};

use crate::auth::DEMO_CREDENTIALS;

/// CRM dashboard client
#[derive(Parser, Debug)]
#[command(name = "crm", version, about = "CRM dashboard GraphQL client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange an email for an access token
    Login(LoginArgs),
    /// Forget the stored access token
    Logout,
    /// Check whether the stored token is still accepted
    Check,
    /// Show the signed-in user
    Whoami,
    /// List companies
    Companies(CompaniesArgs),
}

/// Arguments for `crm login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long, default_value = DEMO_CREDENTIALS.email)]
    pub email: String,

    /// Account password (accepted for parity; the backend only checks the email)
    #[arg(short, long, default_value = DEMO_CREDENTIALS.password)]
    pub password: String,
}

/// Arguments for `crm companies`.
#[derive(Parser, Debug)]
pub struct CompaniesArgs {
    /// Page size
    #[arg(short, long, default_value_t = 10)]
    pub limit: u32,

    /// Rows to skip
    #[arg(short, long, default_value_t = 0)]
    pub offset: u32,
}
