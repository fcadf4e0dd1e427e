//! CRM client binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crm_client::cli::{Cli, Commands};
use crm_client::config::CrmConfig;
use crm_client::graphql::operations::OffsetPaging;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CrmConfig::from_env();
    let session = config.session(config.token_store());

    let result = match cli.command {
        Commands::Login(args) => {
            crm_client::cli::auth::handle_login(&session, &args.email, &args.password).await
        }
        Commands::Logout => crm_client::cli::auth::handle_logout(&session).await,
        Commands::Check => crm_client::cli::auth::handle_check(&session).await,
        Commands::Whoami => crm_client::cli::auth::handle_whoami(&session).await,
        Commands::Companies(args) => {
            let paging = OffsetPaging {
                limit: args.limit,
                offset: args.offset,
            };
            crm_client::cli::companies::handle_list(&session, paging).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
