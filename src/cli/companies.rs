//! CLI handler for `crm companies`.

use crate::auth::{AuthProvider, AuthSession, OnErrorResponse};
use crate::graphql::operations::OffsetPaging;
use crate::resources::list_companies;

/// Handle `crm companies`. An unauthenticated response clears the stored token.
pub async fn handle_list(
    session: &AuthSession,
    paging: OffsetPaging,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = match list_companies(session.data_provider(), paging).await {
        Ok(page) => page,
        Err(err) => {
            return match session.apply_error_policy(err).await {
                OnErrorResponse::Logout => Err("Session expired. Run: crm login".into()),
                OnErrorResponse::Error(err) => Err(err.into()),
            };
        }
    };

    for company in &page.items {
        println!("{:>8}  {}", company.id, company.name);
    }
    println!(
        "-- {} of {} (offset {})",
        page.items.len(),
        page.total,
        page.paging.offset
    );
    if page.has_more() {
        println!(
            "   next: crm companies --offset {}",
            page.next_offset()
        );
    }
    Ok(())
}
