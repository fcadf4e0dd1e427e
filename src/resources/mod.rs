//! Resource lists shown by the dashboard pages.

use reqwest::header::HeaderMap;

use crate::error::Result;
use crate::graphql::operations::{CompaniesQuery, CompaniesVariables, Company, OffsetPaging};
use crate::graphql::DataProvider;

/// One page of a resource list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub paging: OffsetPaging,
}

impl<T> Page<T> {
    /// Whether rows exist past this page.
    pub fn has_more(&self) -> bool {
        u64::from(self.paging.offset) + (self.items.len() as u64) < self.total
    }

    /// Offset of the following page, clamped at `u32::MAX`.
    pub fn next_offset(&self) -> u32 {
        self.paging.offset.saturating_add(self.paging.limit)
    }
}

/// Fetch one page of companies.
pub async fn list_companies(data: &DataProvider, paging: OffsetPaging) -> Result<Page<Company>> {
    let response = data
        .execute::<CompaniesQuery>(CompaniesVariables { paging }, HeaderMap::new())
        .await?;
    Ok(Page {
        items: response.companies.nodes,
        total: response.companies.total_count,
        paging,
    })
}
