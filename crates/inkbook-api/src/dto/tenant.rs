//! Tenant onboarding payloads

use serde::Deserialize;
use uuid::Uuid;

use inkbook_shared::constants::DEFAULT_TENANT_PAGE_SIZE;
use inkbook_shared::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TenantListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit, DEFAULT_TENANT_PAGE_SIZE)
    }
}

/// Body of `POST /tenants/{id}/members`
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberDto {
    pub user_id: Uuid,
}
