//! Appointment request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use inkbook_core::{RequestFilter, RequestStatus};
use inkbook_shared::constants::MAX_LIST_OFFSET;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RequestListQuery {
    pub client_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
    pub limit: Option<u32>,
    #[validate(range(max = MAX_LIST_OFFSET))]
    pub offset: Option<u64>,
}

impl RequestListQuery {
    pub fn filter(&self) -> RequestFilter {
        RequestFilter {
            client_id: self.client_id,
            tenant_id: self.tenant_id,
            status: self.status,
        }
    }
}

/// Body of `PATCH /appointment-requests/{id}/accept`
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptRequestDto {
    pub tenant_id: Uuid,
}
