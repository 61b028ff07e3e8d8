//! User management payloads

use serde::Deserialize;
use validator::Validate;

use inkbook_core::{UserFilter, UserType};
use inkbook_shared::constants::DEFAULT_USER_PAGE_SIZE;
use inkbook_shared::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub user_type: Option<UserType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserListQuery {
    pub fn into_parts(self) -> (UserFilter, Pagination) {
        let pagination = Pagination::new(self.page, self.limit, DEFAULT_USER_PAGE_SIZE);
        let filter = UserFilter {
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            user_type: self.user_type,
        };
        (filter, pagination)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}
