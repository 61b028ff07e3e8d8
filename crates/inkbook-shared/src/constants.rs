//! Application-wide constants

pub const DEFAULT_APPOINTMENT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_REQUEST_PAGE_SIZE: u32 = 50;
pub const DEFAULT_AUDIT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_USER_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TENANT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
/// Largest offset a SQL `OFFSET` bind (BIGINT) can carry
pub const MAX_LIST_OFFSET: u64 = i64::MAX as u64;
pub const DEFAULT_UPCOMING_LIMIT: u32 = 10;
pub const DEFAULT_REQUEST_TTL_DAYS: i64 = 7;
pub const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_REALTIME_QUEUE_CAPACITY: usize = 256;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 3600;
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 604800;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
