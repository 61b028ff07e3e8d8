//! Transactional mail transport

use async_trait::async_trait;

use crate::domain::{MailMessage, MailReceipt};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, message: MailMessage) -> Result<MailReceipt, DomainError>;
}
