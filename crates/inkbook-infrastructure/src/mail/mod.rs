//! Mail transports implementing the `Mailer` port

mod log_mailer;
mod smtp;
mod templates;

pub use log_mailer::LogMailer;
pub use smtp::SmtpMailer;
pub use templates::TemplateRenderer;

use thiserror::Error;

use inkbook_core::error::DomainError;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message build error: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<MailError> for DomainError {
    fn from(err: MailError) -> Self {
        DomainError::NotificationError(err.to_string())
    }
}
