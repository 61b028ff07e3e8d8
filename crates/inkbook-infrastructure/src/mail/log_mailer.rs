//! Mailer that renders messages and writes them to the log instead of sending

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use inkbook_core::domain::{MailMessage, MailReceipt};
use inkbook_core::error::DomainError;
use inkbook_core::ports::Mailer;
use inkbook_shared::utils::mask_email;

use super::TemplateRenderer;

pub struct LogMailer {
    renderer: TemplateRenderer,
}

impl LogMailer {
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mail(&self, message: MailMessage) -> Result<MailReceipt, DomainError> {
        let (body, is_html) = self.renderer.render_body(&message.body)?;
        let message_id = Uuid::new_v4().to_string();

        info!(
            message_id = %message_id,
            to = %mask_email(&message.to),
            subject = %message.subject,
            html = is_html,
            bytes = body.len(),
            "Mail delivered to log transport"
        );

        Ok(MailReceipt {
            message_id: Some(message_id),
            accepted_at: Utc::now(),
        })
    }
}
