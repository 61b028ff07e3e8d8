// ============================================================================
// InkBook Infrastructure - SMTP Mailer
// File: crates/inkbook-infrastructure/src/mail/smtp.rs
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use inkbook_core::domain::{MailMessage, MailReceipt};
use inkbook_core::error::DomainError;
use inkbook_core::ports::Mailer;
use inkbook_shared::config::MailSettings;
use inkbook_shared::utils::mask_email;

use super::{MailError, TemplateRenderer};

/// Delivers mail through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    renderer: TemplateRenderer,
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings, renderer: TemplateRenderer) -> Result<Self, MailError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let builder = if settings.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_host)
        };
        let builder = builder.port(settings.smtp_port);
        let builder = match (&settings.smtp_username, &settings.smtp_password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            _ => builder,
        };

        info!(
            "SMTP mailer configured for {}:{} (tls: {})",
            settings.smtp_host, settings.smtp_port, settings.smtp_tls
        );

        Ok(Self {
            transport: builder.build(),
            from,
            renderer,
        })
    }

    fn build_message(&self, message: &MailMessage) -> Result<Message, MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;
        let (body, is_html) = self.renderer.render_body(&message.body)?;
        let content_type = if is_html { ContentType::TEXT_HTML } else { ContentType::TEXT_PLAIN };

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(content_type)
            .body(body)
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_mail(&self, message: MailMessage) -> Result<MailReceipt, DomainError> {
        let recipient = mask_email(&message.to);
        let email = self.build_message(&message)?;

        let response = self.transport.send(email).await.map_err(|e| {
            error!("Failed to send mail to {}: {}", recipient, e);
            MailError::Transport(e.to_string())
        })?;

        info!("Mail '{}' sent to {}", message.subject, recipient);
        Ok(MailReceipt {
            message_id: response.first_line().map(str::to_string),
            accepted_at: Utc::now(),
        })
    }
}
