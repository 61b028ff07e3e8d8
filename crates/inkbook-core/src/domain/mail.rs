//! Outbound transactional mail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailTemplate {
    NewAppointmentRequest,
    AppointmentRequestAccepted,
    AppointmentScheduled,
}

impl MailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            MailTemplate::NewAppointmentRequest => "new-appointment-request",
            MailTemplate::AppointmentRequestAccepted => "appointment-request-accepted",
            MailTemplate::AppointmentScheduled => "appointment-scheduled",
        }
    }

    pub fn all() -> [MailTemplate; 3] {
        [
            MailTemplate::NewAppointmentRequest,
            MailTemplate::AppointmentRequestAccepted,
            MailTemplate::AppointmentScheduled,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MailBody {
    Template {
        template: MailTemplate,
        data: serde_json::Value,
    },
    Html(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: MailBody,
}

impl MailMessage {
    pub fn template(
        to: impl Into<String>,
        subject: impl Into<String>,
        template: MailTemplate,
        data: serde_json::Value,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: MailBody::Template { template, data },
        }
    }
}

/// Acknowledgement from the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailReceipt {
    pub message_id: Option<String>,
    pub accepted_at: DateTime<Utc>,
}
