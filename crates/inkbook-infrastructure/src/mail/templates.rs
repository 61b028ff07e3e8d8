// ============================================================================
// InkBook Infrastructure - Mail Templates
// File: crates/inkbook-infrastructure/src/mail/templates.rs
// ============================================================================

use handlebars::Handlebars;
use tracing::debug;

use inkbook_core::domain::{MailBody, MailTemplate};

use super::MailError;

const LAYOUT_OPEN: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: #2d2a4a; color: white; padding: 24px; text-align: center; border-radius: 8px 8px 0 0; }
    .content { background: #f9f9f9; padding: 24px; border-radius: 0 0 8px 8px; }
    .details { background: white; padding: 16px; border-radius: 4px; margin: 16px 0; border-left: 4px solid #2d2a4a; }
  </style>
</head>
<body>
<div class="container">"#;

const LAYOUT_CLOSE: &str = r#"
<p style="margin-top: 24px;">Regards,<br>The InkBook team</p>
</div>
</div>
</body>
</html>"#;

const NEW_APPOINTMENT_REQUEST: &str = r#"
<div class="header"><h1>New appointment request</h1></div>
<div class="content">
  <h2>Hello {{tenant_name}},</h2>
  <p>A client has published a new appointment request.</p>
  <div class="details">
    <p><strong>Client:</strong> {{client_name}}</p>
    <p><strong>Title:</strong> {{request_title}}</p>
    <p><strong>Maximum budget:</strong> ${{budget}}</p>
    <p><strong>Design images:</strong> {{design_images_count}}</p>
  </div>
  <p>Any studio may accept it. The first studio to accept gets the booking.</p>
"#;

const APPOINTMENT_REQUEST_ACCEPTED: &str = r#"
<div class="header"><h1>Your request was accepted</h1></div>
<div class="content">
  <h2>Hello {{client_name}},</h2>
  <p><strong>{{tenant_name}}</strong> accepted your request <strong>{{request_title}}</strong>.</p>
  <div class="details">
    {{#if tenant_email}}<p><strong>Email:</strong> {{tenant_email}}</p>{{/if}}
    {{#if tenant_phone}}<p><strong>Phone:</strong> {{tenant_phone}}</p>{{/if}}
  </div>
  <p>The studio will contact you to schedule the session.</p>
"#;

const APPOINTMENT_SCHEDULED: &str = r#"
<div class="header"><h1>Your session is scheduled</h1></div>
<div class="content">
  <h2>Hello {{client_name}},</h2>
  <p><strong>{{tenant_name}}</strong> scheduled your appointment.</p>
  <div class="details">
    <p><strong>Appointment:</strong> {{appointment_title}}</p>
    <p><strong>Starts:</strong> {{start_time}}</p>
    <p><strong>Ends:</strong> {{end_time}}</p>
  </div>
"#;

fn template_source(template: MailTemplate) -> String {
    let inner = match template {
        MailTemplate::NewAppointmentRequest => NEW_APPOINTMENT_REQUEST,
        MailTemplate::AppointmentRequestAccepted => APPOINTMENT_REQUEST_ACCEPTED,
        MailTemplate::AppointmentScheduled => APPOINTMENT_SCHEDULED,
    };
    format!("{LAYOUT_OPEN}{inner}{LAYOUT_CLOSE}")
}

/// Renders mail bodies to HTML using the registered templates
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, MailError> {
        let mut registry = Handlebars::new();
        for template in MailTemplate::all() {
            registry
                .register_template_string(template.name(), template_source(template))
                .map_err(|e| MailError::Template(e.to_string()))?;
            debug!("Registered mail template {}", template.name());
        }
        Ok(Self { registry })
    }

    pub fn render(&self, template: MailTemplate, data: &serde_json::Value) -> Result<String, MailError> {
        self.registry
            .render(template.name(), data)
            .map_err(|e| MailError::Template(e.to_string()))
    }

    /// Returns the body and whether it is HTML
    pub fn render_body(&self, body: &MailBody) -> Result<(String, bool), MailError> {
        match body {
            MailBody::Template { template, data } => Ok((self.render(*template, data)?, true)),
            MailBody::Html(html) => Ok((html.clone(), true)),
            MailBody::Text(text) => Ok((text.clone(), false)),
        }
    }
}
