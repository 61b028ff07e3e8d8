//! Outbound collaborators consumed by the services

pub mod mailer;
pub mod notifier;

pub use mailer::Mailer;
pub use notifier::EventNotifier;

#[cfg(test)]
pub use mailer::MockMailer;
#[cfg(test)]
pub use notifier::MockEventNotifier;
