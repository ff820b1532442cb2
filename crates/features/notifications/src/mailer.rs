use crate::error::{NotificationError, NotificationErrorExt};
use async_trait::async_trait;
use fhub_domain::config::MailConfig;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt::{self, Debug};
use tracing::info;

/// A plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outgoing mail channel.
#[async_trait]
pub trait Mailer: Debug + Send + Sync {
    async fn send(&self, email: Email) -> Result<(), NotificationError>;
}

/// SMTP delivery through `lettre`.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpMailer {
    /// # Errors
    /// [`NotificationError::Config`] for an unusable relay or sender address.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let from: Mailbox = config.from.parse().map_err(|e| NotificationError::Config {
            message: format!("invalid sender address `{}`: {e}", config.from).into(),
            context: None,
        })?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .context("Failed to configure STARTTLS relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self { transport: builder.build(), from, host: config.host.clone() })
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer").field("host", &self.host).field("from", &self.from.to_string()).finish()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        let to: Mailbox = email.to.parse().map_err(|e| NotificationError::Address {
            message: format!("`{}`: {e}", email.to).into(),
            context: None,
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| NotificationError::from(format!("Failed to build message: {e}")))?;

        self.transport.send(message).await.context("SMTP send")?;
        Ok(())
    }
}

/// Writes messages to the log instead of sending them (mail disabled).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        info!(to = %email.to, subject = %email.subject, "Mail disabled, message not sent");
        Ok(())
    }
}
