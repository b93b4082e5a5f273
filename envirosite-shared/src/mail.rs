/// Outgoing mail delivery
///
/// Handlers talk to a [`Mailer`] trait object so the delivery mechanism can be
/// swapped: [`SmtpMailer`] sends through an SMTP relay with `lettre`,
/// [`LogMailer`] only writes the message to the log (used when no SMTP host is
/// configured).
///
/// # Example
///
/// ```no_run
/// use envirosite_shared::mail::{build_mailer, MailConfig, OutgoingMail};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = build_mailer(&MailConfig {
///     host: Some("smtp.example.com".to_string()),
///     username: Some("mailer".to_string()),
///     password: Some("secret".to_string()),
///     ..Default::default()
/// })?;
///
/// mailer
///     .send(&OutgoingMail {
///         to_email: "admin@example.com".to_string(),
///         to_name: "Admin".to_string(),
///         reply_to: None,
///         subject: "Hello".to_string(),
///         body: "Plain text body".to_string(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, info};

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// A sender or recipient address could not be parsed
    #[error("Invalid mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The SMTP server rejected the message or was unreachable
    #[error("Failed to send mail: {0}")]
    Transport(String),
}

/// SMTP settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP host; `None` disables delivery and logs messages instead
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Use TLS (implicit on port 465, STARTTLS otherwise)
    pub secure: bool,
    pub from_address: String,
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            secure: true,
            from_address: "no-reply@localhost".to_string(),
            from_name: "Envirosite".to_string(),
        }
    }
}

/// A plain-text message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to_email: String,
    pub to_name: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Mail delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message; a single attempt, no retries
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Builds the mailer described by `config`
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.host {
        Some(host) if !host.trim().is_empty() => {
            info!(host = %host, port = config.port, secure = config.secure, "Using SMTP mailer");
            Ok(Arc::new(SmtpMailer::new(config)?))
        }
        _ => {
            info!("MAIL_HOST not set, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

fn parse_mailbox(name: &str, address: &str) -> Result<Mailbox, MailError> {
    let parsed = address
        .trim()
        .parse::<Address>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    let name = name.trim();
    Ok(Mailbox::new((!name.is_empty()).then(|| name.to_string()), parsed))
}

/// Sends mail through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| MailError::Transport("SMTP host is not configured".to_string()))?;

        let mut builder = if !config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: parse_mailbox(&config.from_name, &config.from_address)?,
        })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&mail.to_name, &mail.to_email)?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = &mail.reply_to {
            builder = builder.reply_to(parse_mailbox("", reply_to)?);
        }

        builder
            .body(mail.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!(to = %mail.to_email, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        parse_mailbox(&mail.to_name, &mail.to_email)?;

        info!(
            to = %mail.to_email,
            subject = %mail.subject,
            body = %mail.body,
            "Mail delivery disabled, message logged"
        );
        Ok(())
    }
}

/// Contents of a contact-form submission
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_name: String,
    pub message: String,
}

/// Formats the notification an admin receives for a contact submission
///
/// Replies go straight to the visitor.
pub fn contact_notification(admin_name: &str, admin_email: &str, contact: &ContactMessage) -> OutgoingMail {
    let phone = contact.phone.as_deref().unwrap_or("-");

    let body = format!(
        "Hello {admin},\n\n\
         A new message was submitted through the website contact form.\n\n\
         Name:    {name}\n\
         Email:   {email}\n\
         Phone:   {phone}\n\
         Service: {service}\n\n\
         Message:\n{message}\n",
        admin = admin_name,
        name = contact.name,
        email = contact.email,
        phone = phone,
        service = contact.service_name,
        message = contact.message,
    );

    OutgoingMail {
        to_email: admin_email.to_string(),
        to_name: admin_name.to_string(),
        reply_to: Some(contact.email.clone()),
        subject: format!("New inquiry: {} from {}", contact.service_name, contact.name),
        body,
    }
}
