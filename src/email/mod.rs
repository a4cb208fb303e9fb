use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::config::EmailConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Delivers mail through an SMTP relay with STARTTLS.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config.from_address
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let to: Mailbox = email.to
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::External(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

/// Writes mail to the log instead of sending it. Used when email is disabled.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email delivery disabled, message follows:\n{}",
            email.body
        );
        Ok(())
    }
}

pub fn sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    if config.enabled {
        tracing::info!("Sending email through SMTP relay {}:{}", config.smtp_host, config.smtp_port);
        Ok(Arc::new(SmtpEmailSender::new(config)?))
    } else {
        tracing::info!("Email disabled, verification links will be logged");
        Ok(Arc::new(LogEmailSender))
    }
}

pub fn verification_email(base_url: &str, name: &str, to: &str, token: &str, valid_hours: i64) -> OutgoingEmail {
    let link = format!("{}/verify-email?token={}", base_url.trim_end_matches('/'), token);

    OutgoingEmail {
        to: to.to_string(),
        subject: "Verify your email address".to_string(),
        body: format!(
            "Hi {},\n\n\
             Thanks for joining the club. Confirm your email address by opening the link below:\n\n\
             {}\n\n\
             The link expires in {} hours. If you did not sign up, you can ignore this message.\n",
            name, link, valid_hours
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_link() {
        let email = verification_email("http://localhost:3000/", "Asha", "asha@example.com", "abc123", 24);
        assert_eq!(email.to, "asha@example.com");
        assert!(email.body.contains("http://localhost:3000/verify-email?token=abc123"));
        assert!(email.body.contains("24 hours"));
    }

    #[tokio::test]
    async fn test_log_sender_accepts_mail() {
        let sender = LogEmailSender;
        let email = verification_email("http://localhost", "A", "a@example.com", "t", 1);
        assert!(sender.send(email).await.is_ok());
    }
}
