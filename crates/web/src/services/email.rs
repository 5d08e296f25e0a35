//! Email service for password reset messages.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

const RESET_SUBJECT: &str = "Password reset on Storekeep";

/// HTML body of the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    username: &'a str,
    reset_url: &'a str,
    valid_days: i64,
}

/// Plain text body of the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    username: &'a str,
    reset_url: &'a str,
    valid_days: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Mail a password reset link to one account holder.
    ///
    /// # Errors
    ///
    /// Returns error if a body fails to render, an address is malformed, or
    /// the relay rejects the message.
    pub async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        reset_url: &str,
        valid_days: i64,
    ) -> Result<(), EmailError> {
        let message = reset_message(&self.from_address, to, username, reset_url, valid_days)?;
        self.mailer.send(message).await?;

        tracing::info!(to = %to, "Password reset email sent");
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_owned()))
}

/// Build the reset email with plain text and HTML alternatives.
fn reset_message(
    from: &str,
    to: &str,
    username: &str,
    reset_url: &str,
    valid_days: i64,
) -> Result<Message, EmailError> {
    let text = PasswordResetEmailText {
        username,
        reset_url,
        valid_days,
    }
    .render()?;
    let html = PasswordResetEmailHtml {
        username,
        reset_url,
        valid_days,
    }
    .render()?;

    let body = MultiPart::alternative()
        .singlepart(SinglePart::plain(text))
        .singlepart(SinglePart::html(html));

    Ok(Message::builder()
        .from(mailbox(from)?)
        .to(mailbox(to)?)
        .subject(RESET_SUBJECT)
        .multipart(body)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.example.com/reset/Nw/abc/";

    #[test]
    fn test_reset_bodies_carry_link_and_expiry() {
        let text = PasswordResetEmailText {
            username: "peter",
            reset_url: URL,
            valid_days: 3,
        }
        .render()
        .unwrap();
        assert!(text.contains(URL));
        assert!(text.contains("peter"));

        let html = PasswordResetEmailHtml {
            username: "peter",
            reset_url: URL,
            valid_days: 3,
        }
        .render()
        .unwrap();
        assert!(html.contains(URL));
        assert!(html.contains("3 days"));
    }

    #[test]
    fn test_reset_message_headers() {
        let message = reset_message(
            "Storekeep <noreply@shop.example.com>",
            "peter@example.com",
            "peter",
            URL,
            3,
        )
        .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: peter@example.com"));
        assert!(raw.contains("Subject: Password reset on Storekeep"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_bad_recipient_is_rejected() {
        let result = reset_message("noreply@shop.example.com", "not an address", "peter", URL, 3);
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
