//! Transactional email for resets, invitations, and issued credentials.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
    otp: &'a str,
}

/// Plain text template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_url: &'a str,
    otp: &'a str,
}

/// HTML template for the invitation email.
#[derive(Template)]
#[template(path = "email/invitation.html")]
struct InvitationEmailHtml<'a> {
    name: &'a str,
    vendor_name: &'a str,
    setup_url: &'a str,
}

/// Plain text template for the invitation email.
#[derive(Template)]
#[template(path = "email/invitation.txt")]
struct InvitationEmailText<'a> {
    name: &'a str,
    vendor_name: &'a str,
    setup_url: &'a str,
}

/// HTML template for the vendor-welcome email with issued credentials.
#[derive(Template)]
#[template(path = "email/vendor_welcome.html")]
struct VendorWelcomeEmailHtml<'a> {
    vendor_name: &'a str,
    username: &'a str,
    password: &'a str,
    login_url: &'a str,
}

/// Plain text template for the vendor-welcome email.
#[derive(Template)]
#[template(path = "email/vendor_welcome.txt")]
struct VendorWelcomeEmailText<'a> {
    vendor_name: &'a str,
    username: &'a str,
    password: &'a str,
    login_url: &'a str,
}

/// HTML template for directly created user credentials.
#[derive(Template)]
#[template(path = "email/user_credentials.html")]
struct UserCredentialsEmailHtml<'a> {
    name: &'a str,
    username: &'a str,
    password: &'a str,
    login_url: &'a str,
}

/// Plain text template for directly created user credentials.
#[derive(Template)]
#[template(path = "email/user_credentials.txt")]
struct UserCredentialsEmailText<'a> {
    name: &'a str,
    username: &'a str,
    password: &'a str,
    login_url: &'a str,
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
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP connection fails.
    pub fn new(config: &EmailConfig, base_url: String) -> Result<Self, SmtpError> {
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
            base_url,
        })
    }

    /// Send a password-reset email carrying the signed link and the OTP.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        token: &str,
        otp: &str,
    ) -> Result<(), EmailError> {
        let reset_url = format!("{}/reset-password?token={token}", self.base_url);
        let html = PasswordResetEmailHtml {
            name,
            reset_url: &reset_url,
            otp,
        }
        .render()?;
        let text = PasswordResetEmailText {
            name,
            reset_url: &reset_url,
            otp,
        }
        .render()?;

        self.send_multipart_email(to, "Reset your CourierHub password", &text, &html)
            .await
    }

    /// Send an invitation email with the account-setup link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_invitation(
        &self,
        to: &str,
        name: &str,
        vendor_name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let setup_url = format!("{}/account-setup?token={token}", self.base_url);
        let html = InvitationEmailHtml {
            name,
            vendor_name,
            setup_url: &setup_url,
        }
        .render()?;
        let text = InvitationEmailText {
            name,
            vendor_name,
            setup_url: &setup_url,
        }
        .render()?;

        self.send_multipart_email(to, "You've been invited to CourierHub", &text, &html)
            .await
    }

    /// Send a vendor-welcome email carrying the issued login credentials.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_vendor_welcome(
        &self,
        to: &str,
        vendor_name: &str,
        username: &str,
        password: &str,
    ) -> Result<(), EmailError> {
        let login_url = format!("{}/login", self.base_url);
        let html = VendorWelcomeEmailHtml {
            vendor_name,
            username,
            password,
            login_url: &login_url,
        }
        .render()?;
        let text = VendorWelcomeEmailText {
            vendor_name,
            username,
            password,
            login_url: &login_url,
        }
        .render()?;

        self.send_multipart_email(to, "Welcome to CourierHub", &text, &html)
            .await
    }

    /// Send issued credentials to a directly created user.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_user_credentials(
        &self,
        to: &str,
        name: &str,
        username: &str,
        password: &str,
    ) -> Result<(), EmailError> {
        let login_url = format!("{}/login", self.base_url);
        let html = UserCredentialsEmailHtml {
            name,
            username,
            password,
            login_url: &login_url,
        }
        .render()?;
        let text = UserCredentialsEmailText {
            name,
            username,
            password,
            login_url: &login_url,
        }
        .render()?;

        self.send_multipart_email(to, "Your CourierHub account", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%&*";
const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Generate a random initial password for issued accounts.
#[must_use]
pub fn generate_password() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..GENERATED_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
    }

    #[test]
    fn test_generate_password_charset() {
        for _ in 0..100 {
            let password = generate_password();
            assert!(
                password
                    .bytes()
                    .all(|b| PASSWORD_CHARSET.contains(&b))
            );
        }
    }

    #[test]
    fn test_generate_password_varies() {
        let a = generate_password();
        let b = generate_password();
        // Two 12-char random draws colliding means the RNG is broken.
        assert_ne!(a, b);
    }
}
