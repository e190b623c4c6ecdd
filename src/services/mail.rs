use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Builds the account verification mail pointing at the front-end validation page.
pub fn verification_mail(frontend_url: &str, to: &str, token: &str) -> OutgoingMail {
    let link = format!("{}/validateEmail?token={}", frontend_url.trim_end_matches('/'), token);
    let year = chrono::Utc::now().format("%Y");
    let html = format!(
        r#"<html>
<head><title>Email Verification</title></head>
<body style="font-family: Arial, sans-serif; background-color: #f9f9f9; padding: 20px;">
  <table width="100%" cellpadding="0" cellspacing="0" border="0" style="max-width: 600px; margin: auto; background-color: #ffffff; padding: 30px; border-radius: 8px;">
    <tr><td style="text-align: center;"><h2 style="color: #333;">Bienvenue sur InfoDotGame</h2></td></tr>
    <tr><td style="padding: 20px 0; color: #555; font-size: 16px;">
      <p>Cher Utilisateur,</p>
      <p>Merci pour votre inscription. Afin de confirmer votre inscription, merci de valider votre email en cliquant sur le bouton ci-dessous.</p>
      <p style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background-color: #007bff; color: #fff; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">Vérifier Email</a>
      </p>
      <p>Si vous n'avez pas créé de compte, veuillez ne pas tenir compte de ce message.</p>
      <p>Merci,<br>L'équipe InfoDotGame</p>
    </td></tr>
    <tr><td style="text-align: center; font-size: 12px; color: #999; padding-top: 20px;">&copy; {year} InfoDotGame. All rights reserved.</td></tr>
  </table>
</body>
</html>"#
    );

    OutgoingMail { to: to.to_string(), subject: "Verify Your Email Address".to_string(), html }
}

/// Plain SMTP delivery (no TLS), e.g. to a local Mailpit on port 1025.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = cfg.from.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.smtp_host.as_str())
            .port(cfg.smtp_port)
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when `mail.enabled = false`: the message is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail delivery disabled, message dropped");
        Ok(())
    }
}
