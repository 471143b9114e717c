use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
const SMTP_IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProviderType,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProviderType {
    Smtp,
    SendGrid,
    Mock,
    None,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("smtp error: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    client: reqwest::Client,
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

#[derive(Serialize)]
struct SendGridPayload<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    subject: &'a str,
    content: Vec<SendGridContent<'a>>,
}

#[derive(Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            outbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_env() -> Self {
        let provider = match env_string("EMAIL_PROVIDER")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            Some("smtp") => EmailProviderType::Smtp,
            Some("sendgrid") => EmailProviderType::SendGrid,
            Some("mock") => EmailProviderType::Mock,
            _ => EmailProviderType::None,
        };

        Self::new(EmailConfig {
            provider,
            smtp_host: env_string("SMTP_HOST"),
            smtp_port: env_string("SMTP_PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(587),
            smtp_user: env_string("SMTP_USER"),
            smtp_password: env_string("SMTP_PASSWORD"),
            sendgrid_api_key: env_string("SENDGRID_API_KEY"),
            from_address: env_string("EMAIL_FROM")
                .unwrap_or_else(|| "noreply@lms.local".to_string()),
        })
    }

    /// Records every message in memory instead of delivering it.
    pub fn mock() -> Self {
        Self::new(EmailConfig {
            provider: EmailProviderType::Mock,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            sendgrid_api_key: None,
            from_address: "noreply@lms.local".to_string(),
        })
    }

    pub fn is_available(&self) -> bool {
        match self.config.provider {
            EmailProviderType::Smtp => {
                self.config.smtp_host.is_some() && self.config.smtp_user.is_some()
            }
            EmailProviderType::SendGrid => self.config.sendgrid_api_key.is_some(),
            EmailProviderType::Mock => true,
            EmailProviderType::None => false,
        }
    }

    pub fn provider_type(&self) -> EmailProviderType {
        self.config.provider
    }

    /// Messages captured by the mock provider, oldest first.
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.outbox.lock().clone()
    }

    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::debug!(
            to = %message.to,
            subject = %message.subject,
            provider = ?self.config.provider,
            "sending email"
        );

        match self.config.provider {
            EmailProviderType::SendGrid => self.send_via_sendgrid(&message).await,
            EmailProviderType::Smtp => self.send_via_smtp(message).await,
            EmailProviderType::Mock => {
                self.outbox.lock().push(message);
                Ok(())
            }
            EmailProviderType::None => Err(EmailError::NotConfigured("EMAIL_PROVIDER")),
        }
    }

    async fn send_via_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let api_key = self
            .config
            .sendgrid_api_key
            .as_deref()
            .ok_or(EmailError::NotConfigured("SENDGRID_API_KEY"))?;

        let payload = SendGridPayload {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress { email: &message.to }],
            }],
            from: SendGridAddress {
                email: &self.config.from_address,
            },
            subject: &message.subject,
            content: vec![SendGridContent {
                content_type: "text/plain",
                value: &message.body,
            }],
        };

        let resp = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailError::HttpStatus { status, body });
        }

        Ok(())
    }

    async fn send_via_smtp(&self, message: EmailMessage) -> Result<(), EmailError> {
        let credentials = SmtpCredentials {
            host: self
                .config
                .smtp_host
                .clone()
                .ok_or(EmailError::NotConfigured("SMTP_HOST"))?,
            port: self.config.smtp_port,
            user: self
                .config
                .smtp_user
                .clone()
                .ok_or(EmailError::NotConfigured("SMTP_USER"))?,
            password: self
                .config
                .smtp_password
                .clone()
                .ok_or(EmailError::NotConfigured("SMTP_PASSWORD"))?,
            from: self.config.from_address.clone(),
        };

        tokio::task::spawn_blocking(move || send_smtp_sync(&credentials, &message))
            .await
            .map_err(|e| EmailError::Smtp(e.to_string()))?
    }
}

struct SmtpCredentials {
    host: String,
    port: u16,
    user: String,
    password: String,
    from: String,
}

struct SmtpSession {
    stream: TcpStream,
    buf: [u8; 1024],
}

impl SmtpSession {
    fn read_reply(&mut self, expected: &[&str]) -> Result<String, EmailError> {
        let n = self
            .stream
            .read(&mut self.buf)
            .map_err(|e| EmailError::Smtp(e.to_string()))?;
        let reply = String::from_utf8_lossy(&self.buf[..n]).to_string();
        if expected.iter().any(|code| reply.starts_with(code)) {
            Ok(reply)
        } else {
            Err(EmailError::Smtp(reply.trim().to_string()))
        }
    }

    fn command(&mut self, line: &str, expected: &[&str]) -> Result<String, EmailError> {
        self.stream
            .write_all(format!("{line}\r\n").as_bytes())
            .map_err(|e| EmailError::Smtp(e.to_string()))?;
        self.read_reply(expected)
    }
}

fn send_smtp_sync(credentials: &SmtpCredentials, message: &EmailMessage) -> Result<(), EmailError> {
    let addr = format!("{}:{}", credentials.host, credentials.port);
    let stream = TcpStream::connect(&addr).map_err(|e| EmailError::Smtp(e.to_string()))?;
    stream.set_read_timeout(Some(SMTP_IO_TIMEOUT)).ok();
    stream.set_write_timeout(Some(SMTP_IO_TIMEOUT)).ok();

    let mut session = SmtpSession {
        stream,
        buf: [0u8; 1024],
    };
    let engine = base64::engine::general_purpose::STANDARD;

    session.read_reply(&["220"])?;
    session.command(&format!("EHLO {}", credentials.host), &["250"])?;
    session.command("AUTH LOGIN", &["334"])?;
    session.command(&engine.encode(&credentials.user), &["334"])?;
    session.command(&engine.encode(&credentials.password), &["235"])?;
    session.command(&format!("MAIL FROM:<{}>", credentials.from), &["250"])?;
    session.command(&format!("RCPT TO:<{}>", message.to), &["250", "251"])?;
    session.command("DATA", &["354"])?;

    let data = format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n{}\r\n.",
        credentials.from, message.to, message.subject, message.body
    );
    session.command(&data, &["250"])?;
    session.command("QUIT", &["221"])?;

    Ok(())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_provider_keeps_an_outbox() {
        let service = EmailService::mock();
        service.send(message("a@example.com")).await.unwrap();
        service.send(message("b@example.com")).await.unwrap();

        let sent = service.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.com");
        assert_eq!(sent[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn unconfigured_provider_fails() {
        let mut config = EmailService::mock().config;
        config.provider = EmailProviderType::None;
        let service = EmailService::new(config);

        assert!(!service.is_available());
        let err = service.send(message("a@example.com")).await.unwrap_err();
        assert!(matches!(err, EmailError::NotConfigured(_)));
    }
}
