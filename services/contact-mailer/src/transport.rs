//! SMTP Transport
//!
//! Builds the single mail transport used for the lifetime of the process,
//! either on a disposable Ethereal account or on the configured SMTP host.

use async_trait::async_trait;
use contact_relay_utils::{MailerConfig, RelayError, RelayResult, RuntimeMode};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::ethereal::{self, TestAccount, TestAccountProvider, ETHEREAL_SMTP_HOST, ETHEREAL_SMTP_PORT};
use crate::message::{build_message, OutgoingMail, SendReceipt};

/// Port on which SMTP is spoken over implicit TLS.
pub const SMTPS_PORT: u16 = 465;

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    /// Throwaway Ethereal account; sent messages can be previewed under
    /// `web_url`.
    Disposable { web_url: String },
    Configured,
}

/// Resolved SMTP connection parameters. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS. When false, STARTTLS is used if the server offers it.
    pub secure: bool,
    pub credentials: Option<SmtpCredentials>,
    pub verbose_logging: bool,
    pub account: AccountKind,
}

impl TransportConfig {
    pub fn disposable(account: TestAccount) -> Self {
        Self {
            host: ETHEREAL_SMTP_HOST.to_string(),
            port: ETHEREAL_SMTP_PORT,
            secure: false,
            credentials: Some(SmtpCredentials {
                user: account.user,
                pass: account.pass,
            }),
            verbose_logging: true,
            account: AccountKind::Disposable {
                web_url: account.web_url,
            },
        }
    }

    pub fn configured(mailer: &MailerConfig, mode: RuntimeMode) -> Self {
        Self {
            host: mailer.host.clone(),
            port: mailer.port,
            secure: mailer.port == SMTPS_PORT,
            credentials: mailer.username.as_ref().map(|user| SmtpCredentials {
                user: user.clone(),
                pass: mailer.password.clone().unwrap_or_default(),
            }),
            verbose_logging: !mode.is_production(),
            account: AccountKind::Configured,
        }
    }

    pub fn is_disposable(&self) -> bool {
        matches!(self.account, AccountKind::Disposable { .. })
    }
}

/// Pick and build the transport configuration for `mode`.
///
/// Outside deployment and test modes a disposable account is provisioned
/// through `provider`; a provisioning failure is returned as-is and is
/// meant to abort startup.
pub async fn create_transport(
    mode: RuntimeMode,
    mailer: &MailerConfig,
    provider: &dyn TestAccountProvider,
) -> RelayResult<TransportConfig> {
    if mode.uses_disposable_account() {
        let account = provider.create_test_account().await?;
        info!(user = %account.user, "Provisioned Ethereal test account");
        Ok(TransportConfig::disposable(account))
    } else {
        debug!(host = %mailer.host, port = mailer.port, %mode, "Using configured SMTP host");
        Ok(TransportConfig::configured(mailer, mode))
    }
}

/// Something that can deliver an [`OutgoingMail`].
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(&self, mail: &OutgoingMail) -> RelayResult<SendReceipt>;

    /// Connect and authenticate without sending anything.
    async fn verify(&self) -> RelayResult<()>;

    /// Link to a human-viewable copy of a sent message, when the transport
    /// offers one.
    fn preview_url(&self, _receipt: &SendReceipt) -> Option<String> {
        None
    }
}

/// `lettre` backed transport.
pub struct SmtpMailTransport {
    config: TransportConfig,
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: TransportConfig) -> RelayResult<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| RelayError::configuration(format!("Invalid SMTP relay: {}", e)))?
        } else {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| RelayError::configuration(format!("Invalid TLS parameters: {}", e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls))
        };

        let builder = builder.port(config.port);
        let builder = match &config.credentials {
            Some(creds) => builder.credentials(Credentials::new(creds.user.clone(), creds.pass.clone())),
            None => builder,
        };

        Ok(Self {
            inner: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> RelayResult<SendReceipt> {
        let message = build_message(mail)?;

        if self.config.verbose_logging {
            debug!(
                host = %self.config.host,
                port = self.config.port,
                from = %mail.from.email,
                to = %mail.to.email,
                message_id = %mail.message_id,
                "SMTP send"
            );
        }

        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| RelayError::dispatch(format!("SMTP send failed: {}", e)))?;

        let response = response_text(&response);
        if self.config.verbose_logging {
            debug!(response = %response, "SMTP response");
        }

        Ok(SendReceipt {
            message_id: mail.message_id.clone(),
            response,
        })
    }

    async fn verify(&self) -> RelayResult<()> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RelayError::transport_verification(format!(
                "{}:{} did not accept the connection test",
                self.config.host, self.config.port
            ))),
            Err(e) => Err(RelayError::transport_verification(e.to_string())),
        }
    }

    fn preview_url(&self, receipt: &SendReceipt) -> Option<String> {
        match &self.config.account {
            AccountKind::Disposable { web_url } => ethereal::preview_url(web_url, &receipt.response),
            AccountKind::Configured => None,
        }
    }
}

fn response_text(response: &Response) -> String {
    let lines: Vec<&str> = response.message().collect();
    format!("{} {}", response.code(), lines.join(" "))
}

/// Check the transport can connect and authenticate, logging the outcome.
/// Meant to be spawned; it never fails and never marks the transport
/// unusable.
pub async fn verify_transport(transport: Arc<dyn MailTransport>) {
    match transport.verify().await {
        Ok(()) => debug!("SMTP connection verified - server is ready to accept messages"),
        Err(e) => error!(error = %e, "SMTP connection verification failed"),
    }
}
