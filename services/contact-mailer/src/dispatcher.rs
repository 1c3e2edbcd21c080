//! Mail Dispatcher
//!
//! Turns a contact submission into an [`OutgoingMail`] and delivers it in the
//! background. Delivery is at-most-effort: the caller gets a join handle it is
//! free to drop, and failures only surface in the logs.

use contact_relay_utils::{MailConfig, RelayError, RelayResult, RuntimeMode};
use lettre::message::Mailbox;
use lettre::Address;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};

use crate::message::{OutgoingMail, SendReceipt};
use crate::transport::MailTransport;
use crate::upload::Attachment;

pub const PLACEHOLDER_FROM: &str = "from@example.com";
pub const PLACEHOLDER_TO: &str = "to@example.com";

/// One contact-form submission. Lives for a single request.
#[derive(Debug, Clone, Default)]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl ContactSubmission {
    /// `"{first} {last}"`, or `None` when both are blank.
    pub fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Sent(SendReceipt),
    Failed(String),
}

impl DispatchResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Effective sender/recipient addresses for the process.
///
/// Configured addresses are only honoured in deployment and test modes;
/// everywhere else, and whenever a value is missing, placeholders are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddresses {
    pub from: Address,
    pub to: Address,
}

impl MailAddresses {
    pub fn resolve(mode: RuntimeMode, config: &MailConfig) -> RelayResult<Self> {
        let use_configured = mode.is_deployment_mode() || mode.is_test_mode();

        Ok(Self {
            from: pick_address(use_configured, config.from.as_deref(), PLACEHOLDER_FROM, "MAIL_FROM")?,
            to: pick_address(use_configured, config.to.as_deref(), PLACEHOLDER_TO, "MAIL_TO")?,
        })
    }
}

fn pick_address(
    use_configured: bool,
    configured: Option<&str>,
    placeholder: &str,
    var: &str,
) -> RelayResult<Address> {
    let raw = match configured {
        Some(value) if use_configured && !value.is_empty() => value,
        _ => placeholder,
    };
    raw.parse::<Address>().map_err(|e| {
        RelayError::configuration(format!("{} is not a valid address ({}): {}", var, raw, e))
    })
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    addresses: MailAddresses,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, addresses: MailAddresses) -> Self {
        Self {
            transport,
            addresses,
        }
    }

    pub fn compose(&self, submission: ContactSubmission) -> OutgoingMail {
        let from = Mailbox::new(submission.display_name(), self.addresses.from.clone());
        let to = Mailbox::new(None, self.addresses.to.clone());

        OutgoingMail::new(
            from,
            to,
            submission.subject,
            submission.body,
            submission.attachment,
        )
    }

    /// Spawn delivery of `submission` and return immediately.
    pub fn dispatch(&self, submission: ContactSubmission) -> JoinHandle<DispatchResult> {
        let mail = self.compose(submission);
        let transport = Arc::clone(&self.transport);
        let span = tracing::info_span!("dispatch", message_id = %mail.message_id);

        tokio::spawn(async move { deliver(transport.as_ref(), &mail).await }.instrument(span))
    }
}

/// Send `mail` and log the outcome.
pub async fn deliver(transport: &dyn MailTransport, mail: &OutgoingMail) -> DispatchResult {
    match transport.send(mail).await {
        Ok(receipt) => {
            info!("Message sent: {} - {}", receipt.message_id, receipt.response);
            if let Some(url) = transport.preview_url(&receipt) {
                info!("Preview URL: {}", url);
            }
            DispatchResult::Sent(receipt)
        }
        Err(e) => {
            error!(error = %e, "Failed to send contact message");
            DispatchResult::Failed(e.to_string())
        }
    }
}
