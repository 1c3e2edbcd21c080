//! Outgoing message model and MIME assembly.

use contact_relay_utils::{RelayError, RelayResult};
use lettre::message::{
    header::ContentType, Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart,
};
use lettre::Message;
use uuid::Uuid;

use crate::upload::Attachment;

/// A fully resolved contact message, ready for a transport.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub message_id: String,
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl OutgoingMail {
    pub fn new(
        from: Mailbox,
        to: Mailbox,
        subject: impl Into<String>,
        text: impl Into<String>,
        attachment: Option<Attachment>,
    ) -> Self {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());
        Self {
            message_id,
            from,
            to,
            subject: subject.into(),
            text: text.into(),
            attachment,
        }
    }
}

/// What the transport reported for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
    pub response: String,
}

/// Build the RFC 5322 message. A single `text/plain` body without an
/// attachment, `multipart/mixed` with one.
pub fn build_message(mail: &OutgoingMail) -> RelayResult<Message> {
    let builder = Message::builder()
        .message_id(Some(mail.message_id.clone()))
        .from(mail.from.clone())
        .to(mail.to.clone())
        .subject(mail.subject.clone());

    let message = match &mail.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(attachment.content_type())
                .map_err(|e| RelayError::dispatch(format!("Invalid attachment type: {}", e)))?;

            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.text.clone()))
                    .singlepart(
                        MimeAttachment::new(attachment.filename.clone())
                            .body(attachment.content.clone(), content_type),
                    ),
            )
        }
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone()),
    };

    message.map_err(|e| RelayError::dispatch(format!("Failed to build email: {}", e)))
}
