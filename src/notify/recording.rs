//! A channel that keeps what it sends, so tests can read verification codes.

use std::sync::{Arc, Mutex};

use super::{Channel, ChannelKind, DeliveryError, Message};
use crate::model::{
    common::{code::Code, national_id::NationalId},
    db::associate::AssociateCore,
};

#[derive(Debug, Clone)]
pub struct Sent {
    pub channel: ChannelKind,
    pub national_id: NationalId,
    pub message: Message,
}

/// Shared record of everything sent by the recording channels.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<Sent>>>);

impl Outbox {
    pub fn sent(&self) -> Vec<Sent> {
        self.0.lock().unwrap().clone()
    }

    /// The most recent verification code sent to this associate.
    pub fn last_code_for(&self, national_id: &NationalId) -> Option<Code> {
        self.sent()
            .into_iter()
            .rev()
            .filter(|sent| &sent.national_id == national_id)
            .find_map(|sent| match sent.message {
                Message::VerificationCode { code, .. } => Some(code),
                _ => None,
            })
    }
}

pub struct RecordingChannel {
    kind: ChannelKind,
    outbox: Outbox,
    fail: bool,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind, outbox: Outbox) -> Self {
        Self {
            kind,
            outbox,
            fail: false,
        }
    }

    /// A channel whose provider is always down.
    pub fn failing(kind: ChannelKind, outbox: Outbox) -> Self {
        Self {
            kind,
            outbox,
            fail: true,
        }
    }
}

#[rocket::async_trait]
impl Channel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn deliver(
        &self,
        recipient: &AssociateCore,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        let has_address = match self.kind {
            ChannelKind::Email => recipient.email.is_some(),
            ChannelKind::Sms => recipient.phone.is_some(),
        };
        if !has_address {
            return Err(DeliveryError::NoAddress(self.kind));
        }
        if self.fail {
            return Err(DeliveryError::Failed("provider unavailable".to_string()));
        }
        self.outbox.0.lock().unwrap().push(Sent {
            channel: self.kind,
            national_id: recipient.national_id.clone(),
            message: message.clone(),
        });
        Ok(())
    }
}
