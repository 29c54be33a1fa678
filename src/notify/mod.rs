//! Outgoing messages to associates.
//!
//! Every channel is tried independently: one channel failing never stops
//! another from delivering, and the caller gets a per-channel report.

use std::fmt::{self, Display};

use rocket::futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::db::associate::AssociateCore;

mod mail;
mod message;
mod sns;

#[cfg(test)]
pub mod recording;

pub use mail::MailChannel;
pub use message::Message;
pub use sns::SnsChannel;

/// The kinds of channel we can reach an associate on.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Email, ChannelKind::Sms];
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
        })
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient has no address for this channel; nothing was attempted.
    #[error("associate has no {0} address")]
    NoAddress(ChannelKind),
    #[error("{0}")]
    Failed(String),
}

/// A way of delivering a [`Message`] to an associate.
#[rocket::async_trait]
pub trait Channel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn deliver(
        &self,
        recipient: &AssociateCore,
        message: &Message,
    ) -> Result<(), DeliveryError>;
}

/// Outcome of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDelivery {
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// Per-channel outcome of a dispatch, in the order the channels were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub deliveries: Vec<ChannelDelivery>,
}

impl DeliveryReport {
    pub fn any_delivered(&self) -> bool {
        self.deliveries
            .iter()
            .any(|d| d.status == DeliveryStatus::Delivered)
    }

    pub fn status(&self, channel: ChannelKind) -> Option<&DeliveryStatus> {
        self.deliveries
            .iter()
            .find(|d| d.channel == channel)
            .map(|d| &d.status)
    }
}

/// All configured channels, held in managed state.
pub struct Notifier {
    channels: Vec<Box<dyn Channel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Self {
        Self { channels }
    }

    /// Send `message` to `recipient` over each of the `wanted` channels
    /// concurrently. Never fails: problems are recorded in the report.
    pub async fn dispatch(
        &self,
        recipient: &AssociateCore,
        message: &Message,
        wanted: &[ChannelKind],
    ) -> DeliveryReport {
        let mut kinds: Vec<ChannelKind> = Vec::with_capacity(wanted.len());
        for kind in wanted {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }

        let attempts = kinds.iter().map(|kind| async move {
            let channel = self.channels.iter().find(|c| c.kind() == *kind);
            let status = match channel {
                None => DeliveryStatus::Skipped {
                    reason: format!("{kind} channel is not configured"),
                },
                Some(channel) => match channel.deliver(recipient, message).await {
                    Ok(()) => DeliveryStatus::Delivered,
                    Err(e @ DeliveryError::NoAddress(_)) => DeliveryStatus::Skipped {
                        reason: e.to_string(),
                    },
                    Err(DeliveryError::Failed(reason)) => {
                        warn!(
                            "Failed to deliver {} to {} over {kind}: {reason}",
                            message.describe(),
                            recipient.national_id
                        );
                        DeliveryStatus::Failed { reason }
                    }
                },
            };
            ChannelDelivery {
                channel: *kind,
                status,
            }
        });

        DeliveryReport {
            deliveries: join_all(attempts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{Outbox, RecordingChannel};
    use super::*;
    use crate::model::common::code::Code;

    fn code_message() -> Message {
        Message::VerificationCode {
            code: "0042".parse::<Code>().unwrap(),
            valid_minutes: 10,
        }
    }

    fn run<F: std::future::Future>(f: F) -> F::Output {
        rocket::tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn delivers_over_every_requested_channel() {
        let outbox = Outbox::default();
        let notifier = Notifier::new(vec![
            Box::new(RecordingChannel::new(ChannelKind::Email, outbox.clone())),
            Box::new(RecordingChannel::new(ChannelKind::Sms, outbox.clone())),
        ]);
        let recipient = AssociateCore::example();

        let report = run(notifier.dispatch(&recipient, &code_message(), &ChannelKind::ALL));

        assert!(report.any_delivered());
        assert_eq!(report.deliveries.len(), 2);
        assert_eq!(report.status(ChannelKind::Email), Some(&DeliveryStatus::Delivered));
        assert_eq!(report.status(ChannelKind::Sms), Some(&DeliveryStatus::Delivered));
        assert_eq!(outbox.sent().len(), 2);
        assert_eq!(
            outbox.last_code_for(&recipient.national_id),
            Some("0042".parse().unwrap())
        );
    }

    #[test]
    fn partial_failure_is_tolerated() {
        let outbox = Outbox::default();
        let notifier = Notifier::new(vec![
            Box::new(RecordingChannel::failing(ChannelKind::Email, outbox.clone())),
            Box::new(RecordingChannel::new(ChannelKind::Sms, outbox.clone())),
        ]);
        let recipient = AssociateCore::example();

        let report = run(notifier.dispatch(&recipient, &code_message(), &ChannelKind::ALL));

        assert!(report.any_delivered());
        assert!(matches!(
            report.status(ChannelKind::Email),
            Some(DeliveryStatus::Failed { .. })
        ));
        assert_eq!(report.status(ChannelKind::Sms), Some(&DeliveryStatus::Delivered));
    }

    #[test]
    fn missing_address_and_channel_are_skipped() {
        let outbox = Outbox::default();
        let notifier = Notifier::new(vec![Box::new(RecordingChannel::new(
            ChannelKind::Email,
            outbox.clone(),
        ))]);
        let mut recipient = AssociateCore::example();
        recipient.email = None;

        let report = run(notifier.dispatch(
            &recipient,
            &code_message(),
            &[ChannelKind::Email, ChannelKind::Sms, ChannelKind::Email],
        ));

        assert!(!report.any_delivered());
        assert_eq!(report.deliveries.len(), 2);
        assert!(matches!(
            report.status(ChannelKind::Email),
            Some(DeliveryStatus::Skipped { .. })
        ));
        assert!(matches!(
            report.status(ChannelKind::Sms),
            Some(DeliveryStatus::Skipped { .. })
        ));
        assert!(outbox.sent().is_empty());
    }
}
