use serde::Serialize;

use super::{Channel, ChannelKind, DeliveryError, Message};
use crate::model::db::associate::AssociateCore;

/// Email delivery through a transactional mail HTTP API that accepts a JSON
/// message and a bearer token.
pub struct MailChannel {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: String,
}

/// Request body understood by the mail API.
#[derive(Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

impl MailChannel {
    pub fn new(http: reqwest::Client, api_url: String, api_key: String, sender: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            sender,
        }
    }
}

#[rocket::async_trait]
impl Channel for MailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(
        &self,
        recipient: &AssociateCore,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        let to = recipient
            .email
            .as_deref()
            .ok_or(DeliveryError::NoAddress(ChannelKind::Email))?;

        let mail = OutgoingMail {
            from: &self.sender,
            to,
            subject: message.subject(),
            text: message.body(),
        };

        self.http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&mail)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DeliveryError::Failed(format!("mail API request failed: {e}")))?;

        debug!("Sent {} by email to {}", message.describe(), recipient.national_id);
        Ok(())
    }
}
