use aws_sdk_sns::Client as SnsClient;

use super::{Channel, ChannelKind, DeliveryError, Message};
use crate::model::db::associate::AssociateCore;

/// SMS delivery through Amazon SNS.
pub struct SnsChannel {
    client: SnsClient,
}

impl SnsChannel {
    pub fn new(client: SnsClient) -> Self {
        Self { client }
    }
}

#[rocket::async_trait]
impl Channel for SnsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(
        &self,
        recipient: &AssociateCore,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        let phone = recipient
            .phone
            .as_ref()
            .ok_or(DeliveryError::NoAddress(ChannelKind::Sms))?;

        self.client
            .publish()
            .phone_number(phone.to_string())
            .message(message.body())
            .send()
            .await
            .map_err(|e| DeliveryError::Failed(format!("SNS publish failed: {e}")))?;

        debug!("Sent {} by SMS to {}", message.describe(), recipient.national_id);
        Ok(())
    }
}
