use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::national_id::NationalId;
use crate::notify::{ChannelKind, DeliveryReport};

/// Body of `POST /verification/code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRequest {
    pub national_id: NationalId,
    /// Defaults to every channel.
    #[serde(default)]
    pub channels: Option<Vec<ChannelKind>>,
}

impl CodeRequest {
    pub fn channels(&self) -> Vec<ChannelKind> {
        match &self.channels {
            Some(channels) => channels.clone(),
            None => ChannelKind::ALL.to_vec(),
        }
    }
}

/// Response to a successful code request. The code itself is never echoed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeIssued {
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: DeliveryReport,
}

/// Body of `POST /verification/verify`.
///
/// The code is kept as a string so a malformed one gets the handler's own
/// error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub national_id: NationalId,
    pub code: String,
}

#[cfg(test)]
mod examples {
    use super::*;
    use crate::model::common::code::Code;

    impl CodeRequest {
        pub fn example() -> Self {
            Self {
                national_id: "123456".parse().unwrap(),
                channels: None,
            }
        }
    }

    impl VerifyRequest {
        pub fn example(code: Code) -> Self {
            Self {
                national_id: "123456".parse().unwrap(),
                code: code.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_default_to_all() {
        let request: CodeRequest =
            rocket::serde::json::serde_json::from_str(r#"{"national_id": "123456"}"#).unwrap();
        assert_eq!(request.channels(), vec![ChannelKind::Email, ChannelKind::Sms]);

        let request: CodeRequest = rocket::serde::json::serde_json::from_str(
            r#"{"national_id": "123456", "channels": ["sms"]}"#,
        )
        .unwrap();
        assert_eq!(request.channels(), vec![ChannelKind::Sms]);
    }
}
