use crate::model::common::{code::Code, zone::Zone};

/// Everything we ever send to an associate, as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    VerificationCode { code: Code, valid_minutes: i64 },
    VoteConfirmation { candidate_name: String, zone: Zone },
}

impl Message {
    pub fn subject(&self) -> String {
        match self {
            Message::VerificationCode { .. } => "Your verification code".to_string(),
            Message::VoteConfirmation { .. } => "Your vote has been recorded".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Message::VerificationCode {
                code,
                valid_minutes,
            } => format!(
                "Your electoral verification code is {code}. \
                 It is valid for {valid_minutes} minutes and can only be used once."
            ),
            Message::VoteConfirmation {
                candidate_name,
                zone,
            } => format!(
                "Your vote for {candidate_name} in {zone} has been recorded. \
                 Thank you for taking part."
            ),
        }
    }

    /// Short label for logs. Never includes the code itself.
    pub fn describe(&self) -> &'static str {
        match self {
            Message::VerificationCode { .. } => "verification code",
            Message::VoteConfirmation { .. } => "vote confirmation",
        }
    }
}
