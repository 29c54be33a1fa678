use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

pub type HmacSha256 = Hmac<Sha256>;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 4;

/// A one-time verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code([u8; CODE_LENGTH]);

impl Code {
    /// Generate a random code, each digit uniform over `0..=9`.
    pub fn random() -> Self {
        let mut code = [0; CODE_LENGTH];
        let digit_dist = Uniform::from(0..=9);
        let mut rng = rand::thread_rng();
        for digit in &mut code {
            *digit = digit_dist.sample(&mut rng);
        }
        Self(code)
    }

    /// Keyed hash of the code, which is what gets stored.
    pub fn hmac(&self, secret: &[u8]) -> Vec<u8> {
        let mut hmac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        hmac.update(self.to_string().as_bytes());
        hmac.finalize().into_bytes().to_vec()
    }

    /// Constant-time comparison against a stored hash.
    pub fn matches(&self, secret: &[u8], stored_hmac: &[u8]) -> bool {
        let mut hmac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        hmac.update(self.to_string().as_bytes());
        hmac.verify_slice(stored_hmac).is_ok()
    }
}

impl Deref for Code {
    type Target = [u8; CODE_LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Code {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for digit in self.0 {
            write!(formatter, "{digit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("code must contain exactly 4 characters, got {0}")]
    InvalidLength(usize),
    #[error("code must contain only digits, found '{0}'")]
    InvalidChar(char),
}

impl FromStr for Code {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.chars().count();
        if len != CODE_LENGTH {
            return Err(ParseError::InvalidLength(len));
        }
        let mut code = [0; CODE_LENGTH];
        for (digit, c) in code.iter_mut().zip(string.chars()) {
            *digit = c
                .to_digit(10)
                .ok_or(ParseError::InvalidChar(c))? as u8;
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for Code {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}
