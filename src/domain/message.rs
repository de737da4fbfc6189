use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who sent a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Rider,
    Customer,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Rider => "rider",
            SenderType::Customer => "customer",
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rider" => Ok(SenderType::Rider),
            "customer" => Ok(SenderType::Customer),
            other => Err(format!("Unknown sender type: {}", other)),
        }
    }
}

/// One chat message between a rider and a customer. Append-only, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
    pub sender_type: SenderType,
    pub sender_id: String,
    pub text: String,
}

/// Payload for sending a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub order_id: String,
    pub sender_type: SenderType,
    pub sender_id: String,
    pub text: String,
}
