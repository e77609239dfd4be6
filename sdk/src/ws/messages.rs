//! Push channel identifiers and frame decoding.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// `type` values of upstream control frames that carry no channel data.
const CONTROL_TYPES: &[&str] = &["status"];

/// Push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Full market snapshot.
    Market,
    /// Foreign investor summary.
    Foreign,
    /// Index levels.
    Index,
    /// Analytics alerts.
    Alerts,
}

impl Channel {
    /// All channels.
    pub const ALL: [Channel; 4] = [Self::Market, Self::Foreign, Self::Index, Self::Alerts];

    /// Returns the channel name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Foreign => "foreign",
            Self::Index => "index",
            Self::Alerts => "alerts",
        }
    }

    /// Returns the push endpoint path.
    #[must_use]
    pub const fn ws_path(&self) -> &'static str {
        match self {
            Self::Market => "/ws/market",
            Self::Foreign => "/ws/foreign",
            Self::Index => "/ws/index",
            Self::Alerts => "/ws/alerts",
        }
    }

    /// Returns the REST path (relative to the `/api` base) serving the same
    /// data while push is unavailable.
    ///
    /// `Foreign` is served wrapped in a detail response and `Index` as part of
    /// the full snapshot; callers project the relevant section.
    #[must_use]
    pub const fn rest_path(&self) -> &'static str {
        match self {
            Self::Market | Self::Index => "/market/snapshot",
            Self::Foreign => "/market/foreign-detail",
            Self::Alerts => "/market/alerts?limit=50",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(Self::Market),
            "foreign" => Ok(Self::Foreign),
            "index" => Ok(Self::Index),
            "alerts" => Ok(Self::Alerts),
            other => Err(SdkError::UnknownChannel(other.to_string())),
        }
    }
}

/// A data frame received on a push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

/// Result of decoding a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<T> {
    /// Channel data.
    Payload(T),
    /// Upstream control frame; carries no data.
    Control,
    /// Frame that is not channel data; never a protocol error.
    Ignored(SdkError),
}

/// Decodes a frame into channel data.
#[must_use]
pub fn decode<T: DeserializeOwned>(frame: &Frame) -> Inbound<T> {
    let text = match frame {
        Frame::Text(text) => text,
        Frame::Binary(bytes) => return Inbound::Ignored(SdkError::BinaryFrame(bytes.len())),
    };

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return Inbound::Ignored(SdkError::InvalidJson(e.to_string())),
    };

    if is_control(&value) {
        return Inbound::Control;
    }

    match serde_json::from_value(value) {
        Ok(payload) => Inbound::Payload(payload),
        Err(e) => Inbound::Ignored(SdkError::Deserialization(e.to_string())),
    }
}

fn is_control(value: &serde_json::Value) -> bool {
    value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|t| CONTROL_TYPES.contains(&t))
}
