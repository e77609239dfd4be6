//! Analytics alert types.
//!
//! Alerts arrive one at a time on the `alerts` push channel and as a
//! newest-first batch from `GET /api/market/alerts`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of analytics signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Volume far above the rolling average.
    VolumeSpike,
    /// Price touched the ceiling or floor.
    PriceBreakout,
    /// Foreign net flow accelerated sharply.
    ForeignAcceleration,
    /// Futures basis flipped or diverged.
    BasisDivergence,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VolumeSpike => write!(f, "volume_spike"),
            Self::PriceBreakout => write!(f, "price_breakout"),
            Self::ForeignAcceleration => write!(f, "foreign_acceleration"),
            Self::BasisDivergence => write!(f, "basis_divergence"),
        }
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Worth attention.
    Warning,
    /// Highest tier; triggers the audible notification.
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One analytics alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: String,

    /// Signal kind.
    pub alert_type: AlertType,

    /// Severity tier.
    pub severity: AlertSeverity,

    /// Affected symbol.
    pub symbol: String,

    /// Human-readable message.
    pub message: String,

    /// Time the alert fired.
    pub timestamp: String,

    /// Signal-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Alert {
    /// Returns true if the alert is in the highest severity tier.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }
}

/// An alerts payload: a single pushed alert or a polled batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertPayload {
    /// Batch, newest first.
    Batch(Vec<Alert>),
    /// Single alert.
    Single(Alert),
}

impl AlertPayload {
    /// Returns the alerts carried by the payload, newest first.
    #[must_use]
    pub fn alerts(&self) -> &[Alert] {
        match self {
            Self::Batch(alerts) => alerts,
            Self::Single(alert) => std::slice::from_ref(alert),
        }
    }
}

impl From<Vec<Alert>> for AlertPayload {
    fn from(alerts: Vec<Alert>) -> Self {
        Self::Batch(alerts)
    }
}

impl From<Alert> for AlertPayload {
    fn from(alert: Alert) -> Self {
        Self::Single(alert)
    }
}

/// Filters alerts by type and severity; `None` matches everything.
#[must_use]
pub fn filter_alerts<'a>(
    alerts: impl IntoIterator<Item = &'a Alert>,
    alert_type: Option<AlertType>,
    severity: Option<AlertSeverity>,
) -> Vec<&'a Alert> {
    alerts
        .into_iter()
        .filter(|a| alert_type.map_or(true, |t| a.alert_type == t))
        .filter(|a| severity.map_or(true, |s| a.severity == s))
        .collect()
}
