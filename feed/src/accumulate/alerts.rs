//! Deduplicated, bounded alert log with an audible cue for critical alerts.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::io::{self, Write};

use tickerboard_sdk::types::filter_alerts;
use tickerboard_sdk::{Alert, AlertPayload, AlertSeverity, AlertType};
use tracing::{debug, info};

use super::Accumulate;

/// Default number of alerts retained.
pub const DEFAULT_MAX_ALERTS: usize = 200;

/// Plays a short audible cue.
pub trait Notifier: Send {
    /// Emits the cue. Failures are swallowed by implementations.
    fn notify(&mut self);
}

/// Rings the terminal bell on stderr.
///
/// The stream handle is acquired on first use.
#[derive(Debug, Default)]
pub struct TerminalBell {
    out: Option<io::Stderr>,
}

impl Notifier for TerminalBell {
    fn notify(&mut self) {
        let out = self.out.get_or_insert_with(io::stderr);
        let _ = out.write_all(b"\x07").and_then(|()| out.flush());
    }
}

/// Newest-first alert log, deduplicated by alert id.
///
/// The seen-set always equals the ids of the retained alerts, so an id that
/// has been evicted is admitted again if the backend resends it.
pub struct AlertLog {
    capacity: usize,
    alerts: VecDeque<Alert>,
    seen: HashSet<String>,
    sound_enabled: bool,
    notifier: Option<Box<dyn Notifier>>,
}

impl fmt::Debug for AlertLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertLog")
            .field("capacity", &self.capacity)
            .field("len", &self.alerts.len())
            .field("sound_enabled", &self.sound_enabled)
            .finish_non_exhaustive()
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ALERTS)
    }
}

impl AlertLog {
    /// Creates a log retaining at most `capacity` alerts, with sound off and
    /// no notifier attached.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            alerts: VecDeque::new(),
            seen: HashSet::new(),
            sound_enabled: false,
            notifier: None,
        }
    }

    /// Attaches the notifier used for critical alerts.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Enables or disables the audible cue.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Flips the audible cue and returns the new setting.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    /// Returns true if the audible cue is enabled.
    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Adds alerts not seen before and returns how many were admitted.
    ///
    /// Repeats within `incoming` are dropped as well. If any admitted alert
    /// is critical and sound is enabled, the notifier fires once.
    pub fn ingest(&mut self, incoming: &[Alert]) -> usize {
        let mut fresh = Vec::new();
        for alert in incoming {
            if self.seen.insert(alert.id.clone()) {
                fresh.push(alert.clone());
            }
        }
        if fresh.is_empty() {
            return 0;
        }

        let admitted = fresh.len();
        let critical = fresh.iter().any(Alert::is_critical);
        for alert in fresh.into_iter().rev() {
            self.alerts.push_front(alert);
        }
        self.alerts.truncate(self.capacity);
        self.seen = self.alerts.iter().map(|alert| alert.id.clone()).collect();
        debug!(admitted, retained = self.alerts.len(), "alerts ingested");

        if critical && self.sound_enabled {
            if let Some(notifier) = self.notifier.as_mut() {
                info!("critical alert received");
                notifier.notify();
            }
        }
        admitted
    }

    /// Returns alerts newest first.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Returns the newest alert.
    #[must_use]
    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    /// Returns alerts matching the optional type and severity, newest first.
    #[must_use]
    pub fn filtered(
        &self,
        alert_type: Option<AlertType>,
        severity: Option<AlertSeverity>,
    ) -> Vec<&Alert> {
        filter_alerts(self.alerts.iter(), alert_type, severity)
    }

    /// Returns true if an alert with this id is retained.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns the number of retained alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Returns true if no alerts are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Accumulate<AlertPayload> for AlertLog {
    fn accumulate(&mut self, payload: &AlertPayload) {
        self.ingest(payload.alerts());
    }
}
