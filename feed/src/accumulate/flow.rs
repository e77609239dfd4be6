//! Cumulative foreign net-flow history for the current trading day.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tickerboard_sdk::types::trading_date;
use tickerboard_sdk::ForeignSummary;
use tracing::debug;

use super::Accumulate;

/// Default points retained.
pub const DEFAULT_FLOW_POINTS: usize = 300;

/// One point of the cumulative flow series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowPoint {
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// Cumulative net value at that time.
    pub net_value: f64,
}

/// Bounded flow series that resets when the exchange trading date changes.
#[derive(Debug, Clone)]
pub struct FlowHistory {
    capacity: usize,
    points: VecDeque<FlowPoint>,
    last_value: Option<f64>,
    session: Option<NaiveDate>,
}

impl Default for FlowHistory {
    fn default() -> Self {
        Self::new(DEFAULT_FLOW_POINTS)
    }
}

impl FlowHistory {
    /// Creates a history retaining at most `capacity` points.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: VecDeque::new(),
            last_value: None,
            session: None,
        }
    }

    /// Records a cumulative value observed at `now`.
    ///
    /// Returns true if a point was appended.
    pub fn record_at(&mut self, net_value: f64, now: DateTime<Utc>) -> bool {
        let date = trading_date(now);
        if self.session != Some(date) {
            if let Some(previous) = self.session {
                debug!(%previous, current = %date, "trading date changed, resetting flow history");
            }
            self.session = Some(date);
            self.points.clear();
            self.last_value = None;
        }

        if self.last_value == Some(net_value) {
            return false;
        }
        self.last_value = Some(net_value);

        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(FlowPoint {
            timestamp: now,
            net_value,
        });
        true
    }

    /// Returns the retained points, oldest first.
    #[must_use]
    pub fn points(&self) -> Vec<FlowPoint> {
        self.points.iter().copied().collect()
    }

    /// Returns the newest point.
    #[must_use]
    pub fn latest(&self) -> Option<&FlowPoint> {
        self.points.back()
    }

    /// Returns the trading date the series belongs to.
    #[must_use]
    pub fn session(&self) -> Option<NaiveDate> {
        self.session
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Accumulate<ForeignSummary> for FlowHistory {
    fn accumulate(&mut self, summary: &ForeignSummary) {
        self.record_at(summary.total_net_value, Utc::now());
    }
}
