//! View models derived from subscription state, poller state and
//! accumulators.

use std::collections::HashMap;

use serde::Serialize;
use tickerboard_sdk::{
    BasisPoint, DerivativesData, ForeignDetailResponse, ForeignInvestorData, ForeignSummary,
    MarketSnapshot, PriceData, SessionStats,
};

use crate::accumulate::{Candle, FlowHistory, FlowPoint, SparklineBook};
use crate::error::FeedError;
use crate::poller::PollState;
use crate::subscription::{ChannelState, ConnectionStatus};

/// One row of the price board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBoardRow {
    /// Ticker symbol.
    pub symbol: String,
    /// Price and bands.
    pub price: PriceData,
    /// Session statistics, if the snapshot carries them.
    pub stats: Option<SessionStats>,
    /// Recent distinct prices, oldest first.
    pub sparkline: Vec<f64>,
}

/// Builds price-board rows for `symbols`, in that order.
///
/// Symbols without a traded price are omitted.
#[must_use]
pub fn price_board_rows(
    snapshot: &MarketSnapshot,
    symbols: &[String],
    sparklines: &SparklineBook,
) -> Vec<PriceBoardRow> {
    symbols
        .iter()
        .filter_map(|symbol| {
            let price = snapshot.price(symbol).filter(|price| price.has_price())?;
            Some(PriceBoardRow {
                symbol: symbol.clone(),
                price: price.clone(),
                stats: snapshot.quotes.get(symbol).cloned(),
                sparkline: sparklines.points(symbol),
            })
        })
        .collect()
}

/// Price board for the VN30 basket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBoardView {
    /// Rows in component order.
    pub rows: Vec<PriceBoardRow>,
    /// True until the first snapshot arrives while connecting.
    pub loading: bool,
    /// True iff values arrive over push.
    pub is_live: bool,
    /// Connection status.
    pub status: ConnectionStatus,
    /// Most recent error.
    #[serde(skip)]
    pub error: Option<FeedError>,
}

/// Builds the price board from the market channel.
#[must_use]
pub fn price_board_view(
    market: &ChannelState<MarketSnapshot>,
    symbols: &[String],
    sparklines: &SparklineBook,
) -> PriceBoardView {
    let rows = market
        .data
        .as_deref()
        .map(|snapshot| price_board_rows(snapshot, symbols, sparklines))
        .unwrap_or_default();
    PriceBoardView {
        rows,
        loading: market.status == ConnectionStatus::Connecting && market.data.is_none(),
        is_live: market.is_live,
        status: market.status,
        error: market.error.clone(),
    }
}

/// Foreign investor flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignFlowView {
    /// Market-wide aggregate, from push when available.
    pub summary: Option<ForeignSummary>,
    /// Per-symbol breakdown from the polled detail.
    pub stocks: Vec<ForeignInvestorData>,
    /// Cumulative net-value series for the session.
    pub flow_history: Vec<FlowPoint>,
    /// True while nothing has arrived from either source.
    pub loading: bool,
    /// True iff the summary arrives over push.
    pub is_live: bool,
    /// Connection status of the foreign channel.
    pub status: ConnectionStatus,
    /// First error from the channel, else from the detail poller.
    #[serde(skip)]
    pub error: Option<FeedError>,
}

/// Combines the foreign channel, the polled detail and the flow history.
#[must_use]
pub fn foreign_flow_view(
    live: &ChannelState<ForeignSummary>,
    detail: &PollState<ForeignDetailResponse>,
    history: &FlowHistory,
) -> ForeignFlowView {
    let summary = live
        .data
        .as_deref()
        .or_else(|| detail.data.as_deref().map(|d| &d.summary))
        .cloned();
    let stocks = detail
        .data
        .as_deref()
        .map(|d| d.stocks.clone())
        .unwrap_or_default();
    let loading = summary.is_none() && live.status == ConnectionStatus::Connecting && detail.loading;

    ForeignFlowView {
        summary,
        stocks,
        flow_history: history.points(),
        loading,
        is_live: live.is_live,
        status: live.status,
        error: live.error.clone().or_else(|| detail.error.clone()),
    }
}

/// Futures contract and basis trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivativesView {
    /// Contract state from the market channel.
    pub derivatives: Option<DerivativesData>,
    /// Polled basis trend, oldest first.
    pub basis_trend: Vec<BasisPoint>,
    /// True while nothing has arrived from either source.
    pub loading: bool,
    /// First error from the channel, else from the trend poller.
    #[serde(skip)]
    pub error: Option<FeedError>,
}

/// Combines the market channel with the polled basis trend.
#[must_use]
pub fn derivatives_view(
    market: &ChannelState<MarketSnapshot>,
    trend: &PollState<Vec<BasisPoint>>,
) -> DerivativesView {
    DerivativesView {
        derivatives: market
            .data
            .as_deref()
            .and_then(|snapshot| snapshot.derivatives.clone()),
        basis_trend: trend.data.as_deref().cloned().unwrap_or_default(),
        loading: market.data.is_none() && trend.data.is_none() && trend.loading,
        error: market.error.clone().or_else(|| trend.error.clone()),
    }
}

/// Futures close minus index close for one minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasisSample {
    /// Bucket start, unix seconds.
    pub time: i64,
    /// Basis in index points.
    pub value: f64,
}

/// Computes the basis for every minute present in both series.
#[must_use]
pub fn basis_series(futures: &[Candle], index: &[Candle]) -> Vec<BasisSample> {
    let index_close: HashMap<i64, f64> = index.iter().map(|c| (c.time, c.close)).collect();
    futures
        .iter()
        .filter_map(|candle| {
            index_close.get(&candle.time).map(|spot| BasisSample {
                time: candle.time,
                value: candle.close - spot,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn snapshot() -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::default();
        for (symbol, last_price) in [("FPT", 120.5), ("HPG", 0.0), ("VNM", 66.0), ("ABC", 9.0)] {
            snapshot.prices.insert(
                symbol.to_string(),
                PriceData {
                    last_price,
                    ..Default::default()
                },
            );
        }
        snapshot.quotes.insert(
            "FPT".to_string(),
            SessionStats {
                symbol: "FPT".to_string(),
                total_volume: 1_000,
                ..Default::default()
            },
        );
        snapshot
    }

    fn vn30() -> Vec<String> {
        ["VNM", "FPT", "HPG", "MWG"].iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_price_board_filters_to_traded_components() {
        let mut sparklines = SparklineBook::default();
        sparklines.record("FPT", 120.0);
        sparklines.record("FPT", 120.5);

        let rows = price_board_rows(&snapshot(), &vn30(), &sparklines);
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["VNM", "FPT"]);
        assert_eq!(rows[1].sparkline, vec![120.0, 120.5]);
        assert!(rows[1].stats.is_some());
        assert!(rows[0].stats.is_none());
    }

    #[test]
    fn test_price_board_loading_until_first_snapshot() {
        let state = ChannelState::<MarketSnapshot>::default();
        let view = price_board_view(&state, &vn30(), &SparklineBook::default());
        assert!(view.loading);
        assert!(view.rows.is_empty());

        let state = ChannelState {
            data: Some(Arc::new(snapshot())),
            status: ConnectionStatus::Connected,
            is_live: true,
            ..Default::default()
        };
        let view = price_board_view(&state, &vn30(), &SparklineBook::default());
        assert!(!view.loading);
        assert_eq!(view.rows.len(), 2);
    }

    #[test]
    fn test_foreign_flow_prefers_push_summary() {
        let pushed = ForeignSummary {
            total_net_value: 5.0,
            ..Default::default()
        };
        let polled = ForeignDetailResponse {
            summary: ForeignSummary {
                total_net_value: 1.0,
                ..Default::default()
            },
            stocks: vec![ForeignInvestorData {
                symbol: "FPT".to_string(),
                ..Default::default()
            }],
        };
        let detail = PollState {
            data: Some(Arc::new(polled)),
            loading: false,
            error: Some(FeedError::Fetch("timeout".to_string())),
        };

        let without_push = ChannelState::<ForeignSummary>::default();
        let view = foreign_flow_view(&without_push, &detail, &FlowHistory::default());
        assert_eq!(view.summary.as_ref().map(|s| s.total_net_value), Some(1.0));
        assert_eq!(view.stocks.len(), 1);
        assert!(!view.loading);
        assert_eq!(view.error, Some(FeedError::Fetch("timeout".to_string())));

        let with_push = ChannelState {
            data: Some(Arc::new(pushed)),
            status: ConnectionStatus::Connected,
            error: Some(FeedError::Closed),
            ..Default::default()
        };
        let view = foreign_flow_view(&with_push, &detail, &FlowHistory::default());
        assert_eq!(view.summary.as_ref().map(|s| s.total_net_value), Some(5.0));
        assert_eq!(view.error, Some(FeedError::Closed));
    }

    #[test]
    fn test_foreign_flow_loading() {
        let view = foreign_flow_view(
            &ChannelState::default(),
            &PollState::default(),
            &FlowHistory::default(),
        );
        assert!(view.loading);
        assert!(view.summary.is_none());
    }

    #[test]
    fn test_derivatives_view() {
        let mut snap = snapshot();
        snap.derivatives = Some(DerivativesData {
            symbol: "VN30F1M".to_string(),
            last_price: 1_300.0,
            basis: 4.5,
            ..Default::default()
        });
        let market = ChannelState {
            data: Some(Arc::new(snap)),
            ..Default::default()
        };
        let trend = PollState::<Vec<BasisPoint>>::default();

        let view = derivatives_view(&market, &trend);
        assert_eq!(view.derivatives.map(|d| d.basis), Some(4.5));
        assert!(view.basis_trend.is_empty());
        assert!(!view.loading);
    }

    #[test]
    fn test_basis_series_matches_minutes() {
        let candle = |time: i64, close: f64| Candle {
            time,
            open: close,
            high: close,
            low: close,
            close,
        };
        let futures = vec![candle(60, 1_305.0), candle(120, 1_306.0), candle(180, 1_307.0)];
        let index = vec![candle(60, 1_300.0), candle(180, 1_301.0)];

        let basis = basis_series(&futures, &index);
        assert_eq!(
            basis,
            vec![
                BasisSample { time: 60, value: 5.0 },
                BasisSample { time: 180, value: 6.0 },
            ]
        );
    }
}
