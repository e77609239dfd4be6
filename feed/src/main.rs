//! Tickerboard monitor binary.
//!
//! Subscribes to the market, foreign and alerts channels with REST fallbacks
//! and logs live state until interrupted.

use std::time::Duration;

use chrono::Utc;
use tickerboard_feed::accumulate::{Candle, CandleBuilder};
use tickerboard_feed::views::{derivatives_view, foreign_flow_view, price_board_view};
use tickerboard_feed::{
    fetcher, AlertLog, Feed, FeedHub, FlowHistory, MonitorConfig, Poller, SparklineBook,
    TerminalBell,
};
use tickerboard_sdk::types::trading_date;
use tickerboard_sdk::{
    AlertPayload, Channel, ForeignSummary, MarketClient, MarketSession, MarketSnapshot,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tickerboard_feed=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env()?;
    config.validate()?;

    tracing::info!("Starting Tickerboard monitor");
    tracing::info!("API URL: {}", config.api_url);
    tracing::info!("Push URL: {}", config.ws_url);
    tracing::info!("Candle symbol: {}", config.symbol);

    let client = MarketClient::new(config.client_config())?;
    let hub = FeedHub::new(config.ws_config())?;

    let vn30 = match client.get_vn30_components().await {
        Ok(symbols) => symbols,
        Err(e) => {
            tracing::warn!("VN30 component list unavailable: {}", e);
            Vec::new()
        }
    };

    let mut candles = CandleBuilder::new(config.symbol.clone());
    let today = trading_date(Utc::now());
    match client.get_candles(&config.symbol, today, today).await {
        Ok(history) => candles.seed(history.iter().filter_map(Candle::from_stock)),
        Err(e) => tracing::debug!("No candle history for {}: {}", config.symbol, e),
    }

    let market_client = client.clone();
    let market = hub.subscribe::<MarketSnapshot>(
        Channel::Market,
        config
            .subscription_options(config.market_fallback_ms)
            .with_fallback(fetcher(move || {
                let client = market_client.clone();
                async move { client.get_snapshot().await }
            })),
    )?;
    let mut market = Feed::new(market, (SparklineBook::default(), candles));

    let foreign_client = client.clone();
    let foreign = hub.subscribe::<ForeignSummary>(
        Channel::Foreign,
        config
            .subscription_options(config.fallback_interval_ms)
            .with_fallback(fetcher(move || {
                let client = foreign_client.clone();
                async move { client.get_foreign_detail().await.map(|detail| detail.summary) }
            })),
    )?;
    let mut foreign = Feed::new(foreign, FlowHistory::default());

    let alerts_client = client.clone();
    let alerts = hub.subscribe::<AlertPayload>(
        Channel::Alerts,
        config
            .subscription_options(config.fallback_interval_ms)
            .with_fallback(fetcher(move || {
                let client = alerts_client.clone();
                async move { client.get_alerts(50).await.map(AlertPayload::Batch) }
            })),
    )?;
    let mut log = AlertLog::default().with_notifier(Box::new(TerminalBell::default()));
    log.set_sound_enabled(config.alert_sound);
    let mut alerts = Feed::new(alerts, log);

    let detail_client = client.clone();
    let detail = Poller::spawn(
        fetcher(move || {
            let client = detail_client.clone();
            async move { client.get_foreign_detail().await }
        }),
        config.detail_poll_interval(),
    );

    let trend_client = client.clone();
    let minutes = config.basis_trend_minutes;
    let trend = Poller::spawn(
        fetcher(move || {
            let client = trend_client.clone();
            async move { client.get_basis_trend(minutes).await }
        }),
        config.detail_poll_interval(),
    );

    tracing::info!("Monitor started");

    let mut report = tokio::time::interval(config.report_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            Some(snapshot) = market.next() => {
                tracing::trace!("Market snapshot with {} prices", snapshot.prices.len());
            }
            Some(summary) = foreign.next() => {
                tracing::debug!("Foreign net value: {:.0}", summary.total_net_value);
            }
            Some(payload) = alerts.next() => {
                for alert in payload.alerts() {
                    if alerts.accumulator().contains(&alert.id) {
                        tracing::info!(
                            "[{}] {} {}: {}",
                            alert.severity, alert.alert_type, alert.symbol, alert.message
                        );
                    }
                }
            }
            _ = report.tick() => {
                let market_state = market.subscription().state();
                let (sparklines, candles) = market.accumulator();
                let board = price_board_view(&market_state, &vn30, sparklines);
                let flow = foreign_flow_view(
                    &foreign.subscription().state(),
                    &detail.state(),
                    foreign.accumulator(),
                );
                let derivatives = derivatives_view(&market_state, &trend.state());

                tracing::info!(
                    "Session: {} | market: {} live={} rows={} | foreign: {} live={} net={:?} points={} | alerts: {} live={} retained={}",
                    MarketSession::at(Utc::now()),
                    board.status,
                    board.is_live,
                    board.rows.len(),
                    flow.status,
                    flow.is_live,
                    flow.summary.as_ref().map(|s| s.total_net_value),
                    flow.flow_history.len(),
                    alerts.subscription().status(),
                    alerts.subscription().is_live(),
                    alerts.accumulator().len(),
                );
                if let Some(contract) = derivatives.derivatives {
                    tracing::info!(
                        "{} {:.1} basis {:+.2} ({} trend points)",
                        contract.symbol,
                        contract.last_price,
                        contract.basis,
                        derivatives.basis_trend.len()
                    );
                }
                if let Some(candle) = candles.latest() {
                    tracing::debug!(
                        "{} candle O {:.1} H {:.1} L {:.1} C {:.1}",
                        candles.symbol(), candle.open, candle.high, candle.low, candle.close
                    );
                }
                if let Some(error) = board.error.or(flow.error).or(derivatives.error) {
                    tracing::warn!("Feed error: {}", error);
                }
                tracing::info!("Metrics: {}", hub.metrics().snapshot());
            }
        }
    }

    tracing::info!("Shutting down Tickerboard monitor");
    drop(detail);
    drop(trend);
    let (market, _) = market.into_parts();
    let (foreign, _) = foreign.into_parts();
    let (alerts, _) = alerts.into_parts();
    let closing = async {
        tokio::join!(market.close(), foreign.close(), alerts.close());
    };
    if tokio::time::timeout(Duration::from_secs(5), closing).await.is_err() {
        tracing::warn!("Subscriptions did not close in time");
    }

    tracing::info!("Final metrics: {}", hub.metrics().snapshot());
    Ok(())
}
