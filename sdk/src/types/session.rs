//! HOSE trading-session clock.
//!
//! Sessions are derived from wall-clock time in the exchange time zone
//! (Asia/Ho_Chi_Minh, UTC+7, no daylight saving). Public holidays are not
//! modelled.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Timelike, Utc, Weekday};

/// Exchange offset from UTC in seconds.
pub const EXCHANGE_UTC_OFFSET_SECS: i32 = 7 * 3600;

const ATO_START: u32 = 9 * 60;
const ATO_END: u32 = 9 * 60 + 15;
const MORNING_END: u32 = 11 * 60 + 30;
const AFTERNOON_START: u32 = 13 * 60;
const AFTERNOON_END: u32 = 14 * 60 + 30;
const ATC_END: u32 = 14 * 60 + 45;
const PLO_END: u32 = 15 * 60;

/// Trading session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketSession {
    /// Before the opening auction.
    PreMarket,
    /// At-the-opening auction.
    Ato,
    /// Continuous matching.
    Continuous,
    /// Midday break.
    Lunch,
    /// At-the-close auction.
    Atc,
    /// Put-through / post-close lot session.
    Plo,
    /// Market closed.
    Closed,
}

impl MarketSession {
    /// Returns the session in effect at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        let local = now.with_timezone(&exchange_offset());
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return Self::Closed;
        }

        let mins = local.hour() * 60 + local.minute();
        match mins {
            m if m < ATO_START => Self::PreMarket,
            m if m < ATO_END => Self::Ato,
            m if m < MORNING_END => Self::Continuous,
            m if m < AFTERNOON_START => Self::Lunch,
            m if m < AFTERNOON_END => Self::Continuous,
            m if m < ATC_END => Self::Atc,
            m if m < PLO_END => Self::Plo,
            _ => Self::Closed,
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PreMarket => "Pre-market",
            Self::Ato => "ATO",
            Self::Continuous => "Continuous",
            Self::Lunch => "Lunch Break",
            Self::Atc => "ATC",
            Self::Plo => "PLO",
            Self::Closed => "Closed",
        }
    }

    /// Returns true while orders are being matched.
    #[must_use]
    pub const fn is_trading(&self) -> bool {
        matches!(self, Self::Ato | Self::Continuous | Self::Atc | Self::Plo)
    }
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns the exchange time zone.
#[must_use]
pub fn exchange_offset() -> FixedOffset {
    FixedOffset::east_opt(EXCHANGE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Returns the trading date at `now` in the exchange time zone.
#[must_use]
pub fn trading_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&exchange_offset()).date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // 2026-01-05 is a Monday.
    fn vn(h: u32, m: u32) -> DateTime<Utc> {
        exchange_offset()
            .with_ymd_and_hms(2026, 1, 5, h, m, 0)
            .single()
            .expect("valid time")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_session_boundaries() {
        assert_eq!(MarketSession::at(vn(8, 59)), MarketSession::PreMarket);
        assert_eq!(MarketSession::at(vn(9, 0)), MarketSession::Ato);
        assert_eq!(MarketSession::at(vn(9, 15)), MarketSession::Continuous);
        assert_eq!(MarketSession::at(vn(11, 30)), MarketSession::Lunch);
        assert_eq!(MarketSession::at(vn(13, 0)), MarketSession::Continuous);
        assert_eq!(MarketSession::at(vn(14, 30)), MarketSession::Atc);
        assert_eq!(MarketSession::at(vn(14, 45)), MarketSession::Plo);
        assert_eq!(MarketSession::at(vn(15, 0)), MarketSession::Closed);
    }

    #[test]
    fn test_weekend_closed() {
        let saturday = exchange_offset()
            .with_ymd_and_hms(2026, 1, 10, 10, 0, 0)
            .single()
            .expect("valid time")
            .with_timezone(&Utc);
        assert_eq!(MarketSession::at(saturday), MarketSession::Closed);
        assert!(!MarketSession::Closed.is_trading());
    }

    #[test]
    fn test_trading_date_uses_exchange_zone() {
        // 18:00 UTC on Jan 5 is already Jan 6 in Ho Chi Minh City.
        let late = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).single().expect("valid time");
        assert_eq!(
            trading_date(late),
            NaiveDate::from_ymd_opt(2026, 1, 6).expect("date")
        );
    }
}
