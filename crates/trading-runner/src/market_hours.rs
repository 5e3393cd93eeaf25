//! Exchange trading-hours predicate.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;

/// Market hours configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketHoursConfig {
    /// IANA time zone of the exchange
    pub timezone: String,
    /// Session open, `HH:MM` local time
    pub open: String,
    /// Session close, `HH:MM` local time, inclusive
    pub close: String,
}

impl Default for MarketHoursConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            open: "09:30".to_string(),
            close: "16:00".to_string(),
        }
    }
}

/// Regular session: weekdays, `[open, close]` in exchange-local time.
///
/// Exchange holidays are not modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketHours {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl MarketHours {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Result<Self, TradingError> {
        if open >= close {
            return Err(TradingError::Config(format!(
                "market open {} must be before close {}",
                open, close
            )));
        }
        Ok(Self { tz, open, close })
    }

    /// US equities regular session.
    pub fn us_equities() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }

    pub fn from_config(config: &MarketHoursConfig) -> Result<Self, TradingError> {
        let tz: Tz = config.timezone.parse().map_err(|e| {
            TradingError::Config(format!("unknown time zone '{}': {}", config.timezone, e))
        })?;
        Self::new(tz, parse_time(&config.open)?, parse_time(&config.close)?)
    }

    /// Whether the session is open at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        self.open <= time && time <= self.close
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }
}

impl Default for MarketHours {
    fn default() -> Self {
        Self::us_equities()
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, TradingError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| TradingError::Config(format!("invalid time '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_weekday_session() {
        let hours = MarketHours::us_equities();
        // 2024-01-08 is a Monday
        assert!(hours.is_open(eastern(2024, 1, 8, 10, 0, 0)));
        assert!(!hours.is_open(eastern(2024, 1, 8, 8, 0, 0)));
        assert!(hours.is_open(eastern(2024, 1, 8, 9, 30, 0)));
        assert!(!hours.is_open(eastern(2024, 1, 8, 9, 29, 59)));
    }

    #[test]
    fn test_close_is_inclusive() {
        let hours = MarketHours::us_equities();
        assert!(hours.is_open(eastern(2024, 1, 8, 16, 0, 0)));
        assert!(!hours.is_open(eastern(2024, 1, 8, 16, 0, 1)));
    }

    #[test]
    fn test_weekend_closed() {
        let hours = MarketHours::us_equities();
        assert!(!hours.is_open(eastern(2024, 1, 6, 10, 0, 0)));
        assert!(!hours.is_open(eastern(2024, 1, 7, 12, 0, 0)));
    }

    #[test]
    fn test_uses_exchange_local_time() {
        let hours = MarketHours::us_equities();
        // 15:00 UTC is 10:00 EST in January, 11:00 EDT in July
        assert!(hours.is_open(Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap()));
        // 13:45 UTC is 08:45 EST but 09:45 EDT
        assert!(!hours.is_open(Utc.with_ymd_and_hms(2024, 1, 8, 13, 45, 0).unwrap()));
        assert!(hours.is_open(Utc.with_ymd_and_hms(2024, 7, 8, 13, 45, 0).unwrap()));
    }

    #[test]
    fn test_from_config() {
        let hours = MarketHours::from_config(&MarketHoursConfig::default()).unwrap();
        assert_eq!(hours, MarketHours::us_equities());

        let bad_tz = MarketHoursConfig {
            timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(MarketHours::from_config(&bad_tz).is_err());

        let inverted = MarketHoursConfig {
            open: "16:00".into(),
            close: "09:30".into(),
            ..Default::default()
        };
        assert!(MarketHours::from_config(&inverted).is_err());
    }
}
