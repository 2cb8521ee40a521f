//! Time-bucketed market keys
//!
//! Daily threshold events are keyed by their US Eastern resolution date,
//! e.g. `bitcoin-price-on-october-18`. After 12:01 ET the current day's event
//! is about to resolve, so the next day's event is targeted instead.

use chrono::{DateTime, Datelike, Days, Timelike, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Convert a UTC instant to US Eastern time, honoring daylight saving
pub fn eastern_time(now: DateTime<Utc>) -> DateTime<Tz> {
    now.with_timezone(&New_York)
}

/// Check if it is past 12:01 in US Eastern time
pub fn is_past_noon_et(now: DateTime<Utc>) -> bool {
    let et = eastern_time(now);
    et.hour() > 12 || (et.hour() == 12 && et.minute() >= 1)
}

/// Market key for the event to trade at `now`
pub fn market_key(prefix: &str, now: DateTime<Utc>) -> String {
    let et = eastern_time(now).date_naive();
    let target = if is_past_noon_et(now) {
        et.checked_add_days(Days::new(1)).unwrap_or(et)
    } else {
        et
    };

    let month = target.format("%B").to_string().to_lowercase();
    format!("{}-{}-{}", prefix, month, target.day())
}
