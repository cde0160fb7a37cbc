//! OHLCV bar representation fed into the input series.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Bar time as unix seconds (midnight UTC of `date`), the value stored
    /// in the driving `T` series.
    pub fn timestamp(&self) -> f64 {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp() as f64)
            .unwrap_or(f64::NAN)
    }
}
