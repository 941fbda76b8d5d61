//! Regular-session grouping of raw minute bars.

use crate::domain::bar::PriceBar;
use crate::domain::error::BacktestError;
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;

/// 09:30 as minutes after midnight.
pub const SESSION_OPEN_MINUTE: u32 = 9 * 60 + 30;
/// 16:00 as minutes after midnight (exclusive end of the session).
pub const SESSION_CLOSE_MINUTE: u32 = 16 * 60;

/// Wall-clock time at which end-of-day liquidation is stamped.
pub fn session_close_time() -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(SESSION_CLOSE_MINUTE * 60, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Bars of one trading date, in time order.
#[derive(Debug, Clone)]
pub struct Session {
    pub date: NaiveDate,
    pub bars: Vec<PriceBar>,
    pub minutes_from_open: Vec<u32>,
}

impl Session {
    pub fn open_price(&self) -> Option<f64> {
        self.bars.first().map(|b| b.open)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

fn minute_of_day(bar: &PriceBar) -> u32 {
    bar.timestamp.time().num_seconds_from_midnight() / 60
}

/// Group bars by date, dropping anything outside [09:30, 16:00).
///
/// Sessions come back in ascending date order. `minutes_from_open` must
/// strictly increase, so repeated timestamps and distinct timestamps that
/// land in the same minute are both rejected.
pub fn group_sessions(mut bars: Vec<PriceBar>) -> Result<Vec<Session>, BacktestError> {
    bars.sort_by_key(|b| b.timestamp);

    let total = bars.len();
    let mut by_date: BTreeMap<NaiveDate, Session> = BTreeMap::new();

    for bar in bars {
        let minute = minute_of_day(&bar);
        if !(SESSION_OPEN_MINUTE..SESSION_CLOSE_MINUTE).contains(&minute) {
            continue;
        }
        let offset = minute - SESSION_OPEN_MINUTE;
        let date = bar.timestamp.date();
        let session = by_date.entry(date).or_insert_with(|| Session {
            date,
            bars: Vec::new(),
            minutes_from_open: Vec::new(),
        });
        if let Some(prev) = session.bars.last() {
            if prev.timestamp == bar.timestamp {
                return Err(BacktestError::DuplicateTimestamp {
                    timestamp: bar.timestamp,
                });
            }
            if minute_of_day(prev) == minute {
                return Err(BacktestError::MinuteCollision {
                    first: prev.timestamp,
                    second: bar.timestamp,
                });
            }
        }
        session.bars.push(bar);
        session.minutes_from_open.push(offset);
    }

    let kept: usize = by_date.values().map(|s| s.bars.len()).sum();
    if kept < total {
        tracing::warn!(
            dropped = total - kept,
            "dropped minute bars outside the regular session"
        );
    }

    Ok(by_date.into_values().collect())
}
