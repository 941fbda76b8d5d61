//! Noise-band breakout signals.
//!
//! UB[i] = max(open, prev_close_adj) * (1 + band_mult * sigma_open[i])
//! LB[i] = min(open, prev_close_adj) * (1 - band_mult * sigma_open[i])
//! Long when the close clears UB and VWAP, short when it breaks LB and VWAP.

use crate::domain::indicator::TradingDay;
use std::fmt;

/// Ternary trade direction used for raw signals and exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    pub fn from_value(v: i8) -> Self {
        match v.signum() {
            1 => Signal::Long,
            -1 => Signal::Short,
            _ => Signal::Flat,
        }
    }

    /// `None` for flat, so a held direction can be folded as an `Option`.
    pub fn direction(self) -> Option<Signal> {
        match self {
            Signal::Flat => None,
            other => Some(other),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Band and raw-signal arrays aligned with a day's bars.
///
/// Bands are `None` on bars without a `sigma_open` estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySignals {
    pub upper_band: Vec<Option<f64>>,
    pub lower_band: Vec<Option<f64>>,
    pub raw_signal: Vec<Signal>,
}

impl DaySignals {
    pub fn len(&self) -> usize {
        self.raw_signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_signal.is_empty()
    }
}

pub fn bar_signal(close: f64, vwap: f64, upper: Option<f64>, lower: Option<f64>) -> Signal {
    match (upper, lower) {
        (Some(ub), _) if close > ub && close > vwap => Signal::Long,
        (_, Some(lb)) if close < lb && close < vwap => Signal::Short,
        _ => Signal::Flat,
    }
}

/// Bands and signals for one day.
///
/// Returns `None` when no bar has a `sigma_open` estimate (warm-up day).
pub fn generate_signals(
    day: &TradingDay,
    prev_close_adj: f64,
    band_multiplier: f64,
) -> Option<DaySignals> {
    if !day.has_sigma_open() {
        return None;
    }
    let open = day.open_price()?;
    let band_top = open.max(prev_close_adj);
    let band_bottom = open.min(prev_close_adj);

    let mut signals = DaySignals {
        upper_band: Vec::with_capacity(day.bars.len()),
        lower_band: Vec::with_capacity(day.bars.len()),
        raw_signal: Vec::with_capacity(day.bars.len()),
    };

    for bar in &day.bars {
        let upper = bar
            .sigma_open
            .map(|s| band_top * (1.0 + band_multiplier * s));
        let lower = bar
            .sigma_open
            .map(|s| band_bottom * (1.0 - band_multiplier * s));
        signals.upper_band.push(upper);
        signals.lower_band.push(lower);
        signals
            .raw_signal
            .push(bar_signal(bar.close, bar.vwap, upper, lower));
    }

    Some(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::MinuteBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_day(open: f64, closes: &[f64], vwap: f64, sigma: Option<f64>) -> TradingDay {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let start = date.and_hms_opt(9, 30, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| MinuteBar {
                day: date,
                timestamp: start + chrono::Duration::minutes(i as i64),
                open: if i == 0 { open } else { close },
                high: close,
                low: close,
                close,
                volume: 1000.0,
                vwap,
                sigma_open: sigma,
                daily_vol: None,
                dividend: 0.0,
                minutes_from_open: i as u32,
            })
            .collect();
        TradingDay { date, bars }
    }

    #[test]
    fn bands_use_open_and_adjusted_previous_close() {
        let day = make_day(100.0, &[100.0, 101.5, 99.0, 99.4, 99.4], 99.5, Some(0.01));
        let signals = generate_signals(&day, 99.0, 1.0).unwrap();

        for i in 0..signals.len() {
            assert_relative_eq!(signals.upper_band[i].unwrap(), 101.0, epsilon = 1e-9);
            assert_relative_eq!(signals.lower_band[i].unwrap(), 98.01, epsilon = 1e-9);
        }
        let raw: Vec<i8> = signals.raw_signal.iter().map(|s| s.value()).collect();
        assert_eq!(raw, vec![0, 1, 0, 0, 0]);
    }

    #[test]
    fn short_requires_lower_band_and_vwap() {
        let day = make_day(100.0, &[97.0, 97.0], 96.0, Some(0.01));
        let signals = generate_signals(&day, 100.0, 1.0).unwrap();
        // below LB (99) but above VWAP
        assert_eq!(signals.raw_signal[0], Signal::Flat);

        let day = make_day(100.0, &[97.0], 98.0, Some(0.01));
        let signals = generate_signals(&day, 100.0, 1.0).unwrap();
        assert_eq!(signals.raw_signal[0], Signal::Short);
    }

    #[test]
    fn band_multiplier_widens_bands() {
        let day = make_day(100.0, &[102.5], 100.0, Some(0.01));
        let narrow = generate_signals(&day, 100.0, 1.0).unwrap();
        let wide = generate_signals(&day, 100.0, 3.0).unwrap();
        assert_eq!(narrow.raw_signal[0], Signal::Long);
        assert_eq!(wide.raw_signal[0], Signal::Flat);
    }

    #[test]
    fn day_without_sigma_open_yields_nothing() {
        let day = make_day(100.0, &[100.0, 105.0], 100.0, None);
        assert!(generate_signals(&day, 100.0, 1.0).is_none());
    }

    #[test]
    fn partially_undefined_sigma_is_flat() {
        let mut day = make_day(100.0, &[110.0, 110.0], 100.0, Some(0.01));
        day.bars[0].sigma_open = None;
        let signals = generate_signals(&day, 100.0, 1.0).unwrap();
        assert_eq!(signals.upper_band[0], None);
        assert_eq!(signals.raw_signal[0], Signal::Flat);
        assert_eq!(signals.raw_signal[1], Signal::Long);
    }

    #[test]
    fn signal_value_round_trip() {
        for v in [-1i8, 0, 1] {
            assert_eq!(Signal::from_value(v).value(), v);
        }
        assert_eq!(Signal::Flat.direction(), None);
        assert_eq!(Signal::Long.direction(), Some(Signal::Long));
    }
}
