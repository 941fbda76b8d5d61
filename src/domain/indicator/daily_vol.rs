//! Trailing realized daily volatility used for position sizing.
//!
//! R[d] = C[d] / C[d-1] - 1 on session closes (R[0] undefined).
//! DVOL[d] = sample stddev of R[d-lookback-1 ..= d-2].
//! Undefined until every return in the window exists.

use crate::domain::session::Session;

/// Close-to-close return of each session; `None` for the first.
pub fn daily_returns(sessions: &[Session]) -> Vec<Option<f64>> {
    let closes: Vec<Option<f64>> = sessions.iter().map(Session::last_close).collect();

    (0..closes.len())
        .map(|d| {
            if d == 0 {
                return None;
            }
            match (closes[d - 1], closes[d]) {
                (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
                _ => None,
            }
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

pub fn calculate_daily_vol(returns: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..returns.len())
        .map(|d| {
            if lookback == 0 || d < lookback + 1 {
                return None;
            }
            let window: Option<Vec<f64>> =
                returns[d - lookback - 1..=d - 2].iter().copied().collect();
            window.and_then(|w| sample_stddev(&w))
        })
        .collect()
}
