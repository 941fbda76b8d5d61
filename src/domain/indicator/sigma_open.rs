//! Lagged per-minute dispersion from the open ("sigma_open").
//!
//! For minute-of-day slot m, sigma_open[d][m] is the mean of
//! |close / open - 1| at slot m over the previous `lookback` sessions that
//! contained slot m. The current session never contributes to its own value.

use crate::domain::bar::PriceBar;
use crate::domain::session::Session;
use std::collections::{HashMap, VecDeque};

/// |close / session_open - 1| for each bar.
pub fn move_from_open(bars: &[PriceBar]) -> Vec<f64> {
    let Some(open) = bars.first().map(|b| b.open) else {
        return Vec::new();
    };
    bars.iter().map(|b| (b.close / open - 1.0).abs()).collect()
}

/// Rolling per-slot history of move-from-open values.
#[derive(Debug, Clone)]
pub struct SigmaOpenTracker {
    lookback: usize,
    history: HashMap<u32, VecDeque<f64>>,
}

impl SigmaOpenTracker {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            history: HashMap::new(),
        }
    }

    /// Mean of the slot's window, once it holds `lookback` observations.
    pub fn estimate(&self, minute: u32) -> Option<f64> {
        let window = self.history.get(&minute)?;
        if self.lookback == 0 || window.len() < self.lookback {
            return None;
        }
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }

    pub fn observe(&mut self, minute: u32, value: f64) {
        let window = self.history.entry(minute).or_default();
        window.push_back(value);
        while window.len() > self.lookback {
            window.pop_front();
        }
    }
}

/// sigma_open for every bar of every session, aligned with `sessions`.
pub fn calculate_sigma_open(sessions: &[Session], lookback: usize) -> Vec<Vec<Option<f64>>> {
    let mut tracker = SigmaOpenTracker::new(lookback);

    sessions
        .iter()
        .map(|session| {
            let estimates: Vec<Option<f64>> = session
                .minutes_from_open
                .iter()
                .map(|&m| tracker.estimate(m))
                .collect();

            for (&m, mv) in session
                .minutes_from_open
                .iter()
                .zip(move_from_open(&session.bars))
            {
                tracker.observe(m, mv);
            }

            estimates
        })
        .collect()
}
