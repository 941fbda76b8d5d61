//! Daily position sizing.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    /// One unit of leverage: equity / open.
    Fixed,
    /// Scale exposure by target_vol / daily_vol, capped at max leverage.
    VolTarget,
}

impl FromStr for SizingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(SizingMode::Fixed),
            "vol_target" | "voltarget" | "vol-target" => Ok(SizingMode::VolTarget),
            other => Err(format!(
                "unknown sizing mode '{other}' (expected 'fixed' or 'vol_target')"
            )),
        }
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMode::Fixed => write!(f, "fixed"),
            SizingMode::VolTarget => write!(f, "vol_target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingPolicy {
    pub mode: SizingMode,
    pub target_volatility: f64,
    pub max_leverage: f64,
}

impl SizingPolicy {
    /// Leverage multiplier applied to equity / open for the day.
    pub fn leverage(&self, daily_vol: Option<f64>) -> f64 {
        match self.mode {
            SizingMode::Fixed => 1.0,
            SizingMode::VolTarget => match daily_vol {
                Some(vol) if vol > 0.0 && vol.is_finite() => {
                    (self.target_volatility / vol).min(self.max_leverage)
                }
                _ => self.max_leverage,
            },
        }
    }

    /// Whole share count for the day; the side is applied by the simulator.
    ///
    /// Rounds half to even, then trims back inside `equity * max_leverage`
    /// if rounding overshot the cap.
    pub fn shares(&self, equity: f64, open_price: f64, daily_vol: Option<f64>) -> u64 {
        if equity <= 0.0 || open_price <= 0.0 || !equity.is_finite() || !open_price.is_finite() {
            return 0;
        }
        let raw = (equity / open_price * self.leverage(daily_vol)).round_ties_even();
        let cap = (equity * self.max_leverage / open_price).floor();
        let shares = if raw > cap { cap } else { raw };
        shares.max(0.0) as u64
    }
}
