//! Session VWAP.
//!
//! VWAP[i] = sum(V[j] * TP[j] for j in 0..=i) / sum(V[j] for j in 0..=i)
//! where TP = (H + L + C) / 3. Accumulators reset at each session.
//! While cumulative volume is still zero the typical price stands in.

use crate::domain::bar::PriceBar;

pub fn calculate_vwap(bars: &[PriceBar]) -> Vec<f64> {
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    bars.iter()
        .map(|bar| {
            let tp = bar.typical_price();
            cum_pv += bar.volume * tp;
            cum_volume += bar.volume;
            if cum_volume > 0.0 {
                cum_pv / cum_volume
            } else {
                tp
            }
        })
        .collect()
}
