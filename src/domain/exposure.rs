//! Rebalance scheduling and one-bar lag.
//!
//! Only bars with `minutes_from_open % frequency == 0` may change the held
//! direction. A flat sample is an explicit flatten, not a hold. The held
//! sequence is then shifted one bar later so a decision taken on bar i's close
//! is first held on bar i + 1.

use crate::domain::signal::Signal;

/// Held direction after each bar; `None` means flat.
pub fn hold_on_schedule(
    raw_signal: &[Signal],
    minutes_from_open: &[u32],
    frequency: u32,
) -> Vec<Option<Signal>> {
    let frequency = frequency.max(1);
    raw_signal
        .iter()
        .zip(minutes_from_open)
        .scan(None, |held: &mut Option<Signal>, (&signal, &minute)| {
            if minute % frequency == 0 {
                *held = signal.direction();
            }
            Some(*held)
        })
        .collect()
}

/// Exposure per bar: the scheduled hold lagged by one bar, leading hole flat.
pub fn schedule_exposure(
    raw_signal: &[Signal],
    minutes_from_open: &[u32],
    frequency: u32,
) -> Vec<Signal> {
    let held = hold_on_schedule(raw_signal, minutes_from_open, frequency);
    std::iter::once(None)
        .chain(held)
        .take(raw_signal.len())
        .map(|h| h.unwrap_or(Signal::Flat))
        .collect()
}

/// Number of unit position changes across the day, starting flat and
/// ending with a flatten to zero. A reversal counts twice.
pub fn count_trades(exposure: &[Signal]) -> u32 {
    let mut prev = 0i8;
    let mut count = 0u32;
    for value in exposure.iter().map(|e| e.value()).chain(std::iter::once(0)) {
        count += (value - prev).unsigned_abs() as u32;
        prev = value;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signals(values: &[i8]) -> Vec<Signal> {
        values.iter().map(|&v| Signal::from_value(v)).collect()
    }

    fn values(exposure: &[Signal]) -> Vec<i8> {
        exposure.iter().map(|s| s.value()).collect()
    }

    #[test]
    fn every_bar_eligible_lags_by_one() {
        let raw = signals(&[0, 1, 0, 0, 0]);
        let minutes: Vec<u32> = (0..5).collect();
        assert_eq!(values(&schedule_exposure(&raw, &minutes, 1)), vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn ineligible_bars_keep_held_value() {
        let raw = signals(&[1, 0, 0, -1, -1, 0, 0]);
        let minutes: Vec<u32> = (0..7).collect();
        // samples at 0, 3, 6 -> held 1,1,1,-1,-1,-1,0 -> lag
        assert_eq!(
            values(&schedule_exposure(&raw, &minutes, 3)),
            vec![0, 1, 1, 1, -1, -1, -1]
        );
    }

    #[test]
    fn zero_sample_flattens() {
        let raw = signals(&[1, 1, 0, 1]);
        let minutes: Vec<u32> = vec![0, 1, 2, 3];
        // sample at 2 is flat, so bar 3 sees flat even though bar 1 was long
        assert_eq!(values(&schedule_exposure(&raw, &minutes, 2)), vec![0, 1, 1, 0]);
    }

    #[test]
    fn gaps_in_minutes_only_sample_on_multiples() {
        let raw = signals(&[1, -1, -1]);
        let minutes = vec![0, 29, 31];
        assert_eq!(values(&schedule_exposure(&raw, &minutes, 30)), vec![0, 1, 1]);
    }

    #[test]
    fn count_trades_includes_final_flatten() {
        assert_eq!(count_trades(&signals(&[0, 1, 1, 0])), 2);
        assert_eq!(count_trades(&signals(&[0, 1, 1, 1])), 2);
        assert_eq!(count_trades(&signals(&[0, 1, -1, -1])), 4);
        assert_eq!(count_trades(&signals(&[0, 0, 0])), 0);
    }

    #[test]
    fn empty_day() {
        assert!(schedule_exposure(&[], &[], 30).is_empty());
        assert_eq!(count_trades(&[]), 0);
    }

    proptest! {
        #[test]
        fn exposure_is_lagged_hold(
            raw in proptest::collection::vec(-1i8..=1, 1..120),
            frequency in 1u32..40,
        ) {
            let raw = signals(&raw);
            let minutes: Vec<u32> = (0..raw.len() as u32).collect();
            let exposure = schedule_exposure(&raw, &minutes, frequency);
            let held = hold_on_schedule(&raw, &minutes, frequency);

            prop_assert_eq!(exposure.len(), raw.len());
            prop_assert_eq!(exposure[0], Signal::Flat);
            for i in 1..raw.len() {
                prop_assert_eq!(exposure[i], held[i - 1].unwrap_or(Signal::Flat));
            }
        }

        #[test]
        fn unit_frequency_changes_only_after_signal(
            raw in proptest::collection::vec(-1i8..=1, 2..120),
        ) {
            let raw = signals(&raw);
            let minutes: Vec<u32> = (0..raw.len() as u32).collect();
            let exposure = schedule_exposure(&raw, &minutes, 1);
            for i in 1..raw.len() {
                prop_assert_eq!(exposure[i], raw[i - 1]);
            }
        }
    }
}
