use chrono::Days;

use super::model::Timestamped;

/// Shift samples forward by whole days wherever the recorded time goes
/// backwards, so that a time-of-day stream crossing midnight stays ordered.
///
/// Every backward step adds one day to that sample and all that follow it.
/// A stream crossing midnight twice therefore ends up shifted by two days.
/// Returns the number of rollovers applied.
pub fn correct_rollover<T: Timestamped>(samples: &mut [T]) -> u64 {
    let mut offset_days = 0u64;
    let mut prev_raw = None;

    for sample in samples.iter_mut() {
        let raw = sample.timestamp();
        if prev_raw.is_some_and(|prev| raw < prev) {
            offset_days += 1;
        }
        prev_raw = Some(raw);

        if offset_days > 0 {
            match raw.checked_add_days(Days::new(offset_days)) {
                Some(shifted) => sample.set_timestamp(shifted),
                None => log::warn!("rollover shift of {offset_days} days out of range at {raw}"),
            }
        }
    }

    if offset_days > 0 {
        log::debug!("applied {offset_days} midnight rollover(s)");
    }
    offset_days
}
