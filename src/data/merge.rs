use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use super::model::{Field, Instant, MergedSample, NormalizedSample, SensorFields};

/// Default pairing window between distal and proximal samples.
pub const DEFAULT_TOLERANCE_SECS: f64 = 45.0;

/// Widest pairing window accepted from settings: one day.
pub const MAX_TOLERANCE_SECS: f64 = 86_400.0;

/// Absolute time difference in seconds (millisecond resolution).
pub fn delta_secs(a: Instant, b: Instant) -> f64 {
    (a - b).num_milliseconds().abs() as f64 / 1000.0
}

/// Distal minus proximal skin temperature, when both are present.
pub fn differential(distal: &SensorFields, proximal: &SensorFields) -> Option<f64> {
    Some(distal[Field::SkinTemp]? - proximal[Field::SkinTemp]?)
}

/// Join each primary (distal) sample with the nearest not-yet-used
/// secondary (proximal) sample no further than `tolerance_secs` away.
///
/// Pairing is greedy in primary order: an earlier primary sample claims its
/// nearest secondary sample even if a later one would be closer to it. Ties
/// on distance go to the earlier secondary row. Output has exactly one
/// entry per primary sample, in primary order.
pub fn merge_streams(
    primary: &[NormalizedSample],
    secondary: &[NormalizedSample],
    tolerance_secs: f64,
) -> Vec<MergedSample> {
    // Unconsumed secondaries ordered by (time, row), so a tolerance window is a range query.
    let mut pending: BTreeSet<(Instant, usize)> = secondary
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.timestamp, idx))
        .collect();
    let window_ms = (tolerance_secs.max(0.0) * 1000.0).round() as i64;
    let window = Duration::try_milliseconds(window_ms).unwrap_or(Duration::MAX);

    primary
        .iter()
        .map(|p| {
            let lo = p
                .timestamp
                .checked_sub_signed(window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let hi = p
                .timestamp
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            let best = pending
                .range((lo, 0)..=(hi, usize::MAX))
                .map(|&(ts, idx)| (delta_secs(p.timestamp, ts), idx, ts))
                .filter(|(delta, _, _)| *delta <= tolerance_secs)
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let (proximal, proximal_row) = match best {
                Some((_, idx, ts)) => {
                    pending.remove(&(ts, idx));
                    (secondary[idx].fields, Some(idx))
                }
                None => (SensorFields::empty(), None),
            };

            MergedSample {
                timestamp: p.timestamp,
                distal: p.fields,
                differential: differential(&p.fields, &proximal),
                proximal,
                proximal_row,
            }
        })
        .collect()
}
