/// A function to implement max() for floats, because floats don't implement Ord
/// The assumption is that NaNs are not present in the slice.
pub fn max(sl: &[f32]) -> f32 {
    sl.iter()
        .fold(f32::MIN, |cur, x| if *x > cur { *x } else { cur })
}

pub fn arg_max(sl: &[f32]) -> usize {
    // we have no NaNs
    sl.iter()
        .enumerate()
        .fold(
            (0, f32::MIN),
            |cur, x| if *x.1 > cur.1 { (x.0, *x.1) } else { cur },
        )
        .0
}

/// Median of the given values. Even counts average the two middle values.
///
/// Returns `None` for an empty slice. The values are reordered in place.
pub fn median_in_place(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some(0.5 * (values[mid - 1] + values[mid]))
    } else {
        Some(values[mid])
    }
}

pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}
