/// Temporal smoothing of pitch tracks with gaps.
///
/// Both filters look at a centered window that shrinks at the ends of the track and only take
/// the positions with a pitch into account. A position whose window contains no pitch at all is
/// left as it is.

use crate::params::SmoothingParameters;
use crate::track::PitchEstimate;
use crate::util::{mean, median_in_place};

/// Applies `statistic` to the valid values of the window around every position.
fn windowed<F>(track: &[PitchEstimate], window: usize, mut statistic: F) -> Vec<PitchEstimate>
where
    F: FnMut(&mut Vec<f32>) -> Option<f32>,
{
    let half = window / 2;
    let mut valid = Vec::with_capacity(window);
    track
        .iter()
        .enumerate()
        .map(|(i, estimate)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(track.len());
            valid.clear();
            valid.extend(track[lo..hi].iter().flatten().copied());
            statistic(&mut valid).or(*estimate)
        })
        .collect()
}

/// Median filter. Rejects isolated outliers and keeps steps (note changes) sharp.
pub fn median_filter(track: &[PitchEstimate], window: usize) -> Vec<PitchEstimate> {
    windowed(track, window, |values| median_in_place(values))
}

/// Moving average for light smoothing.
pub fn moving_average(track: &[PitchEstimate], window: usize) -> Vec<PitchEstimate> {
    windowed(track, window, |values| mean(values))
}

/// Median filter followed by the moving average.
pub fn smooth(track: &[PitchEstimate], params: &SmoothingParameters) -> Vec<PitchEstimate> {
    moving_average(&median_filter(track, params.median_window), params.mean_window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_track_is_unchanged() {
        let track = vec![Some(330.0); 12];
        assert_eq!(median_filter(&track, 5), track);
        assert_eq!(moving_average(&track, 3), track);
        assert_eq!(smooth(&track, &SmoothingParameters::default()), track);
    }

    #[test]
    fn test_outlier_is_suppressed() {
        let mut track = vec![Some(220.0); 9];
        track[4] = Some(5000.0);
        let filtered = median_filter(&track, 5);
        assert!(filtered.iter().all(|f| *f == Some(220.0)));
    }

    #[test]
    fn test_step_is_preserved() {
        let track = [100.0, 100.0, 100.0, 100.0, 200.0, 200.0, 200.0, 200.0]
            .map(Some)
            .to_vec();
        assert_eq!(median_filter(&track, 5), track);
    }

    #[test]
    fn test_gaps() {
        // an empty window leaves the position untouched
        let track = vec![None, None, None, None, Some(100.0)];
        let averaged = moving_average(&track, 3);
        assert_eq!(averaged, vec![None, None, None, Some(100.0), Some(100.0)]);

        // valid neighbors are not dragged towards zero
        let track = vec![Some(100.0), None, Some(200.0)];
        assert_eq!(moving_average(&track, 3), vec![Some(100.0), Some(150.0), Some(200.0)]);
        assert_eq!(median_filter(&track, 3), vec![Some(100.0), Some(150.0), Some(200.0)]);

        assert_eq!(median_filter(&[], 5), vec![]);
        assert_eq!(median_filter(&[None, None], 5), vec![None, None]);
    }

    #[test]
    fn test_shrinking_boundary_window() {
        let track = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        // first window is [10, 20], last window is [30, 40]
        assert_eq!(
            moving_average(&track, 3),
            vec![Some(15.0), Some(20.0), Some(30.0), Some(35.0)]
        );
    }
}
