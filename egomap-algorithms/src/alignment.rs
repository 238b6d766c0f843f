//! Event-to-frame alignment.
//!
//! Frames are sampled on a uniform grid `i / framerate` starting at 0, so the
//! nearest frame to an event is found by rounding instead of a search.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use egomap_core::{Error, Result, SpikeTrain};
use log::debug;

/// Timestamps of `frames` video frames in seconds.
#[must_use]
pub fn frame_timestamps(frames: usize, framerate_hz: u32) -> Vec<f64> {
    let framerate = f64::from(framerate_hz);
    (0..frames).map(|i| i as f64 / framerate).collect()
}

/// Index of the frame whose timestamp is nearest to `time_s`.
///
/// Events before the first frame map to frame 0, events after the last frame
/// map to the last frame. Ties go to the earlier frame. `frames` must be
/// non-zero.
#[inline]
#[must_use]
pub fn nearest_frame(time_s: f64, frames: usize, framerate_hz: u32) -> usize {
    let last = frames.saturating_sub(1);
    let framerate = f64::from(framerate_hz);
    let position = time_s * framerate;
    if position <= 0.0 {
        return 0;
    }
    let below = (position.floor() as usize).min(last);
    if below >= last {
        return last;
    }
    let above = below + 1;
    let to_below = (time_s - below as f64 / framerate).abs();
    let to_above = (above as f64 / framerate - time_s).abs();
    if to_below <= to_above {
        below
    } else {
        above
    }
}

/// Builds the binary spike train for one cell.
///
/// # Errors
/// Returns [`Error::EmptyInput`] when `frames` is zero,
/// [`Error::ConfigError`] for a zero frame rate, and
/// [`Error::InvalidTimestamp`] for a non-finite event time.
pub fn align_events(frames: usize, framerate_hz: u32, events_s: &[f64]) -> Result<SpikeTrain> {
    if frames == 0 {
        return Err(Error::EmptyInput("no frames to align events to".into()));
    }
    if framerate_hz == 0 {
        return Err(Error::ConfigError("framerate must be positive".into()));
    }
    let mut train = SpikeTrain::zeros(frames);
    for &time_s in events_s {
        if !time_s.is_finite() {
            return Err(Error::InvalidTimestamp(time_s));
        }
        train.mark(nearest_frame(time_s, frames, framerate_hz));
    }
    debug!(
        "aligned {} events onto {} of {} frames",
        events_s.len(),
        train.spike_count(),
        frames
    );
    Ok(train)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamps() {
        assert_eq!(frame_timestamps(4, 2), vec![0.0, 0.5, 1.0, 1.5]);
        assert!(frame_timestamps(0, 30).is_empty());
    }

    #[test]
    fn test_align_rounds_to_nearest() {
        let train = align_events(4, 1, &[2.4]).unwrap();
        assert_eq!(train.as_slice(), &[0, 0, 1, 0]);

        let train = align_events(4, 1, &[2.6]).unwrap();
        assert_eq!(train.as_slice(), &[0, 0, 0, 1]);
    }

    #[test]
    fn test_align_clamps_out_of_range() {
        let train = align_events(3, 10, &[-5.0, 100.0]).unwrap();
        assert_eq!(train.as_slice(), &[1, 0, 1]);
    }

    #[test]
    fn test_tie_goes_to_earlier_frame() {
        assert_eq!(nearest_frame(0.5, 4, 1), 0);
        assert_eq!(nearest_frame(2.5, 4, 1), 2);
        assert_eq!(nearest_frame(0.25, 4, 2), 0);
    }

    #[test]
    fn test_multiple_events_in_one_frame() {
        let train = align_events(5, 30, &[0.03, 0.034, 0.1]).unwrap();
        assert_eq!(train.spike_count(), 2);
        assert_eq!(train.indices(), vec![1, 3]);
    }

    #[test]
    fn test_no_events_yields_zero_train() {
        let train = align_events(6, 30, &[]).unwrap();
        assert_eq!(train.len(), 6);
        assert_eq!(train.spike_count(), 0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            align_events(0, 30, &[0.1]),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            align_events(3, 30, &[f64::NAN]),
            Err(Error::InvalidTimestamp(_))
        ));
        assert!(matches!(
            align_events(3, 0, &[0.1]),
            Err(Error::ConfigError(_))
        ));
    }
}
