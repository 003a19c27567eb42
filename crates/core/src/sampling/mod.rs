use serde::{Deserialize, Serialize};

use crate::{InterpolationMethod, Plan, PlaybackError, PoseInterpolator, Result};

/// RGB color in the `[0, 1]` range.
pub type Rgb = [f64; 3];

/// Color of the first (dimmest) frame in a sampled plan.
pub const FRAME_START_COLOR: Rgb = [0.8, 0.8, 0.8];
/// Color of the last frame in a sampled plan.
pub const FRAME_END_COLOR: Rgb = [85.0 / 255.0, 1.0, 1.0];

/// One pose of a statically displayed plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFrame {
    pub index: usize,
    pub time: f64,
    pub configuration: Vec<f64>,
    pub color: Rgb,
}

/// `count` evenly spaced times over `[start, end]`, both endpoints included.
/// The last time is pinned to `end` so the final pose is the last keyframe.
pub fn sample_times(start: f64, end: f64, count: usize) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(PlaybackError::InvalidSampleCount(count));
    }
    if count == 1 {
        return Ok(vec![start]);
    }

    let step = (end - start) / (count - 1) as f64;
    let mut times: Vec<f64> = (0..count).map(|k| start + k as f64 * step).collect();
    times[count - 1] = end;
    Ok(times)
}

/// Evaluates `interpolator` at `count` evenly spaced times.
pub fn sample_interpolator(interpolator: &PoseInterpolator, count: usize) -> Result<Vec<Vec<f64>>> {
    sample_times(interpolator.start_time(), interpolator.end_time(), count)?
        .into_iter()
        .map(|time| interpolator.evaluate(time))
        .collect()
}

/// Builds an interpolator for `plan` and samples `count` poses from it.
pub fn sample(plan: &Plan, method: InterpolationMethod, count: usize) -> Result<Vec<Vec<f64>>> {
    if count == 0 {
        return Err(PlaybackError::InvalidSampleCount(count));
    }
    let interpolator = PoseInterpolator::build(plan, method)?;
    sample_interpolator(&interpolator, count)
}

/// Linear gradient between two colors across `count` frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGradient {
    pub start: Rgb,
    pub end: Rgb,
}

impl Default for FrameGradient {
    fn default() -> Self {
        Self {
            start: FRAME_START_COLOR,
            end: FRAME_END_COLOR,
        }
    }
}

impl FrameGradient {
    pub fn color(&self, index: usize, count: usize) -> Rgb {
        if count <= 1 {
            return self.start;
        }
        if index >= count - 1 {
            return self.end;
        }
        let s = index as f64 / (count - 1) as f64;
        let mut color = [0.0; 3];
        for (channel, value) in color.iter_mut().enumerate() {
            *value = self.start[channel] + (self.end[channel] - self.start[channel]) * s;
        }
        color
    }

    /// Samples `interpolator` and colors each pose by its position.
    pub fn frames(&self, interpolator: &PoseInterpolator, count: usize) -> Result<Vec<PlanFrame>> {
        let times = sample_times(interpolator.start_time(), interpolator.end_time(), count)?;
        times
            .into_iter()
            .enumerate()
            .map(|(index, time)| {
                Ok(PlanFrame {
                    index,
                    time,
                    configuration: interpolator.evaluate(time)?,
                    color: self.color(index, count),
                })
            })
            .collect()
    }
}
