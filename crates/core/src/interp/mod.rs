//! Continuous time → joint configuration functions built from a [`Plan`].

mod curve;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Plan, PlaybackError, Result};

use curve::{locate, JointCurve};

/// Algorithm used to fill in poses between keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpolationMethod {
    /// Piecewise linear segments.
    Linear,
    /// Natural cubic spline with a continuous second derivative.
    CubicSpline,
    /// Shape-preserving piecewise cubic Hermite. Never overshoots the
    /// bracketing keyframes, which keeps joints inside their limits.
    #[default]
    Pchip,
}

impl InterpolationMethod {
    pub const ALL: [InterpolationMethod; 3] = [Self::Linear, Self::CubicSpline, Self::Pchip];

    /// Label used by the playback panel's method selector.
    pub fn label(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::CubicSpline => "cubic spline",
            Self::Pchip => "pchip",
        }
    }

    /// Whether the method needs at least two keyframes to fit slopes.
    pub fn requires_derivatives(self) -> bool {
        !matches!(self, Self::Linear)
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InterpolationMethod {
    type Err = PlaybackError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" | "slinear" => Ok(Self::Linear),
            "cubic spline" | "cubic-spline" | "cubic_spline" | "cubic" => Ok(Self::CubicSpline),
            "pchip" => Ok(Self::Pchip),
            _ => Err(PlaybackError::unknown("interpolation method", value)),
        }
    }
}

/// Immutable pose function over `[start_time, end_time]`.
///
/// Playback time is measured from the plan's first keyframe, so the domain
/// always starts at zero and ends at [`Plan::elapsed_time`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoseInterpolator {
    method: InterpolationMethod,
    end_time: f64,
    times: Vec<f64>,
    curves: Vec<JointCurve>,
}

impl PoseInterpolator {
    /// Fits one curve per joint using `method`.
    pub fn build(plan: &Plan, method: InterpolationMethod) -> Result<Self> {
        let keyframes = plan.keyframes();
        let joints = plan.joint_count().unwrap_or(0);
        let end_time = plan.elapsed_time();

        if keyframes.is_empty() || (keyframes.len() < 2 && method.requires_derivatives()) {
            return Err(PlaybackError::EmptyPlan);
        }

        if keyframes.len() == 1 {
            let curves = keyframes[0]
                .configuration
                .iter()
                .map(|value| JointCurve::Constant(*value))
                .collect();
            return Ok(Self {
                method,
                end_time,
                times: vec![0.0],
                curves,
            });
        }

        let times = plan.relative_times();
        let curves = (0..joints)
            .filter_map(|joint| plan.joint_series(joint))
            .map(|values| match method {
                InterpolationMethod::Linear => JointCurve::linear(values),
                InterpolationMethod::CubicSpline => JointCurve::natural_spline(&times, values),
                InterpolationMethod::Pchip => JointCurve::pchip(&times, values),
            })
            .collect();

        tracing::debug!(plan = plan.id(), %method, joints, "built pose interpolator");

        Ok(Self {
            method,
            end_time,
            times,
            curves,
        })
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    pub fn start_time(&self) -> f64 {
        0.0
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn joint_count(&self) -> usize {
        self.curves.len()
    }

    /// Clamps `time` into the interpolator's domain. NaN maps to the start.
    pub fn clamp(&self, time: f64) -> f64 {
        if time.is_nan() {
            return self.start_time();
        }
        time.clamp(self.start_time(), self.end_time)
    }

    /// Evaluates every joint at `time`. Knot times return the keyframe
    /// configuration exactly.
    pub fn evaluate(&self, time: f64) -> Result<Vec<f64>> {
        if !(self.start_time()..=self.end_time).contains(&time) {
            return Err(PlaybackError::OutOfRangeQuery {
                time,
                start: self.start_time(),
                end: self.end_time,
            });
        }

        let knot = locate(&self.times, time);
        Ok(self
            .curves
            .iter()
            .map(|curve| curve.evaluate(&self.times, knot))
            .collect())
    }

    /// Evaluates at `time` after clamping it into the domain.
    pub fn evaluate_clamped(&self, time: f64) -> Vec<f64> {
        let knot = locate(&self.times, self.clamp(time));
        self.curves
            .iter()
            .map(|curve| curve.evaluate(&self.times, knot))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keyframe;

    fn plan(keyframes: Vec<Keyframe>) -> Plan {
        Plan::new(7, keyframes).unwrap()
    }

    fn wave() -> Plan {
        plan(vec![
            Keyframe::new(1.0, [0.0, 3.0]),
            Keyframe::new(1.4, [0.7, 2.0]),
            Keyframe::new(2.2, [0.1, 2.5]),
            Keyframe::new(3.0, [-0.4, 4.0]),
        ])
    }

    #[test]
    fn linear_midpoint_matches_scenario() {
        let plan = plan(vec![
            Keyframe::new(0.0, [0.0, 0.0]),
            Keyframe::new(1.0, [1.0, 2.0]),
        ]);
        let interp = PoseInterpolator::build(&plan, InterpolationMethod::Linear).unwrap();
        assert_eq!(interp.evaluate(0.5).unwrap(), vec![0.5, 1.0]);
    }

    #[test]
    fn passes_through_every_knot_for_all_methods() {
        let plan = wave();
        let times = plan.relative_times();
        for method in InterpolationMethod::ALL {
            let interp = PoseInterpolator::build(&plan, method).unwrap();
            assert_eq!(interp.end_time(), 2.0);
            for (time, keyframe) in times.iter().zip(plan.keyframes()) {
                assert_eq!(interp.evaluate(*time).unwrap(), keyframe.configuration);
            }
        }
    }

    #[test]
    fn rejects_queries_outside_domain() {
        let interp = PoseInterpolator::build(&wave(), InterpolationMethod::Pchip).unwrap();
        let err = interp.evaluate(2.5).unwrap_err();
        assert!(matches!(err, PlaybackError::OutOfRangeQuery { .. }));
        assert!(interp.evaluate(-0.1).is_err());
        assert!(interp.evaluate(f64::NAN).is_err());
        assert_eq!(interp.evaluate_clamped(5.0), vec![-0.4, 4.0]);
    }

    #[test]
    fn empty_plans_fail_for_every_method() {
        let plan = plan(Vec::new());
        for method in InterpolationMethod::ALL {
            assert!(matches!(
                PoseInterpolator::build(&plan, method),
                Err(PlaybackError::EmptyPlan)
            ));
        }
    }

    #[test]
    fn single_keyframe_degrades_to_constant_for_linear_only() {
        let plan = plan(vec![Keyframe::new(0.0, [0.3, -0.3])]);
        let interp = PoseInterpolator::build(&plan, InterpolationMethod::Linear).unwrap();
        assert_eq!(interp.evaluate(0.0).unwrap(), vec![0.3, -0.3]);
        assert_eq!(interp.evaluate(interp.end_time()).unwrap(), vec![0.3, -0.3]);

        assert!(PoseInterpolator::build(&plan, InterpolationMethod::CubicSpline).is_err());
        assert!(PoseInterpolator::build(&plan, InterpolationMethod::Pchip).is_err());
    }

    #[test]
    fn rebuilding_with_the_same_method_is_identical() {
        let plan = wave();
        let first = PoseInterpolator::build(&plan, InterpolationMethod::CubicSpline).unwrap();
        let _other = PoseInterpolator::build(&plan, InterpolationMethod::Linear).unwrap();
        let again = PoseInterpolator::build(&plan, InterpolationMethod::CubicSpline).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn parses_panel_labels() {
        for method in InterpolationMethod::ALL {
            assert_eq!(method.label().parse::<InterpolationMethod>().unwrap(), method);
        }
        assert_eq!(
            "Cubic-Spline".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::CubicSpline
        );
        assert!("bezier".parse::<InterpolationMethod>().is_err());
    }
}
