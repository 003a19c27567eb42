use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PlaybackError, Result};

/// Duration reported for plans that do not span a time range.
pub const DEFAULT_PLAN_DURATION: f64 = 1.0;

/// One timestamped joint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub configuration: Vec<f64>,
}

impl Keyframe {
    pub fn new(time: f64, configuration: impl Into<Vec<f64>>) -> Self {
        Self {
            time,
            configuration: configuration.into(),
        }
    }
}

/// Immutable, validated sequence of keyframes describing a robot plan.
///
/// Timestamps are strictly increasing and every configuration carries the
/// same number of joints. Plans round-trip through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanData")]
pub struct Plan {
    id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    joint_names: Vec<String>,
    keyframes: Vec<Keyframe>,
}

#[derive(Deserialize)]
struct PlanData {
    id: i64,
    #[serde(default)]
    joint_names: Vec<String>,
    keyframes: Vec<Keyframe>,
}

impl TryFrom<PlanData> for Plan {
    type Error = PlaybackError;

    fn try_from(data: PlanData) -> Result<Self> {
        Plan::new(data.id, data.keyframes)?.with_joint_names(data.joint_names)
    }
}

impl Plan {
    /// Validates the keyframes and wraps them into a plan.
    pub fn new(id: i64, keyframes: Vec<Keyframe>) -> Result<Self> {
        validate_keyframes(&keyframes)?;
        Ok(Self {
            id,
            joint_names: Vec::new(),
            keyframes,
        })
    }

    /// Attaches joint names. An empty list clears them.
    pub fn with_joint_names(mut self, names: Vec<String>) -> Result<Self> {
        if !names.is_empty() {
            if let Some(count) = self.joint_count() {
                if names.len() != count {
                    return Err(PlaybackError::invalid_plan(format!(
                        "{} joint names for {count} joints",
                        names.len()
                    )));
                }
            }
        }
        self.joint_names = names;
        Ok(self)
    }

    /// Reads a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Number of joints per configuration, `None` for an empty plan.
    pub fn joint_count(&self) -> Option<usize> {
        self.keyframes.first().map(|k| k.configuration.len())
    }

    /// Total playback duration: last timestamp minus first, or
    /// [`DEFAULT_PLAN_DURATION`] when the plan has fewer than two keyframes.
    pub fn elapsed_time(&self) -> f64 {
        match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) if self.keyframes.len() > 1 => last.time - first.time,
            _ => DEFAULT_PLAN_DURATION,
        }
    }

    /// Keyframe timestamps shifted so that the first keyframe sits at zero.
    pub fn relative_times(&self) -> Vec<f64> {
        let origin = self.keyframes.first().map(|k| k.time).unwrap_or(0.0);
        self.keyframes.iter().map(|k| k.time - origin).collect()
    }

    /// Time series of a single joint across all keyframes, `None` when the
    /// plan has no such joint.
    pub fn joint_series(&self, joint: usize) -> Option<Vec<f64>> {
        self.keyframes
            .iter()
            .map(|k| k.configuration.get(joint).copied())
            .collect::<Option<Vec<f64>>>()
            .filter(|series| !series.is_empty())
    }

    pub fn final_configuration(&self) -> Option<&[f64]> {
        self.keyframes.last().map(|k| k.configuration.as_slice())
    }

    /// Human readable label shown next to the playback controls.
    pub fn label(&self) -> String {
        format!("Plan: {}.  {:.2} seconds", self.id, self.elapsed_time())
    }
}

fn validate_keyframes(keyframes: &[Keyframe]) -> Result<()> {
    let Some(first) = keyframes.first() else {
        return Ok(());
    };
    let joints = first.configuration.len();

    for (index, keyframe) in keyframes.iter().enumerate() {
        if !keyframe.time.is_finite() || keyframe.time < 0.0 {
            return Err(PlaybackError::invalid_plan(format!(
                "keyframe {index} has invalid timestamp {}",
                keyframe.time
            )));
        }
        if keyframe.configuration.len() != joints {
            return Err(PlaybackError::invalid_plan(format!(
                "keyframe {index} has {} joints, expected {joints}",
                keyframe.configuration.len()
            )));
        }
        if keyframe.configuration.iter().any(|value| !value.is_finite()) {
            return Err(PlaybackError::invalid_plan(format!(
                "keyframe {index} contains a non-finite joint value"
            )));
        }
    }

    for (index, pair) in keyframes.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(PlaybackError::invalid_plan(format!(
                "timestamps must be strictly increasing (keyframe {})",
                index + 1
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_joint_plan() -> Plan {
        Plan::new(
            42,
            vec![
                Keyframe::new(0.5, [0.0, 0.0]),
                Keyframe::new(1.5, [1.0, 2.0]),
                Keyframe::new(2.5, [0.5, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn reports_duration_and_label() {
        let plan = two_joint_plan();
        assert_eq!(plan.elapsed_time(), 2.0);
        assert_eq!(plan.joint_count(), Some(2));
        assert_eq!(plan.label(), "Plan: 42.  2.00 seconds");
        assert_eq!(plan.relative_times(), vec![0.0, 1.0, 2.0]);
        assert_eq!(plan.joint_series(1), Some(vec![0.0, 2.0, 1.0]));
        assert_eq!(plan.final_configuration(), Some(&[0.5, 1.0][..]));
    }

    #[test]
    fn unknown_joint_has_no_series() {
        let plan = two_joint_plan();
        assert_eq!(plan.joint_series(2), None);
        assert_eq!(Plan::new(1, Vec::new()).unwrap().joint_series(0), None);
    }

    #[test]
    fn short_plans_use_default_duration() {
        let empty = Plan::new(1, Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.elapsed_time(), DEFAULT_PLAN_DURATION);

        let single = Plan::new(1, vec![Keyframe::new(3.0, [1.0])]).unwrap();
        assert_eq!(single.elapsed_time(), DEFAULT_PLAN_DURATION);
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let err = Plan::new(
            1,
            vec![Keyframe::new(1.0, [0.0]), Keyframe::new(1.0, [1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidPlan(_)));
    }

    #[test]
    fn rejects_ragged_configurations() {
        let err = Plan::new(
            1,
            vec![Keyframe::new(0.0, [0.0, 1.0]), Keyframe::new(1.0, [1.0])],
        )
        .unwrap_err();
        assert!(format!("{err}").contains("expected 2"));
    }

    #[test]
    fn rejects_mismatched_joint_names() {
        let err = two_joint_plan()
            .with_joint_names(vec!["shoulder".to_string()])
            .unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidPlan(_)));
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let plan = two_joint_plan()
            .with_joint_names(vec!["shoulder".into(), "elbow".into()])
            .unwrap();
        let text = plan.to_json_string().unwrap();
        let restored = Plan::from_json_str(&text).unwrap();
        assert_eq!(plan, restored);
    }

    #[test]
    fn deserialisation_validates() {
        let text = r#"{"id": 3, "keyframes": [
            {"time": 1.0, "configuration": [0.0]},
            {"time": 0.5, "configuration": [1.0]}
        ]}"#;
        assert!(Plan::from_json_str(text).is_err());
    }

    #[test]
    fn loads_plan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, two_joint_plan().to_json_string().unwrap()).unwrap();

        let plan = Plan::load(&path).unwrap();
        assert_eq!(plan.id(), 42);
        assert_eq!(plan.len(), 3);
    }
}
