use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{FrameGradient, InterpolationMethod, PlaybackSpeed, Result, ViewMode};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub frames: FrameGradient,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Initial state of a playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub target_fps: u32,
    pub speed: PlaybackSpeed,
    pub method: InterpolationMethod,
    pub view_mode: ViewMode,
    pub sample_count: usize,
    /// Commit plans by updating the robot state model instead of sending
    /// them to the executor.
    pub visualization_only: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            speed: PlaybackSpeed::NORMAL,
            method: InterpolationMethod::Pchip,
            view_mode: ViewMode::Continuous,
            sample_count: 5,
            visualization_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playback.json");
        std::fs::write(
            &path,
            r#"{"playback": {"speed": "1/2x", "method": "linear", "view_mode": "frames"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.playback.speed.factor(), 0.5);
        assert_eq!(config.playback.method, InterpolationMethod::Linear);
        assert_eq!(config.playback.view_mode, ViewMode::Frames);
        assert_eq!(config.playback.target_fps, 60);
        assert_eq!(config.frames, FrameGradient::default());
    }

    #[test]
    fn rejects_unknown_speed() {
        let err = serde_json::from_str::<PlaybackConfig>(r#"{"speed": "warp"}"#);
        assert!(err.is_err());
    }
}
