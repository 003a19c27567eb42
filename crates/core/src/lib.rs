//! Core library for robot plan playback.
//!
//! A [`Plan`] is a sparse list of timestamped joint configurations. The
//! [`PoseInterpolator`] turns it into a continuous function of time, the
//! [`sampling`] module materialises evenly spaced poses for static display
//! and the [`PlaybackController`] animates the plan against a monotonic
//! clock, pushing poses to the collaborators declared in [`render`].
//! [`PlaybackPanel`] adapts plain widget events onto the controller.

pub mod config;
pub mod controller;
pub mod error;
pub mod interp;
pub mod panel;
pub mod plan;
pub mod render;
pub mod sampling;
pub mod timeline;

pub use config::{AppConfig, PlaybackConfig};
pub use controller::{
    EventOrigin, PlaybackController, PlaybackEvent, PlaybackState, PlaybackStatus, ViewMode,
};
pub use error::{PlaybackError, Result};
pub use interp::{InterpolationMethod, PoseInterpolator};
pub use panel::{PanelView, PlaybackPanel};
pub use plan::{Keyframe, Plan, DEFAULT_PLAN_DURATION};
pub use render::{Collaborators, FrameRenderer, JointConfigurationConsumer, PlanExecutor};
pub use sampling::{sample, sample_times, FrameGradient, PlanFrame};
pub use timeline::{
    AnimationTimer, ClockSource, ManualClock, MonotonicClock, PlaybackClock, PlaybackSpeed,
    SliderPosition,
};
