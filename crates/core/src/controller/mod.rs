//! Playback state machine.
//!
//! The controller owns the active plan and its interpolator, drives the
//! playback clock and pushes poses to its collaborators. Every command runs
//! to completion on the caller's thread and reports what happened as a list
//! of [`PlaybackEvent`]s that a UI adapter can apply to its widgets.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    render::{Collaborators, PLAYBACK_SOURCE, ROBOT_STATE_SOURCE},
    timeline::{time_label, ClockSource, MonotonicClock, PlaybackClock},
    FrameGradient, InterpolationMethod, Plan, PlanFrame, PlaybackConfig, PlaybackError,
    PlaybackSpeed, PoseInterpolator, Result, SliderPosition, DEFAULT_PLAN_DURATION,
};

/// How the loaded plan is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Time-driven animation of a single robot pose.
    #[default]
    Continuous,
    /// Static display of several sampled poses.
    Frames,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Frames => "frames",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = PlaybackError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "frames" => Ok(Self::Frames),
            _ => Err(PlaybackError::unknown("view mode", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No plan loaded.
    Idle,
    /// Plan loaded, not animating.
    LoadedStatic,
    /// Continuous mode with the tick loop running.
    Animating,
}

/// Who caused a display update. Programmatic updates come from the
/// animation loop and must not be fed back into [`PlaybackController::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOrigin {
    User,
    Programmatic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    PlanLoaded {
        id: i64,
        duration: f64,
    },
    PlanCleared,
    /// A pose was pushed to the playback joint consumer.
    PoseShown {
        time: f64,
        slider: SliderPosition,
        origin: EventOrigin,
    },
    FramesRendered {
        count: usize,
    },
    AnimationStarted,
    AnimationFinished {
        time: f64,
    },
    AnimationStopped {
        time: f64,
    },
    PlanCommitted {
        id: i64,
        visualization_only: bool,
    },
    PauseRequested,
}

/// Snapshot of the controller for display purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub plan_label: String,
    pub time: f64,
    pub time_label: String,
    pub slider: SliderPosition,
    pub method: InterpolationMethod,
    pub speed: PlaybackSpeed,
    pub view_mode: ViewMode,
    pub sample_count: usize,
}

/// Plays back a single plan at a time.
pub struct PlaybackController<C = MonotonicClock> {
    plan: Option<Plan>,
    interpolator: Option<PoseInterpolator>,
    method: InterpolationMethod,
    speed: PlaybackSpeed,
    view_mode: ViewMode,
    sample_count: usize,
    visualization_only: bool,
    gradient: FrameGradient,
    start_time: f64,
    end_time: f64,
    current_time: f64,
    running: bool,
    last_pose: Option<Vec<f64>>,
    frames: Vec<PlanFrame>,
    clock: PlaybackClock<C>,
    collaborators: Collaborators,
}

impl PlaybackController<MonotonicClock> {
    pub fn new(config: &PlaybackConfig, collaborators: Collaborators) -> Self {
        Self::with_clock(MonotonicClock::new(), config, collaborators)
    }
}

impl<C: ClockSource> PlaybackController<C> {
    pub fn with_clock(source: C, config: &PlaybackConfig, collaborators: Collaborators) -> Self {
        Self {
            plan: None,
            interpolator: None,
            method: config.method,
            speed: config.speed,
            view_mode: config.view_mode,
            sample_count: config.sample_count.max(1),
            visualization_only: config.visualization_only,
            gradient: FrameGradient::default(),
            start_time: 0.0,
            end_time: DEFAULT_PLAN_DURATION,
            current_time: 0.0,
            running: false,
            last_pose: None,
            frames: Vec::new(),
            clock: PlaybackClock::with_source(source),
            collaborators,
        }
    }

    pub fn with_gradient(mut self, gradient: FrameGradient) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.plan, self.running) {
            (None, _) => PlaybackState::Idle,
            (Some(_), true) => PlaybackState::Animating,
            (Some(_), false) => PlaybackState::LoadedStatic,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.running
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn interpolator(&self) -> Option<&PoseInterpolator> {
        self.interpolator.as_ref()
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn visualization_only(&self) -> bool {
        self.visualization_only
    }

    pub fn set_visualization_only(&mut self, enabled: bool) {
        self.visualization_only = enabled;
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn slider(&self) -> SliderPosition {
        SliderPosition::from_time(self.current_time, self.end_time)
    }

    /// Most recent pose pushed to the playback consumer.
    pub fn last_pose(&self) -> Option<&[f64]> {
        self.last_pose.as_deref()
    }

    /// Frames of the most recent resample.
    pub fn frames(&self) -> &[PlanFrame] {
        &self.frames
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state(),
            plan_label: self.plan.as_ref().map(Plan::label).unwrap_or_default(),
            time: self.current_time,
            time_label: time_label(self.current_time),
            slider: self.slider(),
            method: self.method,
            speed: self.speed,
            view_mode: self.view_mode,
            sample_count: self.sample_count,
        }
    }

    /// Pose at `time` without emitting it. Fails with
    /// [`PlaybackError::NotReady`] when no plan is loaded.
    pub fn pose_at(&self, time: f64) -> Result<Vec<f64>> {
        let interpolator = self.ready()?;
        interpolator.evaluate(interpolator.clamp(time))
    }

    /// Replaces the active plan. `None` returns the controller to idle.
    ///
    /// A loaded plan is presented according to the current view mode:
    /// continuous mode starts animating, frames mode renders samples.
    pub fn set_plan(&mut self, plan: Option<Plan>) -> Result<Vec<PlaybackEvent>> {
        self.running = false;
        self.reset();

        let Some(plan) = plan else {
            tracing::debug!("plan cleared");
            return Ok(vec![PlaybackEvent::PlanCleared]);
        };

        let interpolator = build_interpolator(&plan, self.method)?;
        tracing::info!(plan = plan.id(), keyframes = plan.len(), "plan loaded");

        let mut events = vec![PlaybackEvent::PlanLoaded {
            id: plan.id(),
            duration: plan.elapsed_time(),
        }];
        self.start_time = interpolator.start_time();
        self.end_time = interpolator.end_time();
        self.interpolator = Some(interpolator);
        self.plan = Some(plan);

        events.extend(self.apply_view_mode()?);
        Ok(events)
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<Vec<PlaybackEvent>> {
        self.view_mode = mode;
        if self.plan.is_none() {
            return Ok(Vec::new());
        }
        self.apply_view_mode()
    }

    /// Rebuilds the interpolator with `method`. Without a plan the method is
    /// only remembered for the next one.
    pub fn set_interpolation_method(
        &mut self,
        method: InterpolationMethod,
    ) -> Result<Vec<PlaybackEvent>> {
        self.method = method;
        let Some(plan) = &self.plan else {
            return Ok(Vec::new());
        };

        self.interpolator = Some(build_interpolator(plan, method)?);
        tracing::debug!(%method, "interpolation method changed");
        self.update_frames()
    }

    pub fn set_sample_count(&mut self, count: usize) -> Result<Vec<PlaybackEvent>> {
        if count == 0 {
            return Err(PlaybackError::InvalidSampleCount(count));
        }
        self.sample_count = count;
        self.update_frames()
    }

    /// Takes effect on the next tick.
    pub fn set_playback_speed(&mut self, speed: PlaybackSpeed) {
        tracing::debug!(%speed, "playback speed changed");
        self.speed = speed;
    }

    /// Restarts the animation from the beginning and runs the first tick.
    pub fn start_animation(&mut self) -> Result<Vec<PlaybackEvent>> {
        if self.plan.is_none() {
            tracing::warn!("start_animation ignored: no plan loaded");
            return Ok(Vec::new());
        }

        self.running = false;
        self.current_time = self.start_time;
        self.clock.reset();
        self.running = true;
        tracing::debug!(end_time = self.end_time, speed = %self.speed, "animation started");

        let mut events = vec![PlaybackEvent::AnimationStarted];
        events.extend(self.tick()?);
        Ok(events)
    }

    /// Advances the animation to the current clock reading. Does nothing
    /// once the animation has stopped.
    pub fn tick(&mut self) -> Result<Vec<PlaybackEvent>> {
        if !self.running {
            return Ok(Vec::new());
        }

        let elapsed = self.speed.scale(self.clock.elapsed_secs());
        let time = (self.start_time + elapsed).min(self.end_time);
        let mut events = vec![self.show_pose(time, EventOrigin::Programmatic)?];

        if time >= self.end_time {
            self.running = false;
            tracing::debug!(time, "animation reached end of plan");
            events.push(PlaybackEvent::AnimationFinished { time });
        }
        Ok(events)
    }

    /// Halts the animation, keeping the last pose.
    pub fn stop_animation(&mut self) -> Vec<PlaybackEvent> {
        if !self.running {
            return Vec::new();
        }
        self.running = false;
        vec![PlaybackEvent::AnimationStopped {
            time: self.current_time,
        }]
    }

    /// Shows the pose at `time`, clamped to the plan. Ignored while
    /// animating or without a plan.
    pub fn seek(&mut self, time: f64) -> Result<Vec<PlaybackEvent>> {
        if self.plan.is_none() || self.running {
            tracing::debug!(time, state = ?self.state(), "seek ignored");
            return Ok(Vec::new());
        }
        let time = self.ready()?.clamp(time);
        Ok(vec![self.show_pose(time, EventOrigin::User)?])
    }

    pub fn seek_slider(&mut self, position: SliderPosition) -> Result<Vec<PlaybackEvent>> {
        self.seek(position.time(self.end_time))
    }

    /// Consumes the plan. In visualization-only mode the final configuration
    /// becomes the robot state; otherwise the plan goes to the executor.
    pub fn execute(&mut self) -> Result<Vec<PlaybackEvent>> {
        let Some(plan) = self.plan.take() else {
            tracing::warn!("execute ignored: no plan loaded");
            return Ok(Vec::new());
        };

        if self.visualization_only {
            if let Some(configuration) = plan.final_configuration() {
                self.collaborators
                    .robot_state
                    .set_pose(ROBOT_STATE_SOURCE, configuration);
            }
        } else {
            self.collaborators.executor.commit_plan(&plan);
        }
        tracing::info!(
            plan = plan.id(),
            visualization_only = self.visualization_only,
            "plan committed"
        );

        let mut events = vec![PlaybackEvent::PlanCommitted {
            id: plan.id(),
            visualization_only: self.visualization_only,
        }];
        events.extend(self.set_plan(None)?);
        Ok(events)
    }

    /// Stops local animation and asks the executor to pause.
    pub fn stop(&mut self) -> Vec<PlaybackEvent> {
        let mut events = self.stop_animation();
        self.collaborators.executor.send_plan_pause();
        tracing::info!("plan pause requested");
        events.push(PlaybackEvent::PauseRequested);
        events
    }

    fn ready(&self) -> Result<&PoseInterpolator> {
        self.interpolator.as_ref().ok_or(PlaybackError::NotReady)
    }

    fn reset(&mut self) {
        self.plan = None;
        self.interpolator = None;
        self.start_time = 0.0;
        self.end_time = DEFAULT_PLAN_DURATION;
        self.current_time = 0.0;
        self.last_pose = None;
        self.frames.clear();
    }

    fn apply_view_mode(&mut self) -> Result<Vec<PlaybackEvent>> {
        match self.view_mode {
            ViewMode::Continuous => self.start_animation(),
            ViewMode::Frames => {
                let mut events = self.stop_animation();
                self.current_time = self.start_time;
                events.extend(self.update_frames()?);
                Ok(events)
            }
        }
    }

    fn update_frames(&mut self) -> Result<Vec<PlaybackEvent>> {
        if self.view_mode != ViewMode::Frames || self.plan.is_none() {
            return Ok(Vec::new());
        }

        let frames = self.gradient.frames(self.ready()?, self.sample_count)?;
        self.collaborators.renderer.render_frames(&frames);
        let count = frames.len();
        self.frames = frames;
        tracing::debug!(count, "plan frames rendered");
        Ok(vec![PlaybackEvent::FramesRendered { count }])
    }

    fn show_pose(&mut self, time: f64, origin: EventOrigin) -> Result<PlaybackEvent> {
        let pose = self.ready()?.evaluate(time)?;
        self.collaborators
            .playback
            .set_pose(PLAYBACK_SOURCE, &pose);
        self.current_time = time;
        self.last_pose = Some(pose);
        Ok(PlaybackEvent::PoseShown {
            time,
            slider: SliderPosition::from_time(time, self.end_time),
            origin,
        })
    }
}

impl<C> fmt::Debug for PlaybackController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("plan", &self.plan.as_ref().map(Plan::id))
            .field("method", &self.method)
            .field("speed", &self.speed)
            .field("view_mode", &self.view_mode)
            .field("sample_count", &self.sample_count)
            .field("current_time", &self.current_time)
            .field("end_time", &self.end_time)
            .field("running", &self.running)
            .finish()
    }
}

/// Single keyframe plans cannot carry slopes, so they fall back to a
/// constant pose regardless of the selected method.
fn build_interpolator(plan: &Plan, method: InterpolationMethod) -> Result<PoseInterpolator> {
    let method = if plan.len() == 1 && method.requires_derivatives() {
        tracing::warn!(plan = plan.id(), %method, "single keyframe plan, using linear");
        InterpolationMethod::Linear
    } else {
        method
    };
    PoseInterpolator::build(plan, method)
}
