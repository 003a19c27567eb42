//! Collaborators that consume playback output.
//!
//! The controller only talks to these traits. Scene-graph rendering, joint
//! controllers and plan execution live behind them and are expected to be
//! cheap to call; none of them report failures back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Plan, PlanFrame};

/// Source id used for poses of the animated playback model.
pub const PLAYBACK_SOURCE: &str = "plan_playback";
/// Source id used when a plan is committed for visualization only.
pub const ROBOT_STATE_SOURCE: &str = "EST_ROBOT_STATE";

/// Receives joint configurations, up to once per animation tick.
pub trait JointConfigurationConsumer {
    fn set_pose(&mut self, source_id: &str, configuration: &[f64]);
}

/// Fire-and-forget requests to a physical or simulated execution backend.
pub trait PlanExecutor {
    fn commit_plan(&mut self, plan: &Plan);
    fn send_plan_pause(&mut self);
}

/// Displays a sampled plan as a set of colored robot poses.
pub trait FrameRenderer {
    fn render_frames(&mut self, frames: &[PlanFrame]);
}

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pose sent to a [`JointConfigurationConsumer`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRecord {
    pub source_id: String,
    pub configuration: Vec<f64>,
}

/// Shared in-memory consumer. Clones observe the same history.
#[derive(Debug, Clone, Default)]
pub struct PoseLog {
    poses: Arc<Mutex<Vec<PoseRecord>>>,
}

impl PoseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.poses).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<PoseRecord> {
        lock(&self.poses).last().cloned()
    }

    pub fn records(&self) -> Vec<PoseRecord> {
        lock(&self.poses).clone()
    }
}

impl JointConfigurationConsumer for PoseLog {
    fn set_pose(&mut self, source_id: &str, configuration: &[f64]) {
        lock(&self.poses).push(PoseRecord {
            source_id: source_id.to_string(),
            configuration: configuration.to_vec(),
        });
    }
}

#[derive(Debug, Default)]
struct ExecutorState {
    committed: Vec<i64>,
    pauses: usize,
}

/// Shared in-memory executor recording committed plan ids and pause requests.
#[derive(Debug, Clone, Default)]
pub struct ExecutorLog {
    state: Arc<Mutex<ExecutorState>>,
}

impl ExecutorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> Vec<i64> {
        lock(&self.state).committed.clone()
    }

    pub fn pauses(&self) -> usize {
        lock(&self.state).pauses
    }
}

impl PlanExecutor for ExecutorLog {
    fn commit_plan(&mut self, plan: &Plan) {
        lock(&self.state).committed.push(plan.id());
    }

    fn send_plan_pause(&mut self) {
        lock(&self.state).pauses += 1;
    }
}

/// Shared in-memory renderer keeping the most recent frame set.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<PlanFrame>>>,
    renders: Arc<Mutex<usize>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<PlanFrame> {
        lock(&self.frames).clone()
    }

    pub fn renders(&self) -> usize {
        *lock(&self.renders)
    }
}

impl FrameRenderer for FrameLog {
    fn render_frames(&mut self, frames: &[PlanFrame]) {
        *lock(&self.frames) = frames.to_vec();
        *lock(&self.renders) += 1;
    }
}

/// Collaborator that reports everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl JointConfigurationConsumer for TracingSink {
    fn set_pose(&mut self, source_id: &str, configuration: &[f64]) {
        tracing::info!(source_id, ?configuration, "pose");
    }
}

impl PlanExecutor for TracingSink {
    fn commit_plan(&mut self, plan: &Plan) {
        tracing::info!(plan = plan.id(), keyframes = plan.len(), "commit plan");
    }

    fn send_plan_pause(&mut self) {
        tracing::info!("pause plan execution");
    }
}

impl FrameRenderer for TracingSink {
    fn render_frames(&mut self, frames: &[PlanFrame]) {
        for frame in frames {
            tracing::info!(
                index = frame.index,
                time = frame.time,
                configuration = ?frame.configuration,
                color = ?frame.color,
                "plan frame"
            );
        }
    }
}

/// The set of collaborators a controller pushes its output to.
pub struct Collaborators {
    /// Joint controller of the playback robot model.
    pub playback: Box<dyn JointConfigurationConsumer>,
    /// Joint controller holding the authoritative robot state.
    pub robot_state: Box<dyn JointConfigurationConsumer>,
    pub executor: Box<dyn PlanExecutor>,
    pub renderer: Box<dyn FrameRenderer>,
}

impl Collaborators {
    pub fn new(
        playback: impl JointConfigurationConsumer + 'static,
        robot_state: impl JointConfigurationConsumer + 'static,
        executor: impl PlanExecutor + 'static,
        renderer: impl FrameRenderer + 'static,
    ) -> Self {
        Self {
            playback: Box::new(playback),
            robot_state: Box::new(robot_state),
            executor: Box::new(executor),
            renderer: Box::new(renderer),
        }
    }

    /// Collaborators that only log.
    pub fn tracing() -> Self {
        Self::new(TracingSink, TracingSink, TracingSink, TracingSink)
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish()
    }
}
