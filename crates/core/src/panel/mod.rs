//! Toolkit-neutral adapter between playback widgets and the controller.
//!
//! Widget callbacks arrive as plain strings and integers. The adapter turns
//! them into controller commands and folds the returned events back into a
//! [`PanelView`] that a UI layer mirrors. Slider updates produced by the
//! animation loop are tagged [`EventOrigin::Programmatic`] and only refresh
//! the labels, so setting the slider from code never seeks.

use serde::{Deserialize, Serialize};

use crate::{
    timeline::{time_label, ClockSource, MonotonicClock},
    EventOrigin, InterpolationMethod, PlaybackController, PlaybackEvent, PlaybackSpeed, Plan,
    Result, SliderPosition, ViewMode,
};

/// Widget state derived from the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelView {
    pub plan_label: String,
    pub time_label: String,
    pub slider: SliderPosition,
    /// Speed selector, slider, animate button and time label.
    pub playback_controls_visible: bool,
    pub samples_enabled: bool,
    pub execute_enabled: bool,
    pub hidden: bool,
}

impl Default for PanelView {
    fn default() -> Self {
        Self {
            plan_label: String::new(),
            time_label: time_label(0.0),
            slider: SliderPosition::START,
            playback_controls_visible: true,
            samples_enabled: false,
            execute_enabled: false,
            hidden: false,
        }
    }
}

#[derive(Debug)]
pub struct PlaybackPanel<C = MonotonicClock> {
    controller: PlaybackController<C>,
    view: PanelView,
}

impl<C: ClockSource> PlaybackPanel<C> {
    pub fn new(controller: PlaybackController<C>) -> Self {
        let mut panel = Self {
            controller,
            view: PanelView::default(),
        };
        panel.sync_mode_widgets();
        panel
    }

    pub fn controller(&self) -> &PlaybackController<C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<C> {
        &mut self.controller
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    pub fn set_plan(&mut self, plan: Option<Plan>) -> Result<()> {
        self.view.hidden = false;
        let result = self.controller.set_plan(plan);
        match &result {
            Ok(events) => self.apply(events),
            // The controller is idle again after a rejected plan.
            Err(_) => self.apply(&[PlaybackEvent::PlanCleared]),
        }
        self.view.plan_label = self
            .controller
            .plan()
            .map(Plan::label)
            .unwrap_or_default();
        self.view.execute_enabled = self.controller.plan().is_some();
        result.map(|_| ())
    }

    pub fn view_mode_changed(&mut self, text: &str) -> Result<()> {
        let mode: ViewMode = text.parse()?;
        let events = self.controller.set_view_mode(mode)?;
        self.sync_mode_widgets();
        self.apply(&events);
        Ok(())
    }

    pub fn playback_speed_changed(&mut self, text: &str) -> Result<()> {
        let speed: PlaybackSpeed = text.parse()?;
        self.controller.set_playback_speed(speed);
        Ok(())
    }

    pub fn interpolation_changed(&mut self, text: &str) -> Result<()> {
        let method: InterpolationMethod = text.parse()?;
        let events = self.controller.set_interpolation_method(method)?;
        self.apply(&events);
        Ok(())
    }

    /// Spin boxes report signed values; anything below one is clamped.
    pub fn samples_changed(&mut self, value: i32) -> Result<()> {
        let count = usize::try_from(value.max(1)).unwrap_or(1);
        let events = self.controller.set_sample_count(count)?;
        self.apply(&events);
        Ok(())
    }

    pub fn slider_changed(&mut self, value: i32, origin: EventOrigin) -> Result<()> {
        let position = SliderPosition::new(i64::from(value));
        self.view.slider = position;
        self.view.time_label = time_label(position.time(self.controller.end_time()));
        // The slider is disabled outside continuous mode.
        if origin == EventOrigin::Programmatic || !self.view.playback_controls_visible {
            return Ok(());
        }
        let events = self.controller.seek_slider(position)?;
        self.apply(&events);
        Ok(())
    }

    pub fn animate_clicked(&mut self) -> Result<()> {
        let events = self.controller.start_animation()?;
        self.apply(&events);
        Ok(())
    }

    /// Drives one tick of the animation loop. Returns whether the loop
    /// should keep running.
    pub fn animation_tick(&mut self) -> Result<bool> {
        let events = self.controller.tick()?;
        self.apply(&events);
        Ok(self.controller.is_animating())
    }

    /// Toggles the panel. Hiding stops any running animation; showing again
    /// re-applies the current view mode.
    pub fn hide_clicked(&mut self) -> Result<()> {
        if self.view.hidden {
            self.view.hidden = false;
            self.view.execute_enabled = self.controller.plan().is_some();
            let events = self.controller.set_view_mode(self.controller.view_mode())?;
            self.apply(&events);
        } else {
            self.view.hidden = true;
            self.view.execute_enabled = false;
            let events = self.controller.stop_animation();
            self.apply(&events);
        }
        Ok(())
    }

    pub fn execute_clicked(&mut self) -> Result<()> {
        let events = self.controller.execute()?;
        self.apply(&events);
        self.view.plan_label.clear();
        self.view.execute_enabled = false;
        Ok(())
    }

    pub fn stop_clicked(&mut self) {
        let events = self.controller.stop();
        self.apply(&events);
    }

    fn sync_mode_widgets(&mut self) {
        let continuous = self.controller.view_mode() == ViewMode::Continuous;
        self.view.playback_controls_visible = continuous;
        self.view.samples_enabled = !continuous;
    }

    fn apply(&mut self, events: &[PlaybackEvent]) {
        for event in events {
            match event {
                PlaybackEvent::PoseShown { time, slider, .. } => {
                    self.view.slider = *slider;
                    self.view.time_label = time_label(*time);
                }
                PlaybackEvent::PlanCleared => {
                    self.view.slider = SliderPosition::START;
                    self.view.time_label = time_label(0.0);
                }
                PlaybackEvent::FramesRendered { .. } => {
                    self.view.slider = SliderPosition::START;
                    self.view.time_label = time_label(0.0);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        render::{Collaborators, ExecutorLog, FrameLog, PoseLog},
        timeline::ManualClock,
        Keyframe, PlaybackConfig,
    };

    fn panel(poses: &PoseLog, executor: &ExecutorLog) -> PlaybackPanel<ManualClock> {
        panel_in(ViewMode::Frames, poses, executor, &FrameLog::new())
    }

    fn panel_in(
        view_mode: ViewMode,
        poses: &PoseLog,
        executor: &ExecutorLog,
        frames: &FrameLog,
    ) -> PlaybackPanel<ManualClock> {
        let collaborators = Collaborators::new(
            poses.clone(),
            PoseLog::new(),
            executor.clone(),
            frames.clone(),
        );
        let config = PlaybackConfig {
            view_mode,
            ..PlaybackConfig::default()
        };
        PlaybackPanel::new(PlaybackController::with_clock(
            ManualClock::new(),
            &config,
            collaborators,
        ))
    }

    fn plan() -> Plan {
        Plan::new(
            12,
            vec![Keyframe::new(0.0, [0.0]), Keyframe::new(2.0, [4.0])],
        )
        .unwrap()
    }

    #[test]
    fn programmatic_slider_updates_do_not_seek() {
        let poses = PoseLog::new();
        let mut panel = panel_in(
            ViewMode::Continuous,
            &poses,
            &ExecutorLog::new(),
            &FrameLog::new(),
        );
        panel.set_plan(Some(plan())).unwrap();
        panel.stop_clicked();
        let shown = poses.len();

        panel.slider_changed(500, EventOrigin::Programmatic).unwrap();
        assert_eq!(poses.len(), shown);
        assert_eq!(panel.view().time_label, "Time: 1.00 s");

        panel.slider_changed(500, EventOrigin::User).unwrap();
        assert_eq!(poses.len(), shown + 1);
        assert_eq!(poses.last().unwrap().configuration, vec![2.0]);
    }

    #[test]
    fn slider_is_inert_in_frames_mode() {
        let poses = PoseLog::new();
        let mut panel = panel(&poses, &ExecutorLog::new());
        panel.set_plan(Some(plan())).unwrap();

        panel.slider_changed(500, EventOrigin::User).unwrap();
        assert!(poses.is_empty());
    }

    #[test]
    fn rejected_plan_resets_slider_and_time() {
        let mut panel = panel_in(
            ViewMode::Continuous,
            &PoseLog::new(),
            &ExecutorLog::new(),
            &FrameLog::new(),
        );
        panel.set_plan(Some(plan())).unwrap();
        panel.stop_clicked();
        panel.slider_changed(800, EventOrigin::User).unwrap();
        assert_eq!(panel.view().time_label, "Time: 1.60 s");

        let empty = Plan::new(2, Vec::new()).unwrap();
        assert!(panel.set_plan(Some(empty)).is_err());
        assert_eq!(panel.controller().state(), crate::PlaybackState::Idle);
        assert_eq!(panel.view().slider, SliderPosition::START);
        assert_eq!(panel.view().time_label, "Time: 0.00 s");
        assert_eq!(panel.view().plan_label, "");
        assert!(!panel.view().execute_enabled);
    }

    #[test]
    fn hiding_stops_animation_and_showing_restarts_it() {
        let mut panel = panel_in(
            ViewMode::Continuous,
            &PoseLog::new(),
            &ExecutorLog::new(),
            &FrameLog::new(),
        );
        panel.set_plan(Some(plan())).unwrap();
        assert!(panel.controller().is_animating());
        assert!(panel.view().execute_enabled);

        panel.hide_clicked().unwrap();
        assert!(panel.view().hidden);
        assert!(!panel.view().execute_enabled);
        assert!(!panel.controller().is_animating());

        panel.hide_clicked().unwrap();
        assert!(!panel.view().hidden);
        assert!(panel.view().execute_enabled);
        assert!(panel.controller().is_animating());
    }

    #[test]
    fn showing_frames_mode_renders_again() {
        let frames = FrameLog::new();
        let mut panel = panel_in(
            ViewMode::Frames,
            &PoseLog::new(),
            &ExecutorLog::new(),
            &frames,
        );
        panel.set_plan(Some(plan())).unwrap();
        assert_eq!(frames.renders(), 1);

        panel.hide_clicked().unwrap();
        assert_eq!(frames.renders(), 1);
        panel.hide_clicked().unwrap();
        assert_eq!(frames.renders(), 2);
        assert!(panel.view().execute_enabled);
    }

    #[test]
    fn labels_follow_plan_lifecycle() {
        let executor = ExecutorLog::new();
        let mut panel = panel(&PoseLog::new(), &executor);
        panel.set_plan(Some(plan())).unwrap();
        assert_eq!(panel.view().plan_label, "Plan: 12.  2.00 seconds");
        assert!(panel.view().samples_enabled);
        assert!(!panel.view().playback_controls_visible);

        panel.controller_mut().set_visualization_only(false);
        panel.execute_clicked().unwrap();
        assert_eq!(executor.committed(), vec![12]);
        assert_eq!(panel.view().plan_label, "");
        assert!(!panel.view().execute_enabled);
    }

    #[test]
    fn rejects_unknown_combo_text() {
        let mut panel = panel(&PoseLog::new(), &ExecutorLog::new());
        assert!(panel.interpolation_changed("nearest").is_err());
        assert!(panel.playback_speed_changed("3/x").is_err());
        panel.playback_speed_changed("1/2x").unwrap();
        assert_eq!(panel.controller().speed().factor(), 0.5);
    }

    #[test]
    fn stop_pauses_executor() {
        let executor = ExecutorLog::new();
        let mut panel = panel(&PoseLog::new(), &executor);
        panel.stop_clicked();
        assert_eq!(executor.pauses(), 1);
    }
}
