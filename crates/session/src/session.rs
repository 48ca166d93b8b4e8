use crate::sweep::{RotationSweep, SweepState, SweepStep};
use cubehost_common::{
    FaceLayout, FrameRequest, HostConfig, InputCode, MAX_ANGLE_PERCENT, NEUTRAL_MODE, Pointer,
    Selection,
};
use cubehost_input::Action;
use cubehost_render::{Frame, RenderError, RenderModule};
use glam::Vec3;

/// Tunables the session needs from the host configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub orientation_step: f32,
    pub faces: FaceLayout,
    pub sweep_jump: u8,
    pub pointer_input: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&HostConfig::default())
    }
}

impl From<&HostConfig> for SessionConfig {
    fn from(config: &HostConfig) -> Self {
        Self {
            orientation_step: config.orientation_step,
            faces: config.faces,
            sweep_jump: config.sweep_jump,
            pointer_input: config.pointer_input,
        }
    }
}

/// What the host should do after applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Render one frame now.
    Render,
    /// A sweep started; drive it with `Session::advance_sweep`.
    SweepStarted,
    /// The action was dropped and nothing should be rendered.
    Rejected,
}

/// Single owner of every accumulator the module sees.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    orientation: Vec3,
    selection: Selection,
    angle_percent: u8,
    rotate: bool,
    input: InputCode,
    mode: i32,
    pointer: Option<Pointer>,
    frame: u64,
    sweep: SweepState,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            orientation: Vec3::ZERO,
            selection: Selection::new(),
            angle_percent: 0,
            rotate: false,
            input: InputCode::Neutral,
            mode: NEUTRAL_MODE,
            pointer: None,
            frame: 0,
            sweep: SweepState::Idle,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Orientation accumulators: x = A, y = B, z = C.
    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn angle_percent(&self) -> u8 {
        self.angle_percent
    }

    pub fn input(&self) -> InputCode {
        self.input
    }

    pub fn pointer(&self) -> Option<Pointer> {
        self.pointer
    }

    pub fn mode(&self) -> i32 {
        self.mode
    }

    /// Whether the next frame carries the rotation trigger.
    pub fn rotate_pending(&self) -> bool {
        self.rotate
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.sweep, SweepState::Rotating(_))
    }

    /// Set the auxiliary mode for the next frame only.
    pub fn set_mode(&mut self, mode: i32) {
        self.mode = mode;
    }

    /// Apply one action to the accumulators.
    pub fn apply(&mut self, action: Action) -> Outcome {
        if self.is_rotating() {
            tracing::debug!(?action, "input rejected during rotation sweep");
            return Outcome::Rejected;
        }

        match action {
            Action::Orient(code) => {
                self.orientation += code.direction() * self.config.orientation_step;
                self.input = code;
            }
            Action::StepSelection(delta) => {
                self.selection.step(delta);
            }
            Action::SelectFace(face) => {
                if face < self.config.faces.face_count() {
                    self.selection.select_face(face);
                } else {
                    tracing::warn!(face, "face outside the configured layout");
                }
            }
            Action::Rotate => {
                self.rotate = false;
                self.sweep = SweepState::Rotating(RotationSweep::new(self.config.sweep_jump));
                tracing::debug!("rotation sweep started");
                return Outcome::SweepStarted;
            }
            Action::NudgeAngle(delta) => {
                let next = self.angle_percent as i16 + delta as i16;
                self.angle_percent = next.clamp(0, MAX_ANGLE_PERCENT as i16) as u8;
            }
            Action::Click(pointer) => {
                if !self.config.pointer_input {
                    return Outcome::Rejected;
                }
                self.pointer = Some(pointer);
            }
            Action::Noop => {}
        }
        Outcome::Render
    }

    /// Advance a running sweep by one step.
    pub fn advance_sweep(&mut self) -> SweepStep {
        let SweepState::Rotating(mut steps) = self.sweep else {
            return SweepStep::Idle;
        };
        match steps.next() {
            Some(percent) => {
                self.angle_percent = percent;
                self.sweep = SweepState::Rotating(steps);
                SweepStep::Step(percent)
            }
            None => {
                self.rotate = true;
                self.sweep = SweepState::Idle;
                tracing::debug!("rotation sweep finished");
                SweepStep::Finished
            }
        }
    }

    /// Snapshot of the accumulators as the module will see them.
    pub fn frame_request(&self) -> FrameRequest {
        FrameRequest {
            frame: self.frame,
            input: self.input,
            orientation: self.orientation,
            pointer: self.pointer,
            selection: self.selection.composite(),
            rotate: self.rotate,
            angle_percent: self.angle_percent,
            mode: self.mode,
        }
    }

    /// Reset one-shot fields and count the frame.
    fn complete_frame(&mut self) {
        self.input = InputCode::Neutral;
        self.rotate = false;
        self.angle_percent = 0;
        self.mode = NEUTRAL_MODE;
        self.pointer = None;
        self.frame += 1;
    }

    /// Render step: call the module, hand the frame to `present`, then reset
    /// the one-shot fields. On error nothing is reset.
    pub fn render_with<M, R>(
        &mut self,
        module: &mut M,
        present: impl FnOnce(&Frame<'_>) -> R,
    ) -> Result<R, RenderError>
    where
        M: RenderModule + ?Sized,
    {
        let request = self.frame_request();
        let _span = tracing::debug_span!("render_frame", frame = request.frame).entered();
        let frame = module.render(&request)?;
        let out = present(&frame);
        self.complete_frame();
        tracing::trace!(
            input = request.input.code(),
            selection = request.selection,
            rotate = request.rotate,
            percent = request.angle_percent,
            "frame presented"
        );
        Ok(out)
    }

    /// Apply an action and render every frame it causes without yielding.
    ///
    /// A rotation renders one frame per sweep step plus the trigger frame.
    /// Returns the number of frames rendered.
    pub fn dispatch<M>(
        &mut self,
        action: Action,
        module: &mut M,
        mut present: impl FnMut(&Frame<'_>),
    ) -> Result<usize, RenderError>
    where
        M: RenderModule + ?Sized,
    {
        match self.apply(action) {
            Outcome::Rejected => Ok(0),
            Outcome::Render => {
                self.render_with(module, &mut present)?;
                Ok(1)
            }
            Outcome::SweepStarted => {
                let mut rendered = 0;
                loop {
                    match self.advance_sweep() {
                        SweepStep::Step(_) => {
                            self.render_with(module, &mut present)?;
                            rendered += 1;
                        }
                        SweepStep::Finished => {
                            self.render_with(module, &mut present)?;
                            return Ok(rendered + 1);
                        }
                        SweepStep::Idle => return Ok(rendered),
                    }
                }
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubehost_common::{MAX_SUB_INDEX, SurfaceSize};
    use cubehost_input::KeyMap;
    use cubehost_render::SolidFillModule;

    fn module() -> SolidFillModule {
        SolidFillModule::new(SurfaceSize::new(8, 6))
    }

    fn press(session: &mut Session, module: &mut SolidFillModule, key: char) -> usize {
        let action = KeyMap::new(session.config().faces).action_for(key);
        session.dispatch(action, module, |_| {}).unwrap()
    }

    #[test]
    fn w_raises_a_by_one_step() {
        let mut session = Session::default();
        assert_eq!(session.apply(Action::Orient(InputCode::PitchUp)), Outcome::Render);
        assert_eq!(session.orientation(), Vec3::new(0.05, 0.0, 0.0));
        assert_eq!(session.input(), InputCode::PitchUp);
    }

    #[test]
    fn orientation_keys_move_expected_axes() {
        let mut session = Session::default();
        let mut m = module();
        for key in ['a', 'a', 'd', 'j', 'k', 'k', 's'] {
            press(&mut session, &mut m, key);
        }
        let o = session.orientation();
        assert!((o.x - -0.05).abs() < 1e-6);
        assert!((o.y - -0.05).abs() < 1e-6);
        assert!((o.z - -0.05).abs() < 1e-6);
    }

    #[test]
    fn render_resets_one_shot_fields_only() {
        let mut session = Session::new(SessionConfig {
            pointer_input: true,
            ..SessionConfig::default()
        });
        let mut m = module();
        session.apply(Action::Orient(InputCode::RollForward));
        session.apply(Action::StepSelection(4));
        session.apply(Action::NudgeAngle(1));
        session.apply(Action::Click(Pointer { x: 2.0, y: 3.0 }));
        session.set_mode(2);

        session.render_with(&mut m, |_| ()).unwrap();

        let seen = m.last_request().copied().unwrap();
        assert_eq!(seen.input, InputCode::RollForward);
        assert_eq!(seen.angle_percent, 1);
        assert_eq!(seen.pointer, Some(Pointer { x: 2.0, y: 3.0 }));
        assert_eq!(seen.mode, 2);
        assert_eq!(seen.frame, 0);

        assert_eq!(session.input(), InputCode::Neutral);
        assert_eq!(session.angle_percent(), 0);
        assert_eq!(session.pointer(), None);
        assert_eq!(session.mode(), NEUTRAL_MODE);
        assert!(!session.rotate_pending());
        assert_eq!(session.orientation(), Vec3::new(0.0, 0.0, 0.05));
        assert_eq!(session.selection().sub_index(), 4);
        assert_eq!(session.frame(), 1);
    }

    #[test]
    fn frame_counter_counts_every_render() {
        let mut session = Session::default();
        let mut m = module();
        for _ in 0..5 {
            session.render_with(&mut m, |_| ()).unwrap();
        }
        assert_eq!(session.frame(), 5);
        let frames: Vec<u64> = m.requests().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unmapped_key_still_renders() {
        let mut session = Session::default();
        let mut m = module();
        assert_eq!(press(&mut session, &mut m, 'x'), 1);
        assert_eq!(session.frame(), 1);
        assert_eq!(m.last_request().unwrap().input, InputCode::Neutral);
    }

    #[test]
    fn period_at_top_of_range_stays() {
        let mut session = Session::default();
        let mut m = module();
        for _ in 0..3 {
            press(&mut session, &mut m, '/');
        }
        assert_eq!(session.selection().sub_index(), MAX_SUB_INDEX);
        press(&mut session, &mut m, '.');
        assert_eq!(session.selection().sub_index(), MAX_SUB_INDEX);
    }

    #[test]
    fn face_key_resets_sub_index() {
        let mut session = Session::default();
        let mut m = module();
        press(&mut session, &mut m, '/');
        press(&mut session, &mut m, '.');
        press(&mut session, &mut m, '1');
        assert_eq!(session.selection().face(), 0);
        assert_eq!(session.selection().sub_index(), 0);
        press(&mut session, &mut m, '4');
        press(&mut session, &mut m, '.');
        assert_eq!(m.last_request().unwrap().selection, 3 * 27 + 1);
    }

    #[test]
    fn face_outside_layout_is_ignored() {
        let mut session = Session::default();
        session.apply(Action::StepSelection(3));
        session.apply(Action::SelectFace(7));
        assert_eq!(session.selection().face(), 0);
        assert_eq!(session.selection().sub_index(), 3);
    }

    #[test]
    fn percentage_stays_clamped() {
        let mut session = Session::default();
        for _ in 0..3 {
            session.apply(Action::NudgeAngle(-1));
        }
        assert_eq!(session.angle_percent(), 0);
        for _ in 0..150 {
            session.apply(Action::NudgeAngle(1));
            assert!(session.angle_percent() <= MAX_ANGLE_PERCENT);
        }
        assert_eq!(session.angle_percent(), MAX_ANGLE_PERCENT);
        session.apply(Action::NudgeAngle(i8::MAX));
        assert_eq!(session.angle_percent(), MAX_ANGLE_PERCENT);
        session.apply(Action::NudgeAngle(i8::MIN));
        assert_eq!(session.angle_percent(), 0);
    }

    #[test]
    fn sweep_rejects_input_until_finished() {
        let mut session = Session::default();
        assert_eq!(session.apply(Action::Rotate), Outcome::SweepStarted);
        assert!(session.is_rotating());

        assert_eq!(session.apply(Action::Rotate), Outcome::Rejected);
        assert_eq!(session.apply(Action::Orient(InputCode::PitchUp)), Outcome::Rejected);
        assert_eq!(session.orientation(), Vec3::ZERO);

        assert_eq!(session.advance_sweep(), SweepStep::Step(1));
        assert_eq!(session.angle_percent(), 1);
        let mut steps = 1;
        while let SweepStep::Step(_) = session.advance_sweep() {
            steps += 1;
        }
        assert_eq!(steps, 7);
        assert!(!session.is_rotating());
        assert!(session.rotate_pending());
        assert_eq!(session.advance_sweep(), SweepStep::Idle);
        assert_eq!(session.apply(Action::Rotate), Outcome::SweepStarted);
    }

    #[test]
    fn sweep_trigger_is_seen_by_exactly_one_frame() {
        let mut session = Session::default();
        let mut m = module();
        let rendered = press(&mut session, &mut m, 'r');
        assert_eq!(rendered, 8);

        let requests = m.requests();
        let percents: Vec<u8> = requests.iter().map(|r| r.angle_percent).collect();
        assert_eq!(percents, vec![1, 16, 31, 46, 61, 76, 91, 0]);
        let triggers: Vec<bool> = requests.iter().map(|r| r.rotate).collect();
        assert_eq!(triggers.iter().filter(|t| **t).count(), 1);
        assert!(triggers[7]);

        press(&mut session, &mut m, 'x');
        assert!(!m.last_request().unwrap().rotate);
    }

    #[test]
    fn click_ignored_unless_pointer_enabled() {
        let mut session = Session::default();
        let click = Action::Click(Pointer { x: 10.0, y: 10.0 });
        assert_eq!(session.apply(click), Outcome::Rejected);
        assert_eq!(session.pointer(), None);

        let mut session = Session::new(SessionConfig {
            pointer_input: true,
            ..SessionConfig::default()
        });
        let mut m = module();
        assert_eq!(session.dispatch(click, &mut m, |_| {}).unwrap(), 1);
        assert_eq!(m.last_request().unwrap().pointer_coords(), (10.0, 10.0));
        session.render_with(&mut m, |_| ()).unwrap();
        assert_eq!(m.last_request().unwrap().pointer_coords(), (-1.0, -1.0));
    }

    #[test]
    fn present_receives_module_frame() {
        let mut session = Session::default();
        let mut m = module();
        session.apply(Action::NudgeAngle(1));
        let len = session
            .render_with(&mut m, |frame| frame.pixels().len())
            .unwrap();
        assert_eq!(len, 8 * 6 * 4);
    }
}
