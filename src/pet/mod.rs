pub mod animation;
pub mod behavior;
pub mod interaction;
pub mod movement;
pub mod overlay;

use std::time::Duration;

use glam::IVec2;

use crate::clock::{self, ClockDriver};
use animation::{AnimationState, Direction};
use behavior::StateMachine;
use interaction::{DoubleClickDetector, Gesture, InteractionSession};
use movement::{Motion, MotionParams, FRAME_RATE_STEP};
use overlay::OverlayCoordinator;

/// Side effects a handler asks the host to carry out, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Repaint,
    /// Move the companion window's top-left corner.
    MoveTo(IVec2),
    /// New on-screen sprite size after a scale change.
    Resize(IVec2),
    ShowNotes,
    CloseNotes,
    ShowStatus { at: IVec2 },
    /// Hide and drop the status panel.
    CloseStatus,
}

/// What the companion needs to know about the desktop around it.
pub trait Desktop {
    /// Usable screen area as (width, height).
    fn available_bounds(&self) -> IVec2;
    /// Where the companion window currently sits.
    fn companion_origin(&self) -> IVec2;
    /// Global cursor position, if known.
    fn cursor_position(&self) -> Option<IVec2>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// The companion's whole mutable state, threaded through every handler.
///
/// Handlers run one at a time on the event-loop thread; none of them block.
/// Each one appends the effects it wants to `out`.
pub struct Companion {
    machine: StateMachine,
    motion: Motion,
    params: MotionParams,
    clock: ClockDriver,
    overlays: OverlayCoordinator,
    session: Option<InteractionSession>,
    clicks: DoubleClickDetector,
    /// Size of one unscaled frame.
    native_size: IVec2,
    rng: fastrand::Rng,
}

impl Companion {
    pub fn new(
        frame_lengths: [usize; 2],
        native_size: IVec2,
        params: MotionParams,
        mut rng: fastrand::Rng,
    ) -> Self {
        let params = params.clamped();
        let direction = Direction::random(&mut rng);
        Self {
            machine: StateMachine::new(frame_lengths, direction),
            motion: Motion::default(),
            params,
            clock: ClockDriver::new(params.frame_rate_hz),
            overlays: OverlayCoordinator::new(),
            session: None,
            clicks: DoubleClickDetector::default(),
            native_size,
            rng,
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.clock.start(now, &mut self.rng);
        log::info!(
            "Companion started: {} heading {:?}, {:?}",
            self.machine.state(),
            self.machine.direction(),
            self.params
        );
    }

    pub fn state(&self) -> AnimationState {
        self.machine.state()
    }

    pub fn direction(&self) -> Direction {
        self.machine.direction()
    }

    pub fn frame_index(&self) -> usize {
        self.machine.frame_index()
    }

    pub fn is_paused(&self) -> bool {
        self.machine.is_paused()
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn params(&self) -> MotionParams {
        self.params
    }

    #[cfg(test)]
    pub fn position(&self) -> Option<IVec2> {
        self.motion.position()
    }

    #[cfg(test)]
    pub fn notes_shown(&self) -> bool {
        self.overlays.notes_shown()
    }

    #[cfg(test)]
    pub fn status_shown(&self) -> bool {
        self.overlays.status_shown()
    }

    /// On-screen sprite size: native frame size times the scale factor.
    pub fn sprite_size(&self) -> IVec2 {
        self.native_size * self.params.scale_factor as i32
    }

    /// Earliest moment any companion timer wants to run.
    pub fn next_deadline(&self) -> Option<Duration> {
        clock::earliest([self.clock.next_deadline(), self.overlays.next_deadline()])
    }

    /// Run every timer that is due at `now`.
    pub fn update(&mut self, now: Duration, desktop: &dyn Desktop, out: &mut Vec<Request>) {
        let fired = self.clock.poll(now, &mut self.rng);
        if fired.animation {
            self.animation_tick(desktop, out);
        }
        if fired.state && self.machine.roll(&mut self.rng, self.session.is_some()) {
            out.push(Request::Repaint);
        }

        let origin = self
            .motion
            .position()
            .unwrap_or_else(|| desktop.companion_origin());
        let size = self.sprite_size();
        self.overlays
            .poll(now, desktop.cursor_position(), origin, size, out);
    }

    /// One animation tick: frame advance, then motion, then repaint.
    fn animation_tick(&mut self, desktop: &dyn Desktop, out: &mut Vec<Request>) {
        if !self.machine.advance_frame() {
            return;
        }

        // A held companion does not walk out from under the cursor.
        if self.machine.state() == AnimationState::Walk && self.session.is_none() {
            let from = self.motion.establish(desktop.companion_origin());
            let step = movement::advance(
                from,
                self.machine.direction(),
                &self.params,
                desktop.available_bounds(),
                self.sprite_size(),
            );
            if step.bounced {
                self.machine.bounce(step.direction);
            }
            self.motion.place(step.position);
            if step.position != from {
                out.push(Request::MoveTo(step.position));
            }
        }

        out.push(Request::Repaint);
    }

    pub fn pointer_pressed(
        &mut self,
        now: Duration,
        button: PointerButton,
        local: IVec2,
        global: IVec2,
        out: &mut Vec<Request>,
    ) {
        self.overlays.pointer_pressed(out);
        if button != PointerButton::Primary {
            return;
        }
        if self.clicks.press(now, global) {
            self.overlays.open_notes(out);
        }
        self.session = Some(InteractionSession::open(local, global));
    }

    pub fn pointer_moved(&mut self, now: Duration, global: IVec2, out: &mut Vec<Request>) {
        match self.session.as_mut() {
            Some(session) => {
                if let Some(origin) = session.drag_to(global) {
                    self.motion.place(origin);
                    out.push(Request::MoveTo(origin));
                    out.push(Request::Repaint);
                }
            }
            None => self.overlays.hover_moved(now),
        }
    }

    pub fn pointer_left(&mut self, out: &mut Vec<Request>) {
        self.overlays.pointer_left(out);
    }

    /// Close the open session. Exactly one of drag-commit or pause-toggle
    /// happens per primary release.
    pub fn pointer_released(
        &mut self,
        button: PointerButton,
        out: &mut Vec<Request>,
    ) -> Option<Gesture> {
        if button != PointerButton::Primary {
            return None;
        }
        let session = self.session.take()?;
        let gesture = Gesture::from(&session);
        match gesture {
            Gesture::Drag => {
                if let Some(pos) = self.motion.position() {
                    log::debug!("Dropped at {pos}");
                }
            }
            Gesture::Click => {
                self.machine.toggle_pause();
                out.push(Request::Repaint);
            }
        }
        Some(gesture)
    }

    pub fn open_notes(&mut self, out: &mut Vec<Request>) {
        self.overlays.open_notes(out);
    }

    pub fn notes_closed(&mut self) {
        self.overlays.notes_closed();
    }

    pub fn status_closed(&mut self) {
        self.overlays.status_closed();
    }

    pub fn set_state(&mut self, state: AnimationState, out: &mut Vec<Request>) {
        self.machine.set_state(state);
        out.push(Request::Repaint);
    }

    pub fn step_scale(&mut self, delta: i32, out: &mut Vec<Request>) {
        if self.params.step_scale(delta) {
            log::info!("Scale factor now {}", self.params.scale_factor);
            out.push(Request::Resize(self.sprite_size()));
            out.push(Request::Repaint);
        }
    }

    /// Step the frame rate by one notch in the direction of `notches`.
    pub fn step_frame_rate(&mut self, notches: i32) {
        if self.params.step_frame_rate(notches * FRAME_RATE_STEP as i32) {
            self.clock.set_frame_rate(self.params.frame_rate_hz);
            log::info!(
                "Frame rate now {} Hz ({:?} per frame)",
                self.params.frame_rate_hz,
                self.clock.animation_interval()
            );
        }
    }

    pub fn step_speed(&mut self, delta: i32) {
        if self.params.step_speed(delta) {
            log::info!("Walk speed now {}", self.params.speed);
        }
    }

    /// Stop both clock timers and close every panel. No timer work happens
    /// after this returns.
    pub fn teardown(&mut self, out: &mut Vec<Request>) {
        self.clock.stop();
        self.session = None;
        self.overlays.teardown(out);
        log::info!("Companion stopped");
    }
}
