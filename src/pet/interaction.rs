use std::time::Duration;

use glam::IVec2;

/// Presses closer together than this count as a double-click.
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
/// Max distance in pixels between the two presses of a double-click.
const DOUBLE_CLICK_SLOP: i32 = 4;

/// One press-to-release gesture on the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSession {
    /// Press position in companion-local pixels; the cursor keeps this
    /// offset from the window origin for the whole drag.
    pub anchor: IVec2,
    /// Press position in global pixels.
    pub press: IVec2,
    /// Set once the pointer has been seen anywhere other than `press`.
    pub moved: bool,
}

impl InteractionSession {
    pub fn open(local: IVec2, global: IVec2) -> Self {
        Self {
            anchor: local,
            press: global,
            moved: false,
        }
    }

    /// Track a pointer move. Returns the window origin that keeps the
    /// anchor under the cursor once the gesture counts as a drag.
    pub fn drag_to(&mut self, global: IVec2) -> Option<IVec2> {
        if global != self.press {
            self.moved = true;
        }
        self.moved.then(|| global - self.anchor)
    }
}

/// How a finished session is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// The pointer moved: keep the final position, leave state alone.
    Drag,
    /// Zero displacement: toggle pause.
    Click,
}

impl From<&InteractionSession> for Gesture {
    fn from(session: &InteractionSession) -> Self {
        if session.moved {
            Gesture::Drag
        } else {
            Gesture::Click
        }
    }
}

/// Detects double-clicks from primary presses. winit only reports single
/// button transitions.
#[derive(Debug, Default)]
pub struct DoubleClickDetector {
    last_press: Option<(Duration, IVec2)>,
}

impl DoubleClickDetector {
    /// Feed a primary press. Returns true when it completes a double-click.
    pub fn press(&mut self, now: Duration, global: IVec2) -> bool {
        let double = match self.last_press {
            Some((at, pos)) => {
                now.saturating_sub(at) <= DOUBLE_CLICK_WINDOW
                    && (global - pos).abs().max_element() <= DOUBLE_CLICK_SLOP
            }
            None => false,
        };
        // A completed double-click does not chain into a triple.
        self.last_press = if double { None } else { Some((now, global)) };
        double
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_session_is_a_click() {
        let mut s = InteractionSession::open(IVec2::new(10, 12), IVec2::new(410, 312));
        assert_eq!(s.drag_to(IVec2::new(410, 312)), None);
        assert_eq!(Gesture::from(&s), Gesture::Click);
    }

    #[test]
    fn any_displacement_is_a_drag() {
        let mut s = InteractionSession::open(IVec2::new(10, 12), IVec2::new(410, 312));
        assert_eq!(s.drag_to(IVec2::new(411, 312)), Some(IVec2::new(401, 300)));
        // Coming back to the press point is still a drag.
        assert_eq!(s.drag_to(IVec2::new(410, 312)), Some(IVec2::new(400, 300)));
        assert_eq!(Gesture::from(&s), Gesture::Drag);
    }

    #[test]
    fn double_click_window() {
        let mut d = DoubleClickDetector::default();
        let p = IVec2::new(50, 50);
        assert!(!d.press(Duration::from_millis(0), p));
        assert!(d.press(Duration::from_millis(300), p + IVec2::new(2, -1)));
        // Third press starts over.
        assert!(!d.press(Duration::from_millis(500), p));
        assert!(!d.press(Duration::from_millis(1200), p));
        assert!(!d.press(Duration::from_millis(1300), p + IVec2::new(20, 0)));
    }
}
