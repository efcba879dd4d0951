use std::time::Duration;

use glam::IVec2;

use super::Request;
use crate::clock::Timer;

/// How long the pointer has to rest on the companion before the status
/// panel appears.
pub const HOVER_DWELL: Duration = Duration::from_millis(2000);
/// Gap between the companion's right edge and the status panel.
pub const STATUS_MARGIN: i32 = 10;

/// Decides when the notes and status panels come and go.
///
/// The status panel is passive: it follows hover dwell and goes away the
/// moment the pointer leaves or presses. The notes panel only opens on
/// request and stays until it is closed.
pub struct OverlayCoordinator {
    hover: Timer,
    status_shown: bool,
    notes_shown: bool,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self {
            hover: Timer::single_shot(HOVER_DWELL),
            status_shown: false,
            notes_shown: false,
        }
    }

    #[cfg(test)]
    pub fn status_shown(&self) -> bool {
        self.status_shown
    }

    #[cfg(test)]
    pub fn notes_shown(&self) -> bool {
        self.notes_shown
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.hover.deadline()
    }

    /// Pointer moved over the companion with no button held.
    pub fn hover_moved(&mut self, now: Duration) {
        self.hover.start(now);
    }

    /// Any press dismisses the passive panel.
    pub fn pointer_pressed(&mut self, out: &mut Vec<Request>) {
        self.hover.stop();
        self.dismiss_status(out);
    }

    pub fn pointer_left(&mut self, out: &mut Vec<Request>) {
        self.hover.stop();
        self.dismiss_status(out);
    }

    /// Fire the dwell timer if due.
    ///
    /// The cursor is re-checked against the companion rectangle because the
    /// last move event may be stale by the time the timer fires.
    pub fn poll(
        &mut self,
        now: Duration,
        cursor: Option<IVec2>,
        origin: IVec2,
        size: IVec2,
        out: &mut Vec<Request>,
    ) {
        if !self.hover.poll(now) {
            return;
        }
        let inside = cursor.is_some_and(|c| contains(origin, size, c));
        if !inside {
            return;
        }
        self.status_shown = true;
        out.push(Request::ShowStatus {
            at: origin + IVec2::new(size.x + STATUS_MARGIN, 0),
        });
    }

    pub fn open_notes(&mut self, out: &mut Vec<Request>) {
        self.notes_shown = true;
        out.push(Request::ShowNotes);
    }

    /// The user closed the notes window themselves.
    pub fn notes_closed(&mut self) {
        self.notes_shown = false;
    }

    /// The status window went away without us asking.
    pub fn status_closed(&mut self) {
        self.status_shown = false;
    }

    pub fn teardown(&mut self, out: &mut Vec<Request>) {
        self.hover.stop();
        self.dismiss_status(out);
        if self.notes_shown {
            self.notes_shown = false;
            out.push(Request::CloseNotes);
        }
    }

    fn dismiss_status(&mut self, out: &mut Vec<Request>) {
        if self.status_shown {
            self.status_shown = false;
            out.push(Request::CloseStatus);
        }
    }
}

/// Half-open rectangle test.
pub fn contains(origin: IVec2, size: IVec2, point: IVec2) -> bool {
    let rel = point - origin;
    rel.x >= 0 && rel.y >= 0 && rel.x < size.x && rel.y < size.y
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: IVec2 = IVec2::new(100, 100);
    const SIZE: IVec2 = IVec2::new(64, 64);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn dwell_shows_status_once_at_two_seconds() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        let cursor = Some(IVec2::new(120, 130));
        o.hover_moved(ms(0));

        let mut shows = Vec::new();
        for t in (0..=2500).step_by(10) {
            o.poll(ms(t), cursor, ORIGIN, SIZE, &mut out);
            if !out.is_empty() {
                shows.push(t);
                out.clear();
            }
        }
        assert_eq!(shows, vec![2000]);
        assert!(o.status_shown());
    }

    #[test]
    fn status_sits_right_of_companion() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        o.hover_moved(ms(0));
        o.poll(ms(2000), Some(IVec2::new(101, 101)), ORIGIN, SIZE, &mut out);
        assert_eq!(
            out,
            vec![Request::ShowStatus {
                at: IVec2::new(100 + 64 + STATUS_MARGIN, 100)
            }]
        );
    }

    #[test]
    fn cursor_outside_at_fire_time_shows_nothing() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        o.hover_moved(ms(0));
        o.poll(ms(2000), Some(IVec2::new(500, 500)), ORIGIN, SIZE, &mut out);
        assert!(out.is_empty());
        assert!(!o.status_shown());
    }

    #[test]
    fn moving_restarts_dwell() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        let cursor = Some(IVec2::new(110, 110));
        o.hover_moved(ms(0));
        o.hover_moved(ms(1500));
        o.poll(ms(2000), cursor, ORIGIN, SIZE, &mut out);
        assert!(out.is_empty());
        o.poll(ms(3500), cursor, ORIGIN, SIZE, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn leave_and_press_dismiss() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        o.hover_moved(ms(0));
        o.poll(ms(2000), Some(ORIGIN), ORIGIN, SIZE, &mut out);
        out.clear();

        o.pointer_pressed(&mut out);
        assert_eq!(out, vec![Request::CloseStatus]);
        out.clear();

        // Pending dwell is cancelled by leaving.
        o.hover_moved(ms(3000));
        o.pointer_left(&mut out);
        assert!(out.is_empty());
        o.poll(ms(6000), Some(ORIGIN), ORIGIN, SIZE, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn teardown_closes_everything() {
        let mut o = OverlayCoordinator::new();
        let mut out = Vec::new();
        o.open_notes(&mut out);
        o.hover_moved(ms(0));
        o.poll(ms(2000), Some(ORIGIN), ORIGIN, SIZE, &mut out);
        out.clear();
        o.teardown(&mut out);
        assert_eq!(out, vec![Request::CloseStatus, Request::CloseNotes]);
        assert_eq!(o.next_deadline(), None);
    }

    #[test]
    fn rect_is_half_open() {
        assert!(contains(ORIGIN, SIZE, ORIGIN));
        assert!(!contains(ORIGIN, SIZE, ORIGIN + SIZE));
        assert!(contains(ORIGIN, SIZE, ORIGIN + SIZE - IVec2::ONE));
    }
}
