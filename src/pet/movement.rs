use glam::IVec2;

use super::animation::Direction;

/// Scale at which `speed` is calibrated. Other scales move proportionally
/// so the walk looks the same speed relative to the sprite.
pub const BASE_SCALE: u32 = 4;

pub const SCALE_RANGE: (u32, u32) = (1, 8);
pub const FRAME_RATE_RANGE: (u32, u32) = (6, 30);
pub const SPEED_RANGE: (u32, u32) = (1, 16);
/// Frame rate changes move in steps of this many Hz.
pub const FRAME_RATE_STEP: u32 = 5;

/// User-adjustable motion knobs. Every setter keeps its value in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionParams {
    pub speed: u32,
    pub scale_factor: u32,
    pub frame_rate_hz: u32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            speed: 4,
            scale_factor: 4,
            frame_rate_hz: 15,
        }
    }
}

impl MotionParams {
    pub fn clamped(self) -> Self {
        Self {
            speed: self.speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
            scale_factor: self.scale_factor.clamp(SCALE_RANGE.0, SCALE_RANGE.1),
            frame_rate_hz: self.frame_rate_hz.clamp(FRAME_RATE_RANGE.0, FRAME_RATE_RANGE.1),
        }
    }

    /// Step the scale by `delta`. Returns true if it changed.
    pub fn step_scale(&mut self, delta: i32) -> bool {
        step(&mut self.scale_factor, delta, SCALE_RANGE)
    }

    pub fn step_frame_rate(&mut self, delta: i32) -> bool {
        step(&mut self.frame_rate_hz, delta, FRAME_RATE_RANGE)
    }

    pub fn step_speed(&mut self, delta: i32) -> bool {
        step(&mut self.speed, delta, SPEED_RANGE)
    }
}

fn step(value: &mut u32, delta: i32, (lo, hi): (u32, u32)) -> bool {
    let next = (*value as i64 + delta as i64).clamp(lo as i64, hi as i64) as u32;
    let changed = next != *value;
    *value = next;
    changed
}

/// Horizontal pixels moved per tick, rounded half away from zero.
pub fn tick_delta(speed: u32, direction: Direction, scale_factor: u32) -> i32 {
    let numerator = 2 * speed as i64 * scale_factor as i64 + BASE_SCALE as i64;
    let magnitude = numerator / (2 * BASE_SCALE as i64);
    magnitude as i32 * direction.sign()
}

/// Result of one motion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub position: IVec2,
    pub direction: Direction,
    /// A screen edge was hit; the caller restarts the frame sequence.
    pub bounced: bool,
}

/// Move one tick horizontally and bounce off the visible screen edges.
///
/// `screen` and `sprite` are (width, height). Vertical position is never
/// touched here.
pub fn advance(
    position: IVec2,
    direction: Direction,
    params: &MotionParams,
    screen: IVec2,
    sprite: IVec2,
) -> Step {
    let candidate = position.x + tick_delta(params.speed, direction, params.scale_factor);

    if candidate <= 0 {
        Step {
            position: IVec2::new(0, position.y),
            direction: Direction::Right,
            bounced: true,
        }
    } else if candidate + sprite.x >= screen.x {
        Step {
            position: IVec2::new(screen.x - sprite.x, position.y),
            direction: Direction::Left,
            bounced: true,
        }
    } else {
        Step {
            position: IVec2::new(candidate, position.y),
            direction,
            bounced: false,
        }
    }
}

/// Authoritative integrated position.
///
/// Empty until something establishes it: either a drag or the first walk
/// tick, which snapshots wherever the window currently sits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Motion {
    position: Option<IVec2>,
}

impl Motion {
    pub fn position(&self) -> Option<IVec2> {
        self.position
    }

    pub fn place(&mut self, position: IVec2) {
        self.position = Some(position);
    }

    /// Known position, or `on_screen` adopted as the new authority.
    pub fn establish(&mut self, on_screen: IVec2) -> IVec2 {
        *self.position.get_or_insert(on_screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: IVec2 = IVec2::new(800, 600);
    const SPRITE: IVec2 = IVec2::new(64, 64);

    fn params() -> MotionParams {
        MotionParams {
            speed: 4,
            scale_factor: 4,
            frame_rate_hz: 15,
        }
    }

    #[test]
    fn open_floor_step() {
        let step = advance(IVec2::new(100, 50), Direction::Right, &params(), SCREEN, SPRITE);
        assert_eq!(step.position, IVec2::new(104, 50));
        assert_eq!(step.direction, Direction::Right);
        assert!(!step.bounced);
    }

    #[test]
    fn right_edge_clamps_and_turns() {
        let step = advance(IVec2::new(738, 50), Direction::Right, &params(), SCREEN, SPRITE);
        assert_eq!(step.position, IVec2::new(736, 50));
        assert_eq!(step.direction, Direction::Left);
        assert!(step.bounced);
    }

    #[test]
    fn left_edge_always_heads_right() {
        for x in [-50, 0, 1, 4] {
            for dir in [Direction::Left, Direction::Right] {
                let p = IVec2::new(x, 10);
                let candidate = x + tick_delta(4, dir, 4);
                let step = advance(p, dir, &params(), SCREEN, SPRITE);
                if candidate <= 0 {
                    assert_eq!(step.position.x, 0);
                    assert_eq!(step.direction, Direction::Right);
                }
            }
        }
    }

    #[test]
    fn right_edge_property() {
        for x in 700..800 {
            let step = advance(IVec2::new(x, 0), Direction::Right, &params(), SCREEN, SPRITE);
            if x + 4 + SPRITE.x >= SCREEN.x {
                assert_eq!(step.position.x, SCREEN.x - SPRITE.x);
                assert_eq!(step.direction, Direction::Left);
            } else {
                assert_eq!(step.position.x, x + 4);
            }
        }
    }

    #[test]
    fn vertical_position_is_untouched() {
        let step = advance(IVec2::new(5, 321), Direction::Left, &params(), SCREEN, SPRITE);
        assert_eq!(step.position.y, 321);
    }

    #[test]
    fn delta_scales_with_size() {
        assert_eq!(tick_delta(4, Direction::Right, 1), 1);
        assert_eq!(tick_delta(4, Direction::Left, 8), -8);
        assert_eq!(tick_delta(3, Direction::Right, 1), 1);
        assert_eq!(tick_delta(1, Direction::Right, 1), 0);
    }

    #[test]
    fn params_stay_in_bounds() {
        let mut p = MotionParams::default();
        for _ in 0..10 {
            p.step_scale(1);
            p.step_frame_rate(FRAME_RATE_STEP as i32);
        }
        assert_eq!(p.scale_factor, 8);
        assert_eq!(p.frame_rate_hz, 30);
        for _ in 0..10 {
            p.step_scale(-1);
            p.step_frame_rate(-(FRAME_RATE_STEP as i32));
        }
        assert_eq!(p.scale_factor, 1);
        assert_eq!(p.frame_rate_hz, 6);
        assert!(!p.step_scale(-1));
    }

    #[test]
    fn motion_snapshots_once() {
        let mut m = Motion::default();
        assert_eq!(m.establish(IVec2::new(300, 200)), IVec2::new(300, 200));
        assert_eq!(m.establish(IVec2::new(0, 0)), IVec2::new(300, 200));
        m.place(IVec2::new(10, 20));
        assert_eq!(m.position(), Some(IVec2::new(10, 20)));
    }
}
