use std::fmt;

/// Which frame sequence is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnimationState {
    Idle,
    Walk,
}

impl AnimationState {
    pub const ALL: [AnimationState; 2] = [AnimationState::Idle, AnimationState::Walk];

    /// File name prefix of this state's frames (`idle_0.png`, `walk_3.png`).
    pub fn asset_prefix(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walk => "walk",
        }
    }

    pub fn other(self) -> Self {
        match self {
            AnimationState::Idle => AnimationState::Walk,
            AnimationState::Walk => AnimationState::Idle,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnimationState::Idle => "IDLE",
            AnimationState::Walk => "WALK",
        })
    }
}

/// Horizontal heading. Leftward frames are drawn mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        if rng.bool() {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    pub fn is_mirrored(self) -> bool {
        self == Direction::Left
    }
}

/// Position inside the active frame sequence.
///
/// The index wraps modulo the sequence length. Lengths come from the frame
/// store, which guarantees every state has at least one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameCursor {
    lengths: [usize; 2],
    index: usize,
}

impl FrameCursor {
    pub fn new(lengths: [usize; 2]) -> Self {
        assert!(
            lengths.iter().all(|&n| n > 0),
            "every animation state needs at least one frame"
        );
        Self { lengths, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self, state: AnimationState) -> usize {
        self.lengths[state.index()]
    }

    pub fn advance(&mut self, state: AnimationState) {
        self.index = (self.index + 1) % self.len(state);
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_per_state_length() {
        let mut cursor = FrameCursor::new([5, 6]);
        for _ in 0..5 {
            cursor.advance(AnimationState::Idle);
        }
        assert_eq!(cursor.index(), 0);
        for _ in 0..5 {
            cursor.advance(AnimationState::Walk);
        }
        assert_eq!(cursor.index(), 5);
        cursor.advance(AnimationState::Walk);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    #[should_panic]
    fn empty_sequence_is_rejected() {
        FrameCursor::new([3, 0]);
    }

    #[test]
    fn states_flip() {
        assert_eq!(AnimationState::Idle.other(), AnimationState::Walk);
        assert_eq!(AnimationState::Walk.other(), AnimationState::Idle);
        assert_eq!(Direction::Left.sign(), -1);
        assert!(Direction::Left.is_mirrored());
    }
}
