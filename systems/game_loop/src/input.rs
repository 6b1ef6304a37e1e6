use std::time::Duration;

use dungeon_crawl_core::{Direction, ACTION_DEBOUNCE};

/// Keys held down during a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    /// Move north.
    pub up: bool,
    /// Move south.
    pub down: bool,
    /// Move west.
    pub left: bool,
    /// Move east.
    pub right: bool,
    /// Cast a fireball or swing, depending on the combat mode.
    pub attack: bool,
}

impl HeldKeys {
    /// Single action selected from the held keys.
    ///
    /// Only one action is taken per accepted input; priority is up, down,
    /// left, right and finally attack.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        if self.up {
            Some(Action::Move(Direction::North))
        } else if self.down {
            Some(Action::Move(Direction::South))
        } else if self.left {
            Some(Action::Move(Direction::West))
        } else if self.right {
            Some(Action::Move(Direction::East))
        } else if self.attack {
            Some(Action::Attack)
        } else {
            None
        }
    }
}

/// Player action resolved from held keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Step one tile.
    Move(Direction),
    /// Cast or swing.
    Attack,
}

/// Drops actions arriving less than [`ACTION_DEBOUNCE`] after the previous accepted one.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Debounce {
    since_last: Duration,
}

impl Debounce {
    pub(crate) const fn ready() -> Self {
        Self {
            since_last: ACTION_DEBOUNCE,
        }
    }

    /// Advances the clock and reports whether `action` may run this frame.
    pub(crate) fn admit(&mut self, dt: Duration, action: Option<Action>) -> Option<Action> {
        self.since_last = self.since_last.saturating_add(dt);
        if self.since_last < ACTION_DEBOUNCE {
            return None;
        }
        let action = action?;
        self.since_last = Duration::ZERO;
        Some(action)
    }
}
