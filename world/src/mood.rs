use std::time::Duration;

use dungeon_crawl_core::{Expression, PixelPoint};

/// Expression together with its pending revert countdown.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Mood {
    expression: Expression,
    expires_in: Option<Duration>,
}

impl Mood {
    pub(crate) const fn expression(&self) -> Expression {
        self.expression
    }

    /// Shows `expression` until `duration` elapses, replacing any pending revert.
    pub(crate) fn show_for(&mut self, expression: Expression, duration: Duration) {
        self.expression = expression;
        self.expires_in = Some(duration);
    }

    /// Shows `expression` indefinitely, cancelling any pending revert.
    pub(crate) fn show(&mut self, expression: Expression) {
        self.expression = expression;
        self.expires_in = None;
    }

    /// Counts the pending revert down; on expiry only living entities return to neutral.
    pub(crate) fn tick(&mut self, dt: Duration, alive: bool) {
        let Some(remaining) = self.expires_in else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.expires_in = None;
            if alive {
                self.expression = Expression::Neutral;
            }
        } else {
            self.expires_in = Some(remaining);
        }
    }
}

/// Moves `current` a fraction of the way toward `target`.
///
/// When `snap` is provided, an axis closer than `snap` pixels jumps straight to the target.
pub(crate) fn ease(
    current: PixelPoint,
    target: PixelPoint,
    factor: f32,
    snap: Option<f32>,
) -> PixelPoint {
    let axis = |from: f32, to: f32| {
        let delta = to - from;
        match snap {
            Some(threshold) if delta.abs() < threshold => to,
            _ => from + delta * factor,
        }
    };
    PixelPoint::new(axis(current.x, target.x), axis(current.y, target.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_waits_for_full_duration() {
        let mut mood = Mood::default();
        mood.show_for(Expression::Hurt, Duration::from_millis(500));
        mood.tick(Duration::from_millis(300), true);
        assert_eq!(mood.expression(), Expression::Hurt);
        mood.tick(Duration::from_millis(200), true);
        assert_eq!(mood.expression(), Expression::Neutral);
    }

    #[test]
    fn newer_expression_replaces_pending_revert() {
        let mut mood = Mood::default();
        mood.show_for(Expression::Hurt, Duration::from_millis(500));
        mood.tick(Duration::from_millis(400), true);
        mood.show_for(Expression::Angry, Duration::from_millis(300));
        mood.tick(Duration::from_millis(200), true);
        assert_eq!(mood.expression(), Expression::Angry);
    }

    #[test]
    fn dead_entities_keep_their_last_expression() {
        let mut mood = Mood::default();
        mood.show_for(Expression::Hurt, Duration::from_millis(500));
        mood.tick(Duration::from_secs(1), false);
        assert_eq!(mood.expression(), Expression::Hurt);
    }

    #[test]
    fn snapping_ease_lands_exactly_on_target() {
        let target = PixelPoint::new(32.0, 0.0);
        let eased = ease(PixelPoint::new(31.7, 0.0), target, 0.3, Some(0.5));
        assert_eq!(eased, target);

        let eased = ease(PixelPoint::new(0.0, 0.0), target, 0.2, None);
        assert!((eased.x - 6.4).abs() < f32::EPSILON);
    }
}
