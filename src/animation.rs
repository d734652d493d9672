//! Frame-driven easing from displayed positions to new layout targets.
//!
//! The host calls [`LayoutAnimator::tick`] from its frame callback. A new
//! [`LayoutAnimator::start`] supersedes whatever is in flight: it starts from
//! the positions currently on screen and bumps the generation, so frames
//! produced for the old run fail [`LayoutAnimator::is_current`].

use std::collections::HashMap;

use crate::config::{AnimationConfig, Easing};
use crate::ir::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    Animating,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub token: AnimationToken,
    pub positions: Vec<(String, Position)>,
    /// Last frame of the run; positions equal the targets exactly.
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct LayoutAnimator {
    config: AnimationConfig,
    phase: AnimationPhase,
    generation: u64,
    from: HashMap<String, Position>,
    targets: Vec<(String, Position)>,
    elapsed_ms: f32,
}

impl Default for LayoutAnimator {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

pub fn ease(easing: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        Easing::Linear => t,
        Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        Easing::EaseInOutCubic => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
    }
}

fn lerp(from: Position, to: Position, t: f32) -> Position {
    Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

impl LayoutAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            phase: AnimationPhase::Idle,
            generation: 0,
            from: HashMap::new(),
            targets: Vec::new(),
            elapsed_ms: 0.0,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn token(&self) -> AnimationToken {
        AnimationToken(self.generation)
    }

    pub fn is_current(&self, token: AnimationToken) -> bool {
        token.0 == self.generation
    }

    /// Begins a run toward `targets`. Nodes without a displayed position
    /// (newly materialized ones) start at their target.
    pub fn start(
        &mut self,
        displayed: &[(String, Position)],
        targets: &[(String, Position)],
    ) -> AnimationToken {
        self.generation += 1;
        self.from = displayed.iter().cloned().collect();
        self.targets = targets.to_vec();
        self.elapsed_ms = 0.0;
        self.phase = AnimationPhase::Animating;
        self.token()
    }

    /// Stops the current run where it is; pending frames become stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.phase = AnimationPhase::Idle;
    }

    /// Advances by `dt_ms` and returns the frame to draw, or `None` when no
    /// run is active.
    pub fn tick(&mut self, dt_ms: f32) -> Option<Frame> {
        if self.phase != AnimationPhase::Animating {
            return None;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        let progress = if self.config.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.config.duration_ms).min(1.0)
        };
        let done = progress >= 1.0;

        let positions = if done {
            self.targets.clone()
        } else {
            let t = ease(self.config.easing, progress);
            self.targets
                .iter()
                .map(|(id, target)| {
                    let from = self.from.get(id).copied().unwrap_or(*target);
                    (id.clone(), lerp(from, *target, t))
                })
                .collect()
        };
        if done {
            self.phase = AnimationPhase::Settled;
        }
        Some(Frame {
            token: self.token(),
            positions,
            done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: &str, x: f32, y: f32) -> (String, Position) {
        (id.to_string(), Position::new(x, y))
    }

    fn linear(duration_ms: f32) -> AnimationConfig {
        AnimationConfig {
            duration_ms,
            easing: Easing::Linear,
        }
    }

    #[test]
    fn runs_from_displayed_to_targets() {
        let mut animator = LayoutAnimator::new(linear(100.0));
        assert_eq!(animator.phase(), AnimationPhase::Idle);
        assert!(animator.tick(16.0).is_none());

        animator.start(&[at("a", 0.0, 0.0)], &[at("a", 100.0, 0.0), at("b", 5.0, 5.0)]);
        let half = animator.tick(50.0).unwrap();
        assert!(!half.done);
        assert_eq!(half.positions[0].1, Position::new(50.0, 0.0));
        assert_eq!(half.positions[1].1, Position::new(5.0, 5.0));

        let last = animator.tick(80.0).unwrap();
        assert!(last.done);
        assert_eq!(last.positions, vec![at("a", 100.0, 0.0), at("b", 5.0, 5.0)]);
        assert_eq!(animator.phase(), AnimationPhase::Settled);
        assert!(animator.tick(16.0).is_none());
    }

    #[test]
    fn restart_supersedes_in_flight_run() {
        let mut animator = LayoutAnimator::new(linear(100.0));
        let first = animator.start(&[at("a", 0.0, 0.0)], &[at("a", 100.0, 0.0)]);
        let frame = animator.tick(50.0).unwrap();
        let second = animator.start(&frame.positions, &[at("a", 0.0, 0.0)]);
        assert!(!animator.is_current(first));
        assert!(animator.is_current(second));
        let next = animator.tick(50.0).unwrap();
        assert_eq!(next.positions[0].1, Position::new(25.0, 0.0));
    }

    #[test]
    fn zero_duration_settles_on_first_tick() {
        let mut animator = LayoutAnimator::new(linear(0.0));
        animator.start(&[], &[at("a", 3.0, 4.0)]);
        let frame = animator.tick(0.0).unwrap();
        assert!(frame.done);
        assert_eq!(frame.positions, vec![at("a", 3.0, 4.0)]);
    }

    #[test]
    fn easing_hits_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOutCubic, Easing::EaseInOutCubic] {
            assert_eq!(ease(easing, 0.0), 0.0);
            assert_eq!(ease(easing, 1.0), 1.0);
        }
    }

    #[test]
    fn cancel_invalidates_token() {
        let mut animator = LayoutAnimator::default();
        let token = animator.start(&[], &[at("a", 1.0, 1.0)]);
        animator.cancel();
        assert!(!animator.is_current(token));
        assert!(animator.tick(16.0).is_none());
    }
}
